// Interface adapters: HTTP surface, provider clients and storage.

pub mod billing_events;
pub mod clients;
pub mod cookies;
pub mod handlers;
pub mod protocol;
pub mod routes;
pub mod session_guard;
pub mod state;
pub mod store;
