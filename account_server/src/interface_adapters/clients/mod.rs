pub mod billing;
pub mod identity;

pub use billing::BillingClient;
pub use identity::IdentityClient;
