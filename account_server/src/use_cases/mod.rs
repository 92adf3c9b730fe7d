pub mod checkout;
pub mod resolve_session;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;
pub mod subscriptions;
#[cfg(test)]
pub(crate) mod test_support;
pub mod webhook;

pub use checkout::{CheckoutSelection, CheckoutUseCase, login_redirect_url};
pub use resolve_session::ResolveSessionUseCase;
pub use sign_in::SignInUseCase;
pub use sign_out::{SignOutResponse, SignOutUseCase};
pub use sign_up::SignUpUseCase;
pub use subscriptions::ListSubscriptionsUseCase;
pub use webhook::WebhookUseCase;
