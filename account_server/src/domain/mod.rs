pub mod entities;
pub mod errors;
pub mod ports;

// Re-export the domain boundary types and ports.
pub use entities::{
    AuthenticatedUser, BillingEvent, CheckoutRequest, CheckoutSession, CredentialPair,
    PresentedCredentials, Price, Product, ProviderSession, RejectReason, SessionOutcome,
    Subscription, SubscriptionDetails, User,
};
pub use errors::{
    AuthError, BillingError, CheckoutError, IdentityError, SessionError, WebhookError,
};
pub use ports::{BillingProvider, BillingStore, Clock, IdentityProvider};
