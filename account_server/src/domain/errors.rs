use thiserror::Error;

// Failure reported by the identity provider port.
#[derive(Debug, Error)]
pub enum IdentityError {
    // The provider answered and refused the credential or request.
    #[error("{0}")]
    Rejected(String),
    // The provider could not be reached or answered with garbage.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

// Session guard failures that are not a plain credential rejection.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(String),
}

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("billing provider error: {0}")]
    Provider(String),
    #[error("billing storage error: {0}")]
    Storage(String),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
}

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Webhook secret not found.")]
    MissingSecret,
    #[error("Webhook Error: {0}")]
    InvalidSignature(String),
    #[error("Webhook Error: {0}")]
    InvalidPayload(String),
    #[error("Unsupported event type: {0}")]
    UnsupportedEvent(String),
    #[error("Webhook handler failed. {0}")]
    Handler(#[from] BillingError),
}

// Failures of the sign-in, sign-up and sign-out flows.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email and password are required")]
    MissingCredentials,
    #[error("{0}")]
    Rejected(String),
    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error(transparent)]
    Billing(#[from] BillingError),
}

impl From<IdentityError> for AuthError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Rejected(message) => AuthError::Rejected(message),
            IdentityError::Unavailable(message) => AuthError::ProviderUnavailable(message),
        }
    }
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Customer not found")]
    CustomerNotFound,
    #[error("Failed to create checkout session")]
    MissingUrl,
    #[error(transparent)]
    Billing(#[from] BillingError),
}
