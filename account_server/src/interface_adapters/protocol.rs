use serde::{Deserialize, Serialize};

use crate::domain::entities::{SubscriptionDetails, User};

// Request payload for password sign-in. Missing fields are rejected by the use case.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

// Request payload for account registration.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "fullName")]
    pub full_name: Option<String>,
}

// Response payload for sign-in and sign-up.
#[derive(Debug, Serialize)]
pub struct AuthUserResponse {
    pub user: User,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// Query string of the checkout entry point.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutQuery {
    pub plan: Option<String>,
    pub price: Option<String>,
    pub lang: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionsResponse {
    pub subscriptions: Vec<SubscriptionDetails>,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

// Error envelope for JSON responses. `code` discriminates session failures.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}
