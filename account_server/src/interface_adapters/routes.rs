use crate::interface_adapters::handlers::{
    billing_webhook, checkout, current_user, sign_in, sign_out, sign_up, subscriptions,
};
use crate::interface_adapters::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/signin", post(sign_in))
        .route("/api/auth/signup", post(sign_up))
        .route("/api/auth/signout", post(sign_out))
        .route("/api/auth/user", get(current_user))
        .route("/api/checkout", get(checkout))
        .route("/api/subscriptions", get(subscriptions))
        .route("/api/webhook", post(billing_webhook))
        .with_state(state)
}
