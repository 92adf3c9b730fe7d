use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;

use crate::domain::errors::{AuthError, CheckoutError, IdentityError};
use crate::interface_adapters::billing_events::{self, SIGNATURE_HEADER};
use crate::interface_adapters::cookies;
use crate::interface_adapters::protocol::{
    AuthUserResponse, CheckoutQuery, ErrorResponse, MessageResponse, SignInRequest,
    SignUpRequest, SubscriptionsResponse, UserResponse, WebhookAck,
};
use crate::interface_adapters::session_guard::with_session;
use crate::interface_adapters::state::AppState;
use crate::use_cases::{
    CheckoutSelection, CheckoutUseCase, ListSubscriptionsUseCase, SignInUseCase, SignOutUseCase,
    SignUpUseCase, WebhookUseCase, login_redirect_url,
};

type ErrorReply = (StatusCode, Json<ErrorResponse>);

// Handler for password sign-in; persists the issued credential pair as the session cookie.
#[tracing::instrument(skip_all)]
pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<SignInRequest>,
) -> Result<(CookieJar, Json<AuthUserResponse>), ErrorReply> {
    let use_case = SignInUseCase {
        identity: state.identity.as_ref(),
    };

    let session = use_case
        .execute(&payload.email, &payload.password)
        .await
        .map_err(map_auth_error)?;

    tracing::info!(user_id = %session.user.id, "signed in");
    let cookie = cookies::session_cookie(&session.credentials, state.settings.secure_cookies);
    Ok((
        jar.add(cookie),
        Json(AuthUserResponse {
            user: session.user,
            message: "Signed in successfully".to_string(),
        }),
    ))
}

// Handler for account registration; also provisions the billing customer.
#[tracing::instrument(skip_all)]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> Result<Json<AuthUserResponse>, ErrorReply> {
    let use_case = SignUpUseCase {
        identity: state.identity.as_ref(),
        billing: state.billing.as_ref(),
        store: state.store.as_ref(),
    };

    let user = use_case
        .execute(&payload.email, &payload.password, payload.full_name.as_deref())
        .await
        .map_err(map_auth_error)?;

    tracing::info!(user_id = %user.id, "signed up");
    Ok(Json(AuthUserResponse {
        user,
        message: "User created successfully. Please check your email to verify your account."
            .to_string(),
    }))
}

// Handler for sign-out. The cookie is cleared whatever the provider says.
#[tracing::instrument(skip_all)]
pub async fn sign_out(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let raw_cookie = cookies::session_cookie_value(&jar);
    let use_case = SignOutUseCase {
        identity: state.identity.as_ref(),
    };

    match use_case.execute(raw_cookie.as_deref()).await {
        Ok(result) => tracing::debug!(revoked = result.revoked, "signed out"),
        Err(err) => tracing::warn!(error = %err, "provider sign-out failed"),
    }

    (
        jar.add(cookies::clear_session_cookie(state.settings.secure_cookies)),
        Json(MessageResponse {
            message: "Signed out successfully".to_string(),
        }),
    )
}

// Handler for the current user. A bearer token is checked as-is, without refresh.
#[tracing::instrument(skip_all)]
pub async fn current_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Response {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let token = value
            .to_str()
            .ok()
            .map(|value| value.strip_prefix("Bearer ").unwrap_or(value).trim())
            .filter(|token| !token.is_empty());
        let Some(token) = token else {
            return error_response(StatusCode::UNAUTHORIZED, "Invalid authorization header")
                .into_response();
        };
        return match state.identity.validate(token).await {
            Ok(user) => Json(UserResponse { user }).into_response(),
            Err(IdentityError::Rejected(message)) => {
                error_response(StatusCode::UNAUTHORIZED, &message).into_response()
            }
            Err(IdentityError::Unavailable(message)) => {
                tracing::error!(error = %message, "identity provider unavailable");
                provider_unavailable().into_response()
            }
        };
    }

    with_session(&state, jar, |auth| async move {
        Json(UserResponse { user: auth.user }).into_response()
    })
    .await
}

// Handler that starts a subscription checkout or sends the visitor to log in first.
#[tracing::instrument(skip_all)]
pub async fn checkout(
    State(state): State<AppState>,
    Query(query): Query<CheckoutQuery>,
    jar: CookieJar,
) -> Response {
    let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());
    let (Some(plan), Some(price_id)) = (non_empty(query.plan), non_empty(query.price)) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing plan or price parameter")
            .into_response();
    };
    let selection = CheckoutSelection {
        plan,
        price_id,
        lang: non_empty(query.lang).unwrap_or_else(|| state.settings.default_lang.clone()),
    };

    if cookies::session_cookie_value(&jar).is_none() {
        return found(login_redirect_url(&state.settings.site_url, &selection));
    }

    let handler_state = state.clone();
    with_session(&state, jar, |auth| async move {
        let use_case = CheckoutUseCase {
            billing: handler_state.billing.as_ref(),
            store: handler_state.store.as_ref(),
            site_url: &handler_state.settings.site_url,
        };

        match use_case.execute(&auth.user.id, &selection).await {
            Ok(url) => found(url),
            Err(CheckoutError::CustomerNotFound) => {
                error_response(StatusCode::NOT_FOUND, "Customer not found").into_response()
            }
            Err(err) => {
                tracing::error!(error = %err, user_id = %auth.user.id, "checkout failed");
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to create checkout session",
                )
                .into_response()
            }
        }
    })
    .await
}

// Handler listing the caller's trialing and active subscriptions.
#[tracing::instrument(skip_all)]
pub async fn subscriptions(State(state): State<AppState>, jar: CookieJar) -> Response {
    let handler_state = state.clone();
    with_session(&state, jar, |auth| async move {
        let use_case = ListSubscriptionsUseCase {
            store: handler_state.store.as_ref(),
        };

        match use_case.execute(&auth.user.id).await {
            Ok(subscriptions) => Json(SubscriptionsResponse { subscriptions }).into_response(),
            Err(err) => {
                tracing::error!(error = %err, user_id = %auth.user.id, "subscription lookup failed");
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to fetch subscriptions",
                )
                .into_response()
            }
        }
    })
    .await
}

// Handler for signed billing events. Failures answer 400 with a plain-text reason.
#[tracing::instrument(skip_all)]
pub async fn billing_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let event = match billing_events::construct_event(
        &body,
        signature,
        state.settings.webhook_secret.as_deref(),
        state.clock.now_epoch_seconds(),
    ) {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!(error = %err, "webhook rejected");
            return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
        }
    };

    let use_case = WebhookUseCase {
        billing: state.billing.as_ref(),
        store: state.store.as_ref(),
    };
    if let Err(err) = use_case.execute(event).await {
        tracing::warn!(error = %err, "webhook handling failed");
        return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
    }

    Json(WebhookAck { received: true }).into_response()
}

fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

// Helper to build a JSON error response.
fn error_response(status: StatusCode, message: &str) -> ErrorReply {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
            code: None,
        }),
    )
}

fn provider_unavailable() -> ErrorReply {
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse {
            error: "Identity provider unavailable".to_string(),
            code: Some("provider_unavailable"),
        }),
    )
}

fn map_auth_error(err: AuthError) -> ErrorReply {
    match err {
        AuthError::MissingCredentials => error_response(StatusCode::BAD_REQUEST, &err.to_string()),
        AuthError::Rejected(message) => error_response(StatusCode::BAD_REQUEST, &message),
        AuthError::ProviderUnavailable(message) => {
            tracing::error!(error = %message, "identity provider unavailable");
            provider_unavailable()
        }
        AuthError::Billing(err) => {
            tracing::error!(error = %err, "billing customer provisioning failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
        }
    }
}
