use std::future::Future;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;

use crate::domain::entities::{AuthenticatedUser, RejectReason, SessionOutcome};
use crate::domain::errors::SessionError;
use crate::interface_adapters::cookies;
use crate::interface_adapters::protocol::ErrorResponse;
use crate::interface_adapters::state::AppState;
use crate::use_cases::ResolveSessionUseCase;

/// Runs `handler` only for a request carrying a usable session.
///
/// A rotated credential pair is written back as a session cookie on whatever the
/// handler returned, error statuses included. A valid session leaves the
/// response untouched. Rejections never reach the handler.
pub async fn with_session<F, Fut>(state: &AppState, jar: CookieJar, handler: F) -> Response
where
    F: FnOnce(AuthenticatedUser) -> Fut,
    Fut: Future<Output = Response>,
{
    let raw_cookie = cookies::session_cookie_value(&jar);
    let use_case = ResolveSessionUseCase {
        identity: state.identity.as_ref(),
    };

    match use_case.execute(raw_cookie.as_deref()).await {
        Ok(SessionOutcome::Valid(auth)) => handler(auth).await,
        Ok(SessionOutcome::Refreshed(auth, credentials)) => {
            tracing::info!(user_id = %auth.user.id, "session refreshed");
            let response = handler(auth).await;
            let cookie = cookies::session_cookie(&credentials, state.settings.secure_cookies);
            (jar.add(cookie), response).into_response()
        }
        Ok(SessionOutcome::Unauthenticated) => {
            session_error(StatusCode::UNAUTHORIZED, "No access token provided", "no_token")
        }
        Ok(SessionOutcome::Rejected(reason)) => {
            tracing::debug!(reason = reason.as_str(), "session rejected");
            match reason {
                RejectReason::Malformed => session_error(
                    StatusCode::UNAUTHORIZED,
                    "Malformed session cookie",
                    "malformed_token",
                ),
                RejectReason::Invalid | RejectReason::Expired => session_error(
                    StatusCode::UNAUTHORIZED,
                    "Invalid or expired token",
                    "invalid_or_expired",
                ),
            }
        }
        Err(SessionError::ProviderUnavailable(message)) => {
            tracing::error!(error = %message, "identity provider unavailable");
            session_error(
                StatusCode::BAD_GATEWAY,
                "Identity provider unavailable",
                "provider_unavailable",
            )
        }
    }
}

fn session_error(status: StatusCode, message: &str, code: &'static str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
            code: Some(code),
        }),
    )
        .into_response()
}
