use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::domain::entities::CredentialPair;

pub const SESSION_COOKIE_NAME: &str = "auth-token";
const SESSION_TTL_DAYS: i64 = 7;

/// Cookie carrying a freshly issued or rotated credential pair.
pub fn session_cookie(pair: &CredentialPair, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, pair.to_cookie_value()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::days(SESSION_TTL_DAYS))
        .build()
}

/// Removal cookie: empty value, immediate expiry, same attributes as the session cookie.
pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}

/// Raw session cookie value, if the client sent a non-empty one.
pub fn session_cookie_value(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}
