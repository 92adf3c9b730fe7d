use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::domain::entities::{CredentialPair, ProviderSession, User};
use crate::domain::errors::IdentityError;
use crate::domain::ports::IdentityProvider;

#[derive(Debug, Serialize)]
struct RefreshTokenRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
struct PasswordGrantRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpMetadata<'a>,
}

#[derive(Debug, Serialize)]
struct SignUpMetadata<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    full_name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    user: User,
}

// The provider is inconsistent about which field carries the human-readable reason.
#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    error_code: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl ProviderErrorBody {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }

    // Newer providers answer 403 for a dead JWT or session and tag it with a code.
    fn is_credential_verdict(&self) -> bool {
        matches!(
            self.error_code.as_deref(),
            Some(
                "bad_jwt"
                    | "session_not_found"
                    | "session_expired"
                    | "refresh_token_not_found"
                    | "refresh_token_already_used"
            )
        )
    }
}

// Thin reqwest client for a GoTrue-compatible identity REST API.
#[derive(Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl IdentityClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    async fn token_grant<T: Serialize>(
        &self,
        grant_type: &str,
        body: &T,
    ) -> Result<ProviderSession, IdentityError> {
        let url = self.endpoint(&format!("token?grant_type={grant_type}"));
        let response = self
            .http
            .post(url)
            .header("apikey", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(unavailable)?;

        let token = check_status(response)
            .await?
            .json::<TokenResponse>()
            .await
            .map_err(unavailable)?;

        Ok(ProviderSession {
            credentials: CredentialPair {
                access_token: token.access_token,
                refresh_token: token.refresh_token,
            },
            user: token.user,
        })
    }
}

#[async_trait]
impl IdentityProvider for IdentityClient {
    async fn validate(&self, access_token: &str) -> Result<User, IdentityError> {
        let response = self
            .http
            .get(self.endpoint("user"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(unavailable)?;

        check_status(response)
            .await?
            .json::<User>()
            .await
            .map_err(unavailable)
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<ProviderSession, IdentityError> {
        self.token_grant("refresh_token", &RefreshTokenRequest { refresh_token })
            .await
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, IdentityError> {
        self.token_grant("password", &PasswordGrantRequest { email, password })
            .await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<User, IdentityError> {
        let response = self
            .http
            .post(self.endpoint("signup"))
            .header("apikey", &self.api_key)
            .json(&SignUpRequest {
                email,
                password,
                data: SignUpMetadata { full_name },
            })
            .send()
            .await
            .map_err(unavailable)?;

        let mut body = check_status(response)
            .await?
            .json::<Value>()
            .await
            .map_err(unavailable)?;

        // Auto-confirmed projects answer with a session wrapping the user.
        let user = if body.get("user").is_some_and(Value::is_object) {
            body["user"].take()
        } else {
            body
        };
        serde_json::from_value(user).map_err(unavailable)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let response = self
            .http
            .post(self.endpoint("logout"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(unavailable)?;

        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response, IdentityError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = if status.is_client_error() {
        response
            .json::<ProviderErrorBody>()
            .await
            .unwrap_or_default()
    } else {
        ProviderErrorBody::default()
    };
    Err(classify_failure(status, body))
}

// Only a verdict on the credential is a rejection. Throttling, timeouts, a refused
// API key and 5xx mean the provider could not decide.
fn classify_failure(status: StatusCode, body: ProviderErrorBody) -> IdentityError {
    let verdict = match status {
        StatusCode::BAD_REQUEST
        | StatusCode::UNAUTHORIZED
        | StatusCode::NOT_FOUND
        | StatusCode::UNPROCESSABLE_ENTITY => true,
        StatusCode::FORBIDDEN => body.is_credential_verdict(),
        _ => false,
    };

    if verdict {
        let message = body.into_message().unwrap_or_else(|| status.to_string());
        return IdentityError::Rejected(message);
    }

    match body.into_message() {
        Some(message) => {
            IdentityError::Unavailable(format!("identity provider answered {status}: {message}"))
        }
        None => IdentityError::Unavailable(format!("identity provider answered {status}")),
    }
}

fn unavailable(err: impl std::fmt::Display) -> IdentityError {
    IdentityError::Unavailable(err.to_string())
}
