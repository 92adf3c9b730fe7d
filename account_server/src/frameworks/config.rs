use std::{env, io, time::Duration};

// Runtime/server settings read from the environment (optionally via .env).

pub fn http_port() -> u16 {
    env::var("ACCOUNT_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000)
}

pub fn site_url() -> String {
    env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

// Cookies are only marked Secure in production.
pub fn secure_cookies() -> bool {
    matches!(env::var("APP_ENV").as_deref(), Ok("production"))
}

pub fn default_lang() -> String {
    env::var("DEFAULT_LANG").unwrap_or_else(|_| "en".to_string())
}

pub fn identity_provider_timeout() -> Duration {
    let millis = env::var("IDENTITY_PROVIDER_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(1500);
    Duration::from_millis(millis)
}

pub fn billing_api_url() -> String {
    env::var("BILLING_API_URL").unwrap_or_else(|_| "https://api.stripe.com".to_string())
}

pub fn billing_timeout() -> Duration {
    let millis = env::var("BILLING_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(10_000);
    Duration::from_millis(millis)
}

pub fn billing_webhook_secret() -> Option<String> {
    env::var("BILLING_WEBHOOK_SECRET")
        .ok()
        .filter(|value| !value.is_empty())
}

fn required(name: &str) -> io::Result<String> {
    env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| io::Error::other(format!("missing required environment variable {name}")))
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub http_port: u16,
    pub site_url: String,
    pub secure_cookies: bool,
    pub default_lang: String,
    pub identity_provider_url: String,
    pub identity_provider_api_key: String,
    pub identity_provider_timeout: Duration,
    pub billing_api_url: String,
    pub billing_secret_key: String,
    pub billing_timeout: Duration,
    pub billing_webhook_secret: Option<String>,
    pub database_url: String,
}

impl Settings {
    pub fn from_env() -> io::Result<Self> {
        Ok(Self {
            http_port: http_port(),
            site_url: site_url(),
            secure_cookies: secure_cookies(),
            default_lang: default_lang(),
            identity_provider_url: required("IDENTITY_PROVIDER_URL")?,
            identity_provider_api_key: required("IDENTITY_PROVIDER_API_KEY")?,
            identity_provider_timeout: identity_provider_timeout(),
            billing_api_url: billing_api_url(),
            billing_secret_key: required("BILLING_SECRET_KEY")?,
            billing_timeout: billing_timeout(),
            billing_webhook_secret: billing_webhook_secret(),
            database_url: required("DATABASE_URL")?,
        })
    }
}
