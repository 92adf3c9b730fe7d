use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::domain::ports::{BillingProvider, BillingStore, Clock, IdentityProvider};

// Request-independent settings the HTTP adapters need.
#[derive(Clone, Debug)]
pub struct HttpSettings {
    pub secure_cookies: bool,
    pub site_url: String,
    pub default_lang: String,
    pub webhook_secret: Option<String>,
}

// Application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityProvider>,
    pub billing: Arc<dyn BillingProvider>,
    pub store: Arc<dyn BillingStore>,
    pub clock: Arc<dyn Clock>,
    pub settings: HttpSettings,
}

// System clock adapter used by webhook verification.
#[derive(Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}
