// Framework bootstrap for the account server runtime.

use crate::frameworks::config::Settings;
use crate::frameworks::db;
use crate::interface_adapters::clients::{BillingClient, IdentityClient};
use crate::interface_adapters::routes::app;
use crate::interface_adapters::state::{AppState, HttpSettings, SystemClock};
use crate::interface_adapters::store::PostgresBillingStore;

use std::io::{Error, Result};
use std::net::SocketAddr;
use std::sync::Arc;

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener, state: AppState) -> Result<()> {
    let address = listener.local_addr()?;
    let app = app(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let settings = Settings::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
    })?;
    let state = build_state(&settings).await?;

    let address = SocketAddr::from(([0, 0, 0, 0], settings.http_port));
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener, state).await
}

pub async fn build_state(settings: &Settings) -> Result<AppState> {
    let identity = IdentityClient::new(
        settings.identity_provider_url.clone(),
        settings.identity_provider_api_key.clone(),
        settings.identity_provider_timeout,
    )
    .map_err(|e| Error::other(format!("failed to initialize identity client: {e}")))?;
    tracing::debug!(
        identity_provider_url = %settings.identity_provider_url,
        timeout_ms = settings.identity_provider_timeout.as_millis(),
        "identity client configured"
    );

    let billing = BillingClient::new(
        settings.billing_api_url.clone(),
        settings.billing_secret_key.clone(),
        settings.billing_timeout,
    )
    .map_err(|e| Error::other(format!("failed to initialize billing client: {e}")))?;

    let pool = db::connect_pool(&settings.database_url)
        .await
        .map_err(|e| Error::other(format!("failed to connect to database: {e}")))?;
    db::run_migrations(&pool)
        .await
        .map_err(|e| Error::other(format!("failed to run migrations: {e}")))?;

    if settings.billing_webhook_secret.is_none() {
        tracing::warn!("BILLING_WEBHOOK_SECRET is not set; webhooks will be rejected");
    }

    Ok(AppState {
        identity: Arc::new(identity),
        billing: Arc::new(billing),
        store: Arc::new(PostgresBillingStore { db: pool }),
        clock: Arc::new(SystemClock),
        settings: HttpSettings {
            secure_cookies: settings.secure_cookies,
            site_url: settings.site_url.clone(),
            default_lang: settings.default_lang.clone(),
            webhook_secret: settings.billing_webhook_secret.clone(),
        },
    })
}
