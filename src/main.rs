//! War Crypto Portal — Binary Entrypoint
//! Boots the Axum HTTP server: news relays, syndication feeds, the chat
//! relay, and the Prometheus exporter.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use shuttle_axum::ShuttleAxum;
use war_crypto_portal::feed::language::LanguageProfile;
use war_crypto_portal::metrics::Metrics;
use war_crypto_portal::{create_router, AppState, PortalConfig};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - PORTAL_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("PORTAL_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments. This enables
    // PORTAL_BACKEND_URL / PORTAL_SITE_URL / LANGUAGE_CONFIG_PATH from .env.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let cfg = PortalConfig::from_env();
    let lang = LanguageProfile::from_toml()?;

    let metrics = Metrics::init();
    let state = AppState::new(cfg, lang);
    let router = create_router(state).merge(metrics.router());

    Ok(router.into())
}
