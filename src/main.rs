//! UUID Enrichment Pipeline — Binary Entrypoint
//! Boots the Axum HTTP server, wiring the store, pipeline, and middleware.

use std::sync::Arc;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use uuid_enrichment_pipeline::api::{self, AppState};
use uuid_enrichment_pipeline::config::ServiceConfig;
use uuid_enrichment_pipeline::enrich::Enricher;
use uuid_enrichment_pipeline::fetch::HttpBinSource;
use uuid_enrichment_pipeline::metrics::Metrics;
use uuid_enrichment_pipeline::notify::Notifier;
use uuid_enrichment_pipeline::pipeline::Pipeline;
use uuid_enrichment_pipeline::store::SqliteStore;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - PIPELINE_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("PIPELINE_DEV_LOG")
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
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pipeline=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    enable_dev_tracing();

    let config = ServiceConfig::from_env();

    // One connection for the process lifetime; closed at process exit.
    let store = Arc::new(
        SqliteStore::open(&config.database_path).expect("Failed to open results database"),
    );
    let source = Arc::new(HttpBinSource::new(&config));
    let pipeline = Pipeline::new(
        source,
        store.clone(),
        Enricher::new(),
        Notifier::new(config.notify_recipient.clone()),
    );

    let metrics = Metrics::init(config.fetch_timeout_secs);

    let state = AppState {
        pipeline: Arc::new(pipeline),
        store,
    };
    let router = api::create_router(state).merge(metrics.router());

    Ok(router.into())
}
