//! AI Trend Tracker — Binary Entrypoint
//! Boots the Axum HTTP server: loads config, builds the tracker, wires routes
//! and metrics, and (with `collect-fixtures`) starts background collection.

use std::sync::Arc;

use ai_trend_tracker::{
    api::{create_router, AppState},
    config::load_config_default,
    metrics::Metrics,
    tracker::TrendTracker,
};
use anyhow::Context;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs; `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tracker=info,collect=info,warn"));

    // Shuttle may already have installed a subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[cfg(feature = "collect-fixtures")]
fn start_collection(tracker: Arc<TrendTracker>, cfg: ai_trend_tracker::collect::CollectConfig) {
    use ai_trend_tracker::collect::scheduler::{fixture_providers, spawn_collection_scheduler};

    let every = std::env::var("COLLECT_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(300);
    spawn_collection_scheduler(
        tracker,
        fixture_providers(),
        cfg,
        std::time::Duration::from_secs(every),
    );
    tracing::info!(target: "collect", interval_secs = every, "fixture collection scheduled");
}

#[cfg(not(feature = "collect-fixtures"))]
fn start_collection(_tracker: Arc<TrendTracker>, _cfg: ai_trend_tracker::collect::CollectConfig) {}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    // This enables TRACKER_CONFIG_PATH / RUST_LOG from .env.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = load_config_default().context("loading tracker config")?;
    let collect_cfg = cfg.collect.clone();
    let metrics = Metrics::init(&cfg)?;
    let tracker = Arc::new(TrendTracker::from_config(cfg).context("building tracker")?);
    tracing::info!(
        target: "tracker",
        name = tracker.name(),
        categories = tracker.categories().len(),
        "tracker ready"
    );

    start_collection(tracker.clone(), collect_cfg);

    let router = create_router(AppState::new(tracker)).merge(metrics.router());

    Ok(router.into())
}
