// src/metrics.rs
//! Prometheus exposition for the tracker. Counters and gauges are emitted where
//! the work happens (`tracker`, `collect`); this module installs the recorder,
//! publishes the active settings, and serves `/metrics`.

use anyhow::{Context, Result};
use axum::{http::header, routing::get, Router};
use metrics::{describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::TrackerConfig;

const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

pub struct Metrics {
    handle: PrometheusHandle,
}

/// Gauges describing the loaded configuration, so dashboards can tell which
/// thresholds a deployment runs with.
pub fn publish_settings(cfg: &TrackerConfig) {
    describe_gauge!("tracker_categories", "Configured tracking categories.");
    describe_gauge!(
        "tracker_relation_window_days",
        "Days within which records can be linked as related."
    );
    describe_gauge!(
        "tracker_emerging_threshold",
        "Impact score at or above which a record counts as emerging."
    );
    gauge!("tracker_categories").set(cfg.categories.len() as f64);
    gauge!("tracker_relation_window_days").set(f64::from(cfg.relations.window_days));
    gauge!("tracker_emerging_threshold").set(cfg.report.emerging_threshold);
}

impl Metrics {
    /// Install the global Prometheus recorder and publish `cfg`'s settings.
    pub fn init(cfg: &TrackerConfig) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        publish_settings(cfg);
        tracing::debug!(target: "tracker", categories = cfg.categories.len(), "metrics recorder installed");
        Ok(Self::from_handle(handle))
    }

    pub fn from_handle(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { ([(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], h.render()) }
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body, body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt as _;

    #[tokio::test]
    async fn exposes_configured_settings() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let exporter = Metrics::from_handle(recorder.handle());
        let mut cfg = TrackerConfig::with_categories(["research_papers", "company_news"]);
        cfg.relations.window_days = 14;
        metrics::with_local_recorder(&recorder, || publish_settings(&cfg));

        let resp = exporter
            .router()
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], EXPOSITION_CONTENT_TYPE);

        let bytes = body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        let sample = |name: &str| {
            text.lines()
                .find_map(|l| l.strip_prefix(name)?.strip_prefix(' ')?.parse::<f64>().ok())
        };
        assert_eq!(sample("tracker_categories"), Some(2.0), "{text}");
        assert_eq!(sample("tracker_relation_window_days"), Some(14.0), "{text}");
        assert!(text.contains("# HELP tracker_emerging_threshold"), "{text}");
    }
}
