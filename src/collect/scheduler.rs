// src/collect/scheduler.rs
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::collect::types::SourceProvider;
use crate::collect::{collect_all, CollectConfig};
use crate::tracker::{BatchOutcome, TrendTracker};

/// Collect once and feed everything kept to the tracker, in order.
pub async fn collect_into(
    tracker: &TrendTracker,
    providers: &[Box<dyn SourceProvider>],
    cfg: &CollectConfig,
) -> BatchOutcome {
    let collected = collect_all(providers, cfg).await;
    let outcome = tracker.process_batch(collected.items);

    counter!("collect_runs_total").increment(1);
    tracing::info!(
        target: "collect",
        accepted = outcome.accepted.len(),
        discarded = outcome.discarded,
        filtered = collected.filtered,
        dedup = collected.dedup,
        failed = collected.failed.len(),
        "collection tick"
    );
    outcome
}

/// Spawn a background loop that collects every `interval` and feeds `tracker`.
/// The first tick fires immediately.
pub fn spawn_collection_scheduler(
    tracker: Arc<TrendTracker>,
    providers: Vec<Box<dyn SourceProvider>>,
    cfg: CollectConfig,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            collect_into(&tracker, &providers, &cfg).await;
        }
    })
}

/// Providers backed by the fixtures embedded at build time.
/// Requires feature `collect-fixtures`.
#[cfg(feature = "collect-fixtures")]
pub fn fixture_providers() -> Vec<Box<dyn SourceProvider>> {
    use crate::collect::providers::{ArxivAtomProvider, RssNewsProvider, SocialTrendProvider};

    let arxiv_xml: &str = include_str!("../../tests/fixtures/arxiv_atom.xml");
    let news_xml: &str = include_str!("../../tests/fixtures/ai_news_rss.xml");
    let social_json: &str = include_str!("../../tests/fixtures/social_trends.json");

    vec![
        Box::new(ArxivAtomProvider::from_fixture(arxiv_xml)),
        Box::new(RssNewsProvider::from_fixture("ai-news-wire", news_xml)),
        Box::new(SocialTrendProvider::from_fixture("twitter", social_json)),
    ]
}
