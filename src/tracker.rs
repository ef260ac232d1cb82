// src/tracker.rs
//! # Trend Tracker
//! The agent: composes the normalizer, categorizer, scorer and relation finder
//! around one shared [`TrendStore`].
//!
//! Writes (`process_news_item`) take the store's write lock, so arrival order
//! and id uniqueness hold even when several collectors feed one tracker.
//! Reads (`get_trending_topics`, `generate_insight_report`) share the read lock
//! and therefore see a consistent snapshot.

use chrono::{DateTime, Duration, Utc};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, trace};

use crate::category::{Categorizer, TrackingCategory};
use crate::config::TrackerConfig;
use crate::error::{TrackerError, TrackerResult};
use crate::item::{anon_id, normalize_at};
use crate::relation::RelationFinder;
use crate::report::{self, InsightReport, ReportConfig, TrendingConfig, TrendingTopic};
use crate::scoring::ImpactScorer;
use crate::store::{RecordId, TrendStore};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "tracker_items_accepted_total",
            "Items categorized and stored."
        );
        describe_counter!(
            "tracker_items_discarded_total",
            "Items matching no tracking category."
        );
        describe_gauge!("tracker_records", "Records currently held by the store.");
    });
}

/// Result of feeding a batch of raw items.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub accepted: Vec<RecordId>,
    pub discarded: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub records: usize,
}

#[derive(Debug)]
pub struct TrendTracker {
    name: String,
    categorizer: Categorizer,
    scorer: ImpactScorer,
    relations: RelationFinder,
    trending: TrendingConfig,
    report: ReportConfig,
    store: RwLock<TrendStore>,
}

impl TrendTracker {
    /// Tracker with default settings over `categories`.
    pub fn new(name: impl Into<String>, categories: Vec<TrackingCategory>) -> TrackerResult<Self> {
        Self::from_config(TrackerConfig {
            name: name.into(),
            categories,
            ..TrackerConfig::default()
        })
    }

    pub fn from_config(cfg: TrackerConfig) -> TrackerResult<Self> {
        cfg.validate()?;
        let categorizer = Categorizer::new(cfg.categories);
        let store = TrendStore::new(
            categorizer.categories().iter().map(|c| c.name.clone()),
            &cfg.store,
        )?;
        Ok(Self {
            name: cfg.name,
            categorizer,
            scorer: ImpactScorer::new(cfg.scoring),
            relations: RelationFinder::new(&cfg.relations),
            trending: cfg.trending,
            report: cfg.report,
            store: RwLock::new(store),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn categories(&self) -> &[TrackingCategory] {
        self.categorizer.categories()
    }

    /// Normalize, categorize, score, link and store one raw item.
    /// Returns the new record id, or `None` if no category matched.
    pub fn process_news_item(&self, raw: &Value) -> Option<RecordId> {
        self.process_news_item_at(raw, Utc::now())
    }

    /// Same as [`process_news_item`](Self::process_news_item) with an explicit clock.
    pub fn process_news_item_at(&self, raw: &Value, now: DateTime<Utc>) -> Option<RecordId> {
        ensure_metrics_described();

        let item = normalize_at(raw, now);
        let Some(category) = self.categorizer.categorize(&item) else {
            trace!(target: "tracker", item = %anon_id(&item.title), source = %item.source, "no category; discarded");
            counter!("tracker_items_discarded_total").increment(1);
            return None;
        };
        let score = self.scorer.score(&item);
        let item_id = anon_id(&item.title);

        let mut store = self.store.write();
        let related = store
            .records(&category)
            .map(|recs| self.relations.find_related(&item, recs))
            .unwrap_or_default();
        let related_count = related.len();
        let id = store.append(&category, item, score, related, now)?;
        let total = store.len();
        drop(store);

        debug!(
            target: "tracker",
            %id, category = %category, score, related = related_count, item = %item_id,
            "item accepted"
        );
        counter!("tracker_items_accepted_total").increment(1);
        gauge!("tracker_records").set(total as f64);
        Some(id)
    }

    /// Feed gathered items one at a time, in order.
    pub fn process_batch<I>(&self, items: I) -> BatchOutcome
    where
        I: IntoIterator<Item = Value>,
    {
        let now = Utc::now();
        let mut out = BatchOutcome::default();
        for raw in items {
            match self.process_news_item_at(&raw, now) {
                Some(id) => out.accepted.push(id),
                None => out.discarded += 1,
            }
        }
        out
    }

    /// Top records per category stored within the last `timeframe_days` days.
    pub fn get_trending_topics(
        &self,
        timeframe_days: i64,
    ) -> TrackerResult<BTreeMap<String, Vec<TrendingTopic>>> {
        self.get_trending_topics_at(timeframe_days, Utc::now())
    }

    pub fn get_trending_topics_at(
        &self,
        timeframe_days: i64,
        now: DateTime<Utc>,
    ) -> TrackerResult<BTreeMap<String, Vec<TrendingTopic>>> {
        if timeframe_days < 0 {
            return Err(TrackerError::InvalidArgument(format!(
                "timeframe_days must be non-negative, got {timeframe_days}"
            )));
        }
        // Beyond chrono's range the window simply covers everything.
        let window = Duration::try_days(timeframe_days).unwrap_or(Duration::MAX);
        let store = self.store.read();
        Ok(report::trending_topics(
            &store,
            window,
            now,
            self.trending.top_n,
        ))
    }

    pub fn generate_insight_report(&self) -> InsightReport {
        self.generate_insight_report_at(Utc::now())
    }

    pub fn generate_insight_report_at(&self, now: DateTime<Utc>) -> InsightReport {
        let store = self.store.read();
        report::insight_report(&store, self.categorizer.categories(), &self.report, now)
    }

    /// Owned copy of the store for callers that need a stable view.
    pub fn snapshot(&self) -> TrendStore {
        self.store.read().clone()
    }

    pub fn stats(&self) -> Vec<CategoryCount> {
        let store = self.store.read();
        store
            .iter()
            .map(|(name, recs)| CategoryCount {
                category: name.to_string(),
                records: recs.len(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::default_categories;
    use chrono::TimeZone;
    use serde_json::json;

    fn tracker() -> TrendTracker {
        TrendTracker::new("test", default_categories()).unwrap()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn empty_categories_is_a_configuration_error() {
        let err = TrendTracker::new("x", vec![]).unwrap_err();
        assert!(matches!(err, TrackerError::Configuration(_)));
    }

    #[test]
    fn negative_timeframe_is_rejected() {
        let err = tracker().get_trending_topics(-1).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidArgument(_)));
    }

    #[test]
    fn huge_timeframe_covers_all_records() {
        let t = tracker();
        let old = t0() - Duration::days(3_650);
        t.process_news_item_at(&json!({ "title": "Startup raises funding" }), old)
            .unwrap();
        for days in [200_000_000_000_000, i64::MAX] {
            let trending = t.get_trending_topics_at(days, t0()).unwrap();
            assert_eq!(trending["company_news"].len(), 1);
        }
    }

    #[test]
    fn discarded_items_leave_no_trace() {
        let t = tracker();
        assert!(t.process_news_item(&json!({ "title": "Gardening tips" })).is_none());
        assert!(t.is_empty());
    }

    #[test]
    fn hinted_item_is_trending_with_positive_score() {
        let t = tracker();
        let id = t
            .process_news_item_at(
                &json!({
                    "title": "A breakthrough with state-of-the-art results",
                    "category_hint": "research_papers",
                }),
                t0(),
            )
            .unwrap();
        let trending = t.get_trending_topics_at(7, t0() + Duration::days(1)).unwrap();
        let top = &trending["research_papers"];
        assert_eq!(top[0].record_id, id);
        assert!(top[0].impact_score > 0.0);
    }

    #[test]
    fn records_link_within_category() {
        let t = tracker();
        let a = t
            .process_news_item_at(
                &json!({ "title": "x", "category": "research_papers", "keywords": ["moe"] }),
                t0(),
            )
            .unwrap();
        let b = t
            .process_news_item_at(
                &json!({ "title": "y", "category": "research_papers", "keywords": ["MoE"] }),
                t0(),
            )
            .unwrap();
        let snap = t.snapshot();
        assert_eq!(snap.get(b).unwrap().related, vec![a]);
        assert!(snap.get(a).unwrap().related.is_empty());
    }

    #[test]
    fn batch_counts_accepted_and_discarded() {
        let t = tracker();
        let out = t.process_batch(vec![
            json!({ "title": "Startup raises funding" }),
            json!({ "title": "Cooking show" }),
            json!(null),
        ]);
        assert_eq!(out.accepted.len(), 1);
        assert_eq!(out.discarded, 2);
        let stats = t.stats();
        assert_eq!(stats.len(), 5);
        assert_eq!(
            stats.iter().find(|c| c.category == "company_news").map(|c| c.records),
            Some(1)
        );
    }
}
