// src/collect/mod.rs
//! Collection layer: polls providers concurrently, then filters and
//! de-duplicates what they return before the tracker sees it.
pub mod providers;
pub mod scheduler;
pub mod types;

use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::collect::types::SourceProvider;
use crate::item::{anon_id, normalize_at, NewsItem};

pub const DEFAULT_DEDUP_WINDOW_SECS: u64 = 86_400;
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.92;
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("collect_items_total", "Total items parsed from providers.");
        describe_counter!("collect_kept_total", "Items kept after filtering + dedup.");
        describe_counter!(
            "collect_filtered_total",
            "Items filtered out due to whitelist/empty."
        );
        describe_counter!(
            "collect_dedup_total",
            "Items removed as exact or near duplicates."
        );
        describe_counter!(
            "collect_provider_errors_total",
            "Provider fetch/parse errors and timeouts."
        );
        describe_counter!("collect_runs_total", "Completed collection runs.");
        describe_histogram!("collect_parse_ms", "Provider parse time in milliseconds.");
        describe_gauge!(
            "collect_last_run_ts",
            "Unix ts when the collection pipeline last ran."
        );
    });
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectConfig {
    /// Source whitelist (case-insensitive). Empty accepts every source.
    pub sources: Vec<String>,
    pub dedup_window_secs: u64,
    /// Normalized Levenshtein similarity at or above which two titles are duplicates.
    pub similarity_threshold: f64,
    pub timeout_secs: u64,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            dedup_window_secs: DEFAULT_DEDUP_WINDOW_SECS,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Outcome of one collection run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collected {
    /// Raw items that survived filtering, in provider order.
    pub items: Vec<Value>,
    pub filtered: usize,
    pub dedup: usize,
    /// Names of providers that failed or timed out.
    pub failed: Vec<String>,
}

pub fn is_whitelisted<S: AsRef<str>>(source: S, whitelist: &[String]) -> bool {
    let s = source.as_ref();
    whitelist.iter().any(|w| w.eq_ignore_ascii_case(s))
}

/// Drop non-whitelisted and empty items, then exact and near-duplicate ones.
/// Returns `(kept, filtered_count, dedup_count)`.
pub fn filter_and_dedup(
    now: DateTime<Utc>,
    raw: Vec<Value>,
    cfg: &CollectConfig,
) -> (Vec<Value>, usize, usize) {
    // Normalize + filter
    let mut filtered_out = 0usize;
    let mut candidates: Vec<(Value, NewsItem)> = Vec::with_capacity(raw.len());
    for v in raw {
        let item = normalize_at(&v, now);
        let empty = item.title.is_empty() && item.content.is_empty();
        let allowed = cfg.sources.is_empty() || is_whitelisted(&item.source, &cfg.sources);
        if empty || !allowed {
            filtered_out += 1;
            continue;
        }
        candidates.push((v, item));
    }

    // Deduplicate among recent items only (within window).
    let window = i64::try_from(cfg.dedup_window_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX);
    let mut seen: HashSet<String> = HashSet::new();
    let mut recent_titles: Vec<String> = Vec::new();
    let mut keep = Vec::with_capacity(candidates.len());
    let mut dedup_out = 0usize;

    for (v, item) in candidates {
        let is_recent = now.signed_duration_since(item.timestamp) <= window;
        if is_recent {
            let title = item.title.to_lowercase();
            let near = !title.is_empty()
                && recent_titles.iter().any(|t| {
                    strsim::normalized_levenshtein(t, &title) >= cfg.similarity_threshold
                });
            if !seen.insert(item.fingerprint()) || near {
                tracing::trace!(target: "collect", item = %anon_id(&item.title), "duplicate dropped");
                dedup_out += 1;
                continue;
            }
            if !title.is_empty() {
                recent_titles.push(title);
            }
        }
        keep.push(v);
    }

    (keep, filtered_out, dedup_out)
}

/// Fetch from every provider concurrently, each under its own timeout,
/// then filter and de-duplicate the combined output.
pub async fn collect_all(providers: &[Box<dyn SourceProvider>], cfg: &CollectConfig) -> Collected {
    ensure_metrics_described();

    let limit = std::time::Duration::from_secs(cfg.timeout_secs.max(1));
    let results = join_all(
        providers
            .iter()
            .map(|p| tokio::time::timeout(limit, p.fetch_latest())),
    )
    .await;

    let mut raw = Vec::new();
    let mut failed = Vec::new();
    for (p, res) in providers.iter().zip(results) {
        match res {
            Ok(Ok(mut v)) => {
                tracing::debug!(target: "collect", provider = p.name(), items = v.len(), "provider fetched");
                raw.append(&mut v);
            }
            Ok(Err(e)) => {
                tracing::warn!(target: "collect", error = ?e, provider = p.name(), "provider error");
                counter!("collect_provider_errors_total").increment(1);
                failed.push(p.name().to_string());
            }
            Err(_) => {
                tracing::warn!(target: "collect", provider = p.name(), timeout_secs = cfg.timeout_secs, "provider timed out");
                counter!("collect_provider_errors_total").increment(1);
                failed.push(p.name().to_string());
            }
        }
    }

    let now = Utc::now();
    let (items, filtered, dedup) = filter_and_dedup(now, raw, cfg);

    // Telemetry
    counter!("collect_kept_total").increment(items.len() as u64);
    counter!("collect_filtered_total").increment(filtered as u64);
    counter!("collect_dedup_total").increment(dedup as u64);
    gauge!("collect_last_run_ts").set(now.timestamp() as f64);

    Collected {
        items,
        filtered,
        dedup,
        failed,
    }
}
