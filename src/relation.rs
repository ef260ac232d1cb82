// src/relation.rs
//! Relation finder: links a new item to prior records that talk about the same thing.
//!
//! Two items are related when they share at least one keyword token and their
//! publication times lie within `window` of each other (inclusive). Tokens come
//! from `metadata.keywords`; items without keywords fall back to significant
//! title words. Results are capped and ordered by shared-token count (desc),
//! then most recent publication, then newest record id.

use chrono::Duration;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::item::{lower_set, NewsItem};
use crate::store::{RecordId, TrackedRecord};

pub const DEFAULT_WINDOW_DAYS: u32 = 30;
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Title words shorter than this are not significant.
const MIN_TITLE_WORD_LEN: usize = 4;

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "about", "after", "again", "also", "from", "have", "into", "just", "more", "most", "over",
        "said", "says", "than", "that", "their", "them", "then", "there", "these", "they", "this",
        "what", "when", "which", "while", "will", "with", "would", "your", "new", "news", "today",
        "week", "report", "update",
    ]
    .into_iter()
    .collect()
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationConfig {
    pub window_days: u32,
    pub max_results: usize,
}

impl Default for RelationConfig {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelationFinder {
    window: Duration,
    max_results: usize,
}

impl Default for RelationFinder {
    fn default() -> Self {
        Self::new(&RelationConfig::default())
    }
}

impl RelationFinder {
    pub fn new(cfg: &RelationConfig) -> Self {
        Self {
            window: Duration::days(i64::from(cfg.window_days)),
            max_results: cfg.max_results,
        }
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Related record ids among `candidates`, best first. Never mutates anything.
    pub fn find_related(&self, item: &NewsItem, candidates: &[TrackedRecord]) -> Vec<RecordId> {
        self.find_related_limited(item, candidates, self.max_results)
    }

    pub fn find_related_limited(
        &self,
        item: &NewsItem,
        candidates: &[TrackedRecord],
        max_results: usize,
    ) -> Vec<RecordId> {
        if max_results == 0 {
            return Vec::new();
        }
        let tokens = relation_tokens(item);
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<(usize, &TrackedRecord)> = candidates
            .iter()
            .filter(|rec| (item.timestamp - rec.item.timestamp).abs() <= self.window)
            .filter_map(|rec| {
                let shared = relation_tokens(&rec.item).intersection(&tokens).count();
                (shared > 0).then_some((shared, rec))
            })
            .collect();

        hits.sort_by(|(sa, a), (sb, b)| {
            sb.cmp(sa)
                .then_with(|| b.item.timestamp.cmp(&a.item.timestamp))
                .then_with(|| b.id.cmp(&a.id))
        });

        hits.into_iter()
            .take(max_results)
            .map(|(_, rec)| rec.id)
            .collect()
    }
}

/// Keyword tokens for similarity, lowercased.
pub fn relation_tokens(item: &NewsItem) -> BTreeSet<String> {
    let kw = lower_set(item.metadata.keywords.iter());
    if !kw.is_empty() {
        return kw;
    }
    significant_words(&item.title)
}

fn significant_words(title: &str) -> BTreeSet<String> {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_TITLE_WORD_LEN)
        .map(str::to_lowercase)
        .filter(|w| !STOP_WORDS.contains(w.as_str()))
        .collect()
}
