// src/store.rs
//! Trend store: per-category, arrival-ordered logs of tracked records.
//!
//! The category set is fixed at construction. Records are appended in arrival
//! order (not publication order) and get a store-unique, increasing [`RecordId`].
//! Each category log is capped; once full, its oldest records are dropped.
//! Related-record references are plain ids, so a dropped record simply stops
//! resolving through [`TrendStore::get`].
//!
//! The store itself is not synchronized; the tracker wraps it in a lock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{TrackerError, TrackerResult};
use crate::item::NewsItem;

pub const DEFAULT_MAX_RECORDS_PER_CATEGORY: usize = 10_000;

/// Store-unique record identifier; increases with arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedRecord {
    pub id: RecordId,
    pub category: String,
    /// Processing time; the clock trend windows run on.
    pub stored_at: DateTime<Utc>,
    pub item: NewsItem,
    /// In [0, 100]; computed once at creation.
    pub impact_score: f64,
    /// Weak references to related records in the same category.
    pub related: Vec<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub max_records_per_category: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_records_per_category: DEFAULT_MAX_RECORDS_PER_CATEGORY,
        }
    }
}

#[derive(Debug, Clone)]
struct CategoryLog {
    name: String,
    records: Vec<TrackedRecord>,
}

#[derive(Debug, Clone)]
pub struct TrendStore {
    logs: Vec<CategoryLog>,
    next_id: u64,
    cap: usize,
}

impl TrendStore {
    /// Empty store over `categories` (order preserved). Names must be unique and non-empty.
    pub fn new<I, S>(categories: I, cfg: &StoreConfig) -> TrackerResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut logs = Vec::new();
        for name in categories {
            let name: String = name.into();
            if name.trim().is_empty() {
                return Err(TrackerError::Configuration(
                    "category names must not be empty".into(),
                ));
            }
            if !seen.insert(name.clone()) {
                return Err(TrackerError::Configuration(format!(
                    "duplicate category '{name}'"
                )));
            }
            logs.push(CategoryLog {
                name,
                records: Vec::new(),
            });
        }
        if logs.is_empty() {
            return Err(TrackerError::Configuration(
                "at least one tracking category is required".into(),
            ));
        }
        Ok(Self {
            logs,
            next_id: 1,
            cap: cfg.max_records_per_category.max(1),
        })
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.logs.iter().map(|l| l.name.as_str())
    }

    pub fn has_category(&self, name: &str) -> bool {
        self.log(name).is_some()
    }

    /// Records of `category` in arrival order; `None` for unknown categories.
    pub fn records(&self, category: &str) -> Option<&[TrackedRecord]> {
        self.log(category).map(|l| l.records.as_slice())
    }

    /// `(category, records)` pairs in configured category order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[TrackedRecord])> {
        self.logs
            .iter()
            .map(|l| (l.name.as_str(), l.records.as_slice()))
    }

    /// Every record, category by category.
    pub fn all_records(&self) -> impl Iterator<Item = &TrackedRecord> {
        self.logs.iter().flat_map(|l| l.records.iter())
    }

    /// Records of `category` with `from <= stored_at <= to`, in arrival order.
    pub fn window<'a>(
        &'a self,
        category: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Iterator<Item = &'a TrackedRecord> + 'a {
        self.log(category)
            .into_iter()
            .flat_map(|l| l.records.iter())
            .filter(move |r| r.stored_at >= from && r.stored_at <= to)
    }

    pub fn get(&self, id: RecordId) -> Option<&TrackedRecord> {
        // Ids increase within every log, so each log is sorted by id.
        self.logs.iter().find_map(|l| {
            l.records
                .binary_search_by_key(&id, |r| r.id)
                .ok()
                .map(|i| &l.records[i])
        })
    }

    pub fn len(&self) -> usize {
        self.logs.iter().map(|l| l.records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.iter().all(|l| l.records.is_empty())
    }

    /// Append a record; `None` (and no change) if `category` is unknown.
    pub fn append(
        &mut self,
        category: &str,
        item: NewsItem,
        impact_score: f64,
        related: Vec<RecordId>,
        stored_at: DateTime<Utc>,
    ) -> Option<RecordId> {
        let id = RecordId(self.next_id);
        let cap = self.cap;
        let log = self.logs.iter_mut().find(|l| l.name == category)?;
        log.records.push(TrackedRecord {
            id,
            category: log.name.clone(),
            stored_at,
            item,
            impact_score,
            related,
        });
        if log.records.len() > cap {
            let excess = log.records.len() - cap;
            log.records.drain(0..excess);
        }
        self.next_id += 1;
        Some(id)
    }

    fn log(&self, name: &str) -> Option<&CategoryLog> {
        self.logs.iter().find(|l| l.name == name)
    }
}
