// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod category;
pub mod collect;
pub mod config;
pub mod error;
pub mod item;
pub mod metrics;
pub mod relation;
pub mod report;
pub mod scoring;
pub mod store;
pub mod tracker;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::category::{default_categories, Categorizer, TrackingCategory};
pub use crate::config::{load_config_default, load_config_from, TrackerConfig};
pub use crate::error::{TrackerError, TrackerResult};
pub use crate::item::{normalize, NewsItem};
pub use crate::report::{InsightReport, TrendingTopic};
pub use crate::store::{RecordId, TrackedRecord, TrendStore};
pub use crate::tracker::{BatchOutcome, TrendTracker};
