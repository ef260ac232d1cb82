// src/config.rs
//! Tracker configuration: categories, scoring weights, windows, thresholds.
//!
//! Every section has defaults, so a config file only needs the keys it changes.
//! Categories may be given as plain names (`categories = ["research_papers"]`)
//! or as tables with explicit keywords:
//!
//! ```toml
//! name = "ai_trends_tracker"
//!
//! [[categories]]
//! name = "large_language_models"
//! keywords = ["llm", "gpt", "transformer"]
//!
//! [report]
//! window_days = 30
//! emerging_threshold = 70.0
//! ```

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::category::{default_categories, TrackingCategory};
use crate::collect::CollectConfig;
use crate::error::{TrackerError, TrackerResult};
use crate::relation::RelationConfig;
use crate::report::{ReportConfig, TrendingConfig};
use crate::scoring::{ScoringConfig, MAX_SCORE};
use crate::store::StoreConfig;

pub const ENV_CONFIG_PATH: &str = "TRACKER_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/tracker.toml";
pub const DEFAULT_JSON_PATH: &str = "config/tracker.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub name: String,
    #[serde(deserialize_with = "de_categories")]
    pub categories: Vec<TrackingCategory>,
    pub scoring: ScoringConfig,
    pub relations: RelationConfig,
    pub trending: TrendingConfig,
    pub report: ReportConfig,
    pub store: StoreConfig,
    pub collect: CollectConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            name: "ai_trends_tracker".to_string(),
            categories: default_categories(),
            scoring: ScoringConfig::default(),
            relations: RelationConfig::default(),
            trending: TrendingConfig::default(),
            report: ReportConfig::default(),
            store: StoreConfig::default(),
            collect: CollectConfig::default(),
        }
    }
}

impl TrackerConfig {
    /// Default config tracking the given category names.
    pub fn with_categories<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: names.into_iter().map(TrackingCategory::named).collect(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> TrackerResult<()> {
        let bad = |msg: String| Err(TrackerError::Configuration(msg));

        if self.categories.is_empty() {
            return bad("at least one tracking category is required".into());
        }
        let mut seen = HashSet::new();
        for c in &self.categories {
            let n = c.name.trim();
            if n.is_empty() {
                return bad("category names must not be empty".into());
            }
            if !seen.insert(n) {
                return bad(format!("duplicate category '{n}'"));
            }
        }

        let s = &self.scoring;
        for (field, w) in [
            ("scoring.keyword_weight", s.keyword_weight),
            ("scoring.metric_weight", s.metric_weight),
            ("scoring.author_weight", s.author_weight),
        ] {
            if !w.is_finite() || w < 0.0 {
                return bad(format!("{field} must be a finite, non-negative number"));
            }
        }

        if self.relations.max_results == 0 {
            return bad("relations.max_results must be at least 1".into());
        }
        if self.trending.top_n == 0 {
            return bad("trending.top_n must be at least 1".into());
        }
        for (field, t) in [
            ("report.emerging_threshold", self.report.emerging_threshold),
            (
                "report.recommendation_threshold",
                self.report.recommendation_threshold,
            ),
        ] {
            if !(0.0..=MAX_SCORE).contains(&t) {
                return bad(format!("{field} must be within [0, {MAX_SCORE}]"));
            }
        }
        if !(0.0..=1.0).contains(&self.collect.similarity_threshold) {
            return bad("collect.similarity_threshold must be within [0, 1]".into());
        }
        Ok(())
    }
}

/// Accept either plain names or full category tables.
fn de_categories<'de, D>(d: D) -> std::result::Result<Vec<TrackingCategory>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Entry {
        Name(String),
        Full(TrackingCategory),
    }
    let entries = Vec::<Entry>::deserialize(d)?;
    Ok(entries
        .into_iter()
        .map(|s| match s {
            Entry::Name(n) => TrackingCategory::named(n.trim()),
            Entry::Full(c) => c.resolved(),
        })
        .collect())
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<TrackerConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading tracker config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg = parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing tracker config {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load config using env var + fallbacks:
/// 1) $TRACKER_CONFIG_PATH
/// 2) config/tracker.toml
/// 3) config/tracker.json
/// 4) built-in defaults
pub fn load_config_default() -> Result<TrackerConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from(DEFAULT_TOML_PATH);
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    let json_p = PathBuf::from(DEFAULT_JSON_PATH);
    if json_p.exists() {
        return load_config_from(&json_p);
    }
    Ok(TrackerConfig::default())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<TrackerConfig> {
    match hint_ext {
        "toml" => return toml::from_str(s).context("invalid TOML"),
        "json" => return serde_json::from_str(s).context("invalid JSON"),
        _ => {}
    }
    // No usable extension: JSON documents start with '{'.
    if s.trim_start().starts_with('{') {
        serde_json::from_str(s).context("invalid JSON")
    } else {
        toml::from_str(s).context("invalid TOML")
    }
}
