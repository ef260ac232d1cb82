// src/scoring.rs
//! Impact scoring.
//!
//! Three saturating signals, each normalized to [0,1] and multiplied by its weight:
//! - `keywords` : occurrences of high-impact keywords in title + content
//! - `metrics`  : number of numeric entries in `metadata.impact_metrics`
//! - `authors`  : number of distinct named authors/organizations
//!
//! score = w_keywords*keywords + w_metrics*metrics + w_authors*authors, clamped to [0,100].
//! With the default weights (40/30/30) the components land in [0,40], [0,30], [0,30].
//! Every signal is monotone: more of it never lowers the score.

use serde::{Deserialize, Serialize};

use crate::item::{lower_set, NewsItem};

pub const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub keyword_weight: f64,
    pub metric_weight: f64,
    pub author_weight: f64,
    /// Occurrence count at which the keyword signal saturates.
    pub keyword_cap: u32,
    pub metric_cap: u32,
    pub author_cap: u32,
    pub high_impact_keywords: Vec<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            keyword_weight: 40.0,
            metric_weight: 30.0,
            author_weight: 30.0,
            keyword_cap: 5,
            metric_cap: 5,
            author_cap: 5,
            high_impact_keywords: [
                "breakthrough",
                "state-of-the-art",
                "sota",
                "funding",
                "acquisition",
                "acquires",
                "launch",
                "open-source",
                "record",
                "billion",
                "regulation",
                "benchmark",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Per-signal contributions, already weighted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub keywords: f64,
    pub metrics: f64,
    pub authors: f64,
    pub keyword_hits: usize,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        let t = self.keywords + self.metrics + self.authors;
        if t.is_finite() {
            t.clamp(0.0, MAX_SCORE)
        } else {
            0.0
        }
    }
}

/// Pure scorer; depends on the item only, never on store state.
#[derive(Debug, Clone)]
pub struct ImpactScorer {
    cfg: ScoringConfig,
    keywords: Vec<String>,
}

impl Default for ImpactScorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

impl ImpactScorer {
    pub fn new(cfg: ScoringConfig) -> Self {
        let keywords = lower_set(cfg.high_impact_keywords.iter())
            .into_iter()
            .collect();
        Self { cfg, keywords }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.cfg
    }

    pub fn score(&self, item: &NewsItem) -> f64 {
        self.breakdown(item).total()
    }

    pub fn breakdown(&self, item: &NewsItem) -> ScoreBreakdown {
        let text = item.searchable_text().to_lowercase();
        let keyword_hits: usize = self
            .keywords
            .iter()
            .map(|k| text.matches(k.as_str()).count())
            .sum();
        let metric_count = item.metadata.impact_metrics.len();
        let author_count = lower_set(item.metadata.authors.iter()).len();

        ScoreBreakdown {
            keywords: weighted(keyword_hits, self.cfg.keyword_cap, self.cfg.keyword_weight),
            metrics: weighted(metric_count, self.cfg.metric_cap, self.cfg.metric_weight),
            authors: weighted(author_count, self.cfg.author_cap, self.cfg.author_weight),
            keyword_hits,
        }
    }
}

/// `weight * min(count, cap) / cap`; a zero cap disables the signal.
fn weighted(count: usize, cap: u32, weight: f64) -> f64 {
    if cap == 0 || !weight.is_finite() {
        return 0.0;
    }
    let c = count.min(cap as usize) as f64;
    (weight.max(0.0) * c / cap as f64).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::normalize;
    use serde_json::json;

    #[test]
    fn plain_item_scores_zero() {
        let s = ImpactScorer::default();
        let it = normalize(&json!({ "title": "Quiet day" }));
        assert_eq!(s.score(&it), 0.0);
    }

    #[test]
    fn components_stay_in_their_bands() {
        let s = ImpactScorer::default();
        let it = normalize(&json!({
            "title": "breakthrough breakthrough breakthrough record funding billion sota",
            "metrics": { "a": 1, "b": 2, "c": 3, "d": 4, "e": 5, "f": 6, "g": 7 },
            "authors": ["a", "b", "c", "d", "e", "f", "g"],
        }));
        let b = s.breakdown(&it);
        assert!((b.keywords - 40.0).abs() < 1e-9);
        assert!((b.metrics - 30.0).abs() < 1e-9);
        assert!((b.authors - 30.0).abs() < 1e-9);
        assert!((b.total() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn adding_a_keyword_never_lowers_the_score() {
        let s = ImpactScorer::default();
        let mut content = String::from("A new model");
        let mut prev = s.score(&normalize(&json!({ "content": content })));
        for _ in 0..10 {
            content.push_str(" breakthrough");
            let next = s.score(&normalize(&json!({ "content": content })));
            assert!(next >= prev, "{next} < {prev}");
            assert!((0.0..=MAX_SCORE).contains(&next));
            prev = next;
        }
    }

    #[test]
    fn duplicate_authors_count_once() {
        let s = ImpactScorer::default();
        let it = normalize(&json!({ "authors": ["OpenAI", "openai", "DeepMind"] }));
        assert!((s.breakdown(&it).authors - 12.0).abs() < 1e-9);
    }

    #[test]
    fn zero_caps_disable_signals() {
        let s = ImpactScorer::new(ScoringConfig {
            keyword_cap: 0,
            ..ScoringConfig::default()
        });
        let it = normalize(&json!({ "title": "breakthrough" }));
        assert_eq!(s.score(&it), 0.0);
    }
}
