// src/report.rs
//! # Insight Reporter
//! Pure aggregation over a [`TrendStore`] snapshot. No I/O.
//!
//! - `trending_topics`: per category, top-N records stored inside a time window.
//! - `insight_report`: summary, key trends, emerging technologies, per-category
//!   market impact, and recommendations derived from the emerging technologies.
//!
//! Ranking everywhere: impact score desc, then earlier `stored_at`, then lower id.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::category::TrackingCategory;
use crate::store::{RecordId, TrackedRecord, TrendStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendingConfig {
    pub top_n: usize,
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self { top_n: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// `None` → the report covers all stored records.
    pub window_days: Option<u32>,
    pub key_trends_limit: usize,
    pub emerging_threshold: f64,
    pub recommendation_threshold: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            window_days: None,
            key_trends_limit: 10,
            emerging_threshold: 70.0,
            recommendation_threshold: 85.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendingTopic {
    pub record_id: RecordId,
    pub title: String,
    pub source: String,
    pub url: String,
    pub impact_score: f64,
    pub stored_at: DateTime<Utc>,
    pub published_at: DateTime<Utc>,
    pub related: Vec<RecordId>,
}

impl From<&TrackedRecord> for TrendingTopic {
    fn from(r: &TrackedRecord) -> Self {
        Self {
            record_id: r.id,
            title: r.item.title.clone(),
            source: r.item.source.clone(),
            url: r.item.url.clone(),
            impact_score: r.impact_score,
            stored_at: r.stored_at,
            published_at: r.item.timestamp,
            related: r.related.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyTrend {
    pub record_id: RecordId,
    pub category: String,
    pub title: String,
    pub description: String,
    pub impact_score: f64,
    pub related_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    Notable,
    High,
    Transformative,
}

impl ImpactLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::Transformative
        } else if score >= 80.0 {
            Self::High
        } else {
            Self::Notable
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Maturity {
    Research,
    EarlyStage,
    Commercial,
    Emerging,
}

impl Maturity {
    pub fn for_category(category: &str) -> Self {
        match category {
            "research_papers" => Self::Research,
            "technical_breakthroughs" => Self::EarlyStage,
            "product_launches" => Self::Commercial,
            _ => Self::Emerging,
        }
    }

    fn advice(self) -> &'static str {
        match self {
            Self::Research => "track follow-up work and reproductions",
            Self::EarlyStage => "prototype it against current workloads",
            Self::Commercial => "assess adoption and vendor options",
            Self::Emerging => "monitor it as it matures",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmergingTechnology {
    pub record_id: RecordId,
    pub name: String,
    pub category: String,
    pub impact: ImpactLevel,
    pub maturity: Maturity,
    pub impact_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketImpact {
    pub item_count: usize,
    pub average_score: f64,
    pub max_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightReport {
    pub generated_at: DateTime<Utc>,
    pub summary: String,
    pub key_trends: Vec<KeyTrend>,
    pub emerging_technologies: Vec<EmergingTechnology>,
    pub market_impacts: BTreeMap<String, MarketImpact>,
    pub recommendations: Vec<String>,
}

/// Per category: records with `stored_at` in `[now - window, now]`, top `top_n`.
/// Categories without matches are omitted.
pub fn trending_topics(
    store: &TrendStore,
    window: Duration,
    now: DateTime<Utc>,
    top_n: usize,
) -> BTreeMap<String, Vec<TrendingTopic>> {
    let from = now
        .checked_sub_signed(window)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let mut out = BTreeMap::new();
    for name in store.category_names() {
        let mut recent: Vec<&TrackedRecord> = store.window(name, from, now).collect();
        if recent.is_empty() {
            continue;
        }
        recent.sort_by(|a, b| rank(a, b));
        let top = recent
            .into_iter()
            .take(top_n)
            .map(TrendingTopic::from)
            .collect();
        out.insert(name.to_string(), top);
    }
    out
}

pub fn insight_report(
    store: &TrendStore,
    categories: &[TrackingCategory],
    cfg: &ReportConfig,
    now: DateTime<Utc>,
) -> InsightReport {
    let from = cfg.window_days.map(|d| {
        now.checked_sub_signed(Duration::days(i64::from(d)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    });
    let in_window = |r: &&TrackedRecord| match from {
        Some(from) => r.stored_at >= from && r.stored_at <= now,
        None => true,
    };
    let mut records: Vec<&TrackedRecord> = store.all_records().filter(in_window).collect();
    records.sort_by(|a, b| rank(a, b));

    let is_tech = |category: &str| {
        categories
            .iter()
            .find(|c| c.name == category)
            .is_some_and(TrackingCategory::is_technology)
    };

    let key_trends: Vec<KeyTrend> = records
        .iter()
        .take(cfg.key_trends_limit)
        .map(|r| KeyTrend {
            record_id: r.id,
            category: r.category.clone(),
            title: r.item.title.clone(),
            description: describe(r),
            impact_score: r.impact_score,
            related_count: r.related.len(),
        })
        .collect();

    let emerging_technologies: Vec<EmergingTechnology> = records
        .iter()
        .filter(|r| r.impact_score > cfg.emerging_threshold && is_tech(r.category.as_str()))
        .map(|r| EmergingTechnology {
            record_id: r.id,
            name: display_title(r),
            category: r.category.clone(),
            impact: ImpactLevel::from_score(r.impact_score),
            maturity: Maturity::for_category(&r.category),
            impact_score: r.impact_score,
        })
        .collect();

    let market_impacts = market_impacts(store, &records);
    let recommendations = recommendations(&emerging_technologies, &market_impacts, cfg);
    let summary = summary(store, &records, &market_impacts, &emerging_technologies, cfg);

    InsightReport {
        generated_at: now,
        summary,
        key_trends,
        emerging_technologies,
        market_impacts,
        recommendations,
    }
}

fn rank(a: &TrackedRecord, b: &TrackedRecord) -> Ordering {
    b.impact_score
        .total_cmp(&a.impact_score)
        .then_with(|| a.stored_at.cmp(&b.stored_at))
        .then_with(|| a.id.cmp(&b.id))
}

fn market_impacts(
    store: &TrendStore,
    records: &[&TrackedRecord],
) -> BTreeMap<String, MarketImpact> {
    let mut out = BTreeMap::new();
    for name in store.category_names() {
        let scores: Vec<f64> = records
            .iter()
            .filter(|r| r.category == name)
            .map(|r| r.impact_score)
            .collect();
        if scores.is_empty() {
            continue;
        }
        let sum: f64 = scores.iter().sum();
        out.insert(
            name.to_string(),
            MarketImpact {
                item_count: scores.len(),
                average_score: sum / scores.len() as f64,
                max_score: scores.iter().copied().fold(0.0, f64::max),
            },
        );
    }
    out
}

/// Most records wins; ties go to the higher average, then the name.
fn most_active(impacts: &BTreeMap<String, MarketImpact>) -> Option<(&String, &MarketImpact)> {
    impacts.iter().max_by(|(na, a), (nb, b)| {
        a.item_count
            .cmp(&b.item_count)
            .then_with(|| a.average_score.total_cmp(&b.average_score))
            .then_with(|| nb.cmp(na))
    })
}

fn recommendations(
    emerging: &[EmergingTechnology],
    impacts: &BTreeMap<String, MarketImpact>,
    cfg: &ReportConfig,
) -> Vec<String> {
    let mut out: Vec<String> = emerging
        .iter()
        .filter(|e| e.impact_score > cfg.recommendation_threshold)
        .map(|e| {
            format!(
                "Evaluate \"{}\" ({}, impact {:.0}): {}.",
                e.name,
                category_label(&e.category),
                e.impact_score,
                e.maturity.advice()
            )
        })
        .collect();

    if let Some((name, m)) = most_active(impacts) {
        out.push(format!(
            "Keep monitoring {}: {} item(s), average impact {:.1}.",
            category_label(name),
            m.item_count,
            m.average_score
        ));
    }
    out
}

fn summary(
    store: &TrendStore,
    records: &[&TrackedRecord],
    impacts: &BTreeMap<String, MarketImpact>,
    emerging: &[EmergingTechnology],
    cfg: &ReportConfig,
) -> String {
    let Some(top) = records.first() else {
        return match cfg.window_days {
            Some(d) if !store.is_empty() => {
                format!("No AI developments were tracked in the last {d} day(s).")
            }
            _ => "No AI developments have been tracked yet.".to_string(),
        };
    };

    let scope = match cfg.window_days {
        Some(d) => format!(" in the last {d} day(s)"),
        None => String::new(),
    };
    let mut s = format!(
        "Tracked {} item(s) across {} of {} categories{}.",
        records.len(),
        impacts.len(),
        store.category_names().count(),
        scope
    );
    if let Some((name, m)) = most_active(impacts) {
        s.push_str(&format!(
            " Most active category: {} ({} item(s)).",
            category_label(name),
            m.item_count
        ));
    }
    s.push_str(&format!(
        " Highest-impact development: \"{}\" (score {:.1}).",
        display_title(top),
        top.impact_score
    ));
    if !emerging.is_empty() {
        s.push_str(&format!(
            " {} emerging technolog{} scored above {:.0}.",
            emerging.len(),
            if emerging.len() == 1 { "y" } else { "ies" },
            cfg.emerging_threshold
        ));
    }
    s
}

/// "research_papers" → "Research Papers".
pub fn category_label(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut cs = w.chars();
            match cs.next() {
                Some(f) => f.to_uppercase().chain(cs).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn display_title(r: &TrackedRecord) -> String {
    if r.item.title.is_empty() {
        format!("Untitled item {}", r.id)
    } else {
        r.item.title.clone()
    }
}

const DESCRIPTION_CHARS: usize = 200;

fn describe(r: &TrackedRecord) -> String {
    let source = if r.item.source.is_empty() {
        "unknown source"
    } else {
        r.item.source.as_str()
    };
    if r.item.content.is_empty() {
        return format!("{} item from {}.", category_label(&r.category), source);
    }
    let mut snippet: String = r.item.content.chars().take(DESCRIPTION_CHARS).collect();
    if r.item.content.chars().count() > DESCRIPTION_CHARS {
        snippet.push('…');
    }
    format!("{source}: {snippet}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::default_categories;
    use crate::item::normalize;
    use crate::store::StoreConfig;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 30, 12, 0, 0).unwrap()
    }

    fn seeded() -> TrendStore {
        let names: Vec<String> = default_categories().into_iter().map(|c| c.name).collect();
        let mut s = TrendStore::new(names, &StoreConfig::default()).unwrap();
        let rows = [
            ("research_papers", "Sparse attention paper", 92.0, 1),
            ("research_papers", "Benchmark study", 40.0, 2),
            ("product_launches", "Assistant v2 launch", 75.0, 3),
            ("company_news", "Lab raises funding", 95.0, 4),
            ("research_papers", "Old paper", 99.0, 40),
        ];
        for (cat, title, score, days_ago) in rows {
            s.append(
                cat,
                normalize(&json!({ "title": title, "source": "test" })),
                score,
                vec![],
                now() - Duration::days(days_ago),
            );
        }
        s
    }

    #[test]
    fn trending_respects_window_and_top_n() {
        let s = seeded();
        let t = trending_topics(&s, Duration::days(7), now(), 1);
        assert_eq!(t.len(), 3);
        assert_eq!(t["research_papers"].len(), 1);
        assert_eq!(t["research_papers"][0].title, "Sparse attention paper");
        assert!(!t.contains_key("policy_updates"));
    }

    #[test]
    fn equal_scores_rank_earlier_first() {
        let mut s = TrendStore::new(["a"], &StoreConfig::default()).unwrap();
        let late = s.append("a", normalize(&json!({})), 50.0, vec![], now()).unwrap();
        let early = s
            .append("a", normalize(&json!({})), 50.0, vec![], now() - Duration::hours(1))
            .unwrap();
        let t = trending_topics(&s, Duration::days(1), now(), 3);
        let ids: Vec<_> = t["a"].iter().map(|x| x.record_id).collect();
        assert_eq!(ids, vec![early, late]);
    }

    #[test]
    fn report_over_all_time() {
        let s = seeded();
        let r = insight_report(&s, &default_categories(), &ReportConfig::default(), now());
        assert_eq!(r.key_trends.len(), 5);
        assert_eq!(r.key_trends[0].title, "Old paper");
        // company_news is not a technology category.
        let names: Vec<_> = r.emerging_technologies.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Old paper", "Sparse attention paper", "Assistant v2 launch"]);
        assert_eq!(r.emerging_technologies[0].impact, ImpactLevel::Transformative);
        assert_eq!(r.emerging_technologies[2].maturity, Maturity::Commercial);
        assert_eq!(r.market_impacts["research_papers"].item_count, 3);
        assert!((r.market_impacts["research_papers"].average_score - 77.0).abs() < 1e-9);
        // Two above 85 plus the monitoring line.
        assert_eq!(r.recommendations.len(), 3);
        assert!(r.recommendations[2].contains("Research Papers"));
        assert!(r.summary.contains("Tracked 5 item(s)"));
    }

    #[test]
    fn report_window_excludes_old_records() {
        let s = seeded();
        let cfg = ReportConfig {
            window_days: Some(7),
            ..ReportConfig::default()
        };
        let r = insight_report(&s, &default_categories(), &cfg, now());
        assert_eq!(r.key_trends.len(), 4);
        assert!(r.key_trends.iter().all(|k| k.title != "Old paper"));
    }

    #[test]
    fn empty_store_report() {
        let s = TrendStore::new(["a"], &StoreConfig::default()).unwrap();
        let r = insight_report(&s, &[], &ReportConfig::default(), now());
        assert!(r.key_trends.is_empty());
        assert!(r.emerging_technologies.is_empty());
        assert!(r.market_impacts.is_empty());
        assert!(r.recommendations.is_empty());
        assert_eq!(r.summary, "No AI developments have been tracked yet.");
    }

    #[test]
    fn labels() {
        assert_eq!(category_label("research_papers"), "Research Papers");
        assert_eq!(category_label("ai"), "Ai");
    }
}
