// src/category.rs
//! Categorizer: assigns a [`NewsItem`] to one configured tracking category.
//!
//! Priority order:
//! 1. `metadata.category_hint` that exactly names a configured category wins.
//! 2. Otherwise every category counts how many of its distinct keywords occur
//!    (case-insensitive substring) in `title + " " + content`.
//! 3. Highest nonzero count wins; ties go to the earliest configured category.
//! 4. No hits → `None` (the item is discarded; this is not an error).

use serde::{Deserialize, Serialize};

use crate::item::NewsItem;

/// A named bucket items are tracked under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingCategory {
    pub name: String,
    /// Matched case-insensitively as substrings. Empty → catalog/name defaults.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Technology-oriented categories feed the emerging-technology view.
    #[serde(default)]
    pub technology: Option<bool>,
}

impl TrackingCategory {
    /// Category with catalog keywords (or the words of its own name).
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let keywords = default_keywords(&name);
        Self {
            technology: Some(is_technology_category(&name)),
            name,
            keywords,
        }
    }

    pub fn with_keywords<I, S>(name: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        Self {
            technology: Some(is_technology_category(&name)),
            name,
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_technology(&self) -> bool {
        self.technology
            .unwrap_or_else(|| is_technology_category(&self.name))
    }

    /// Fill in defaults for fields a config file left out.
    pub(crate) fn resolved(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.keywords = self
            .keywords
            .into_iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        if self.keywords.is_empty() {
            self.keywords = default_keywords(&self.name);
        }
        if self.technology.is_none() {
            self.technology = Some(is_technology_category(&self.name));
        }
        self
    }
}

/// The tracker's default category set.
pub fn default_categories() -> Vec<TrackingCategory> {
    [
        "research_papers",
        "product_launches",
        "company_news",
        "policy_updates",
        "technical_breakthroughs",
    ]
    .into_iter()
    .map(TrackingCategory::named)
    .collect()
}

/// Built-in keyword catalog; unknown names fall back to their own words.
pub fn default_keywords(name: &str) -> Vec<String> {
    let known: &[&str] = match name {
        "research_papers" => &[
            "paper", "arxiv", "preprint", "we propose", "we present", "dataset", "benchmark",
            "neurips", "icml", "iclr", "study", "researchers",
        ],
        "product_launches" => &[
            "launch", "release", "available", "rollout", "introduces", "unveils", "announces",
            "beta", "api access", "waitlist",
        ],
        "company_news" => &[
            "funding", "raises", "acquisition", "acquires", "valuation", "ceo", "partnership",
            "layoffs", "revenue", "startup", "ipo", "investment",
        ],
        "policy_updates" => &[
            "regulation", "policy", "legislation", "lawmakers", "government", "compliance", "senate",
            "eu ai act", "executive order", "safety institute",
        ],
        "technical_breakthroughs" => &[
            "breakthrough", "state-of-the-art", "sota", "record", "first ever", "outperforms",
            "surpasses", "milestone", "novel architecture",
        ],
        "large_language_models" => &[
            "llm", "language model", "gpt", "transformer", "chatbot", "prompt", "tokens",
            "fine-tuning", "claude", "gemini", "llama",
        ],
        "computer_vision" => &[
            "vision", "image", "video", "object detection", "segmentation", "diffusion",
            "multimodal", "camera",
        ],
        "reinforcement_learning" => &[
            "reinforcement learning", "reward model", "policy gradient", "agent", "robotics",
            "self-play", "rlhf",
        ],
        "ai_ethics" => &[
            "ethics", "bias", "fairness", "alignment", "safety", "misinformation", "deepfake",
            "privacy", "transparency",
        ],
        "ai_infrastructure" => &[
            "gpu", "chip", "datacenter", "data center", "cluster", "inference", "compute",
            "nvidia", "tpu", "accelerator",
        ],
        _ => &[],
    };
    if !known.is_empty() {
        return known.iter().map(|k| k.to_string()).collect();
    }
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 1)
        .map(str::to_lowercase)
        .collect()
}

fn is_technology_category(name: &str) -> bool {
    !matches!(name, "company_news" | "policy_updates" | "ai_ethics")
}

/// Stateless categorizer over a fixed, ordered category list.
#[derive(Debug, Clone)]
pub struct Categorizer {
    categories: Vec<TrackingCategory>,
}

impl Categorizer {
    pub fn new(categories: Vec<TrackingCategory>) -> Self {
        Self {
            categories: categories.into_iter().map(TrackingCategory::resolved).collect(),
        }
    }

    pub fn categories(&self) -> &[TrackingCategory] {
        &self.categories
    }

    pub fn categorize(&self, item: &NewsItem) -> Option<String> {
        let hint = item.metadata.category_hint.as_str();
        if !hint.is_empty() {
            if let Some(c) = self.categories.iter().find(|c| c.name == hint) {
                return Some(c.name.clone());
            }
        }

        let text = item.searchable_text().to_lowercase();
        let mut best: Option<(&TrackingCategory, usize)> = None;
        for c in &self.categories {
            let hits = keyword_hits(&text, &c.keywords);
            // Strictly greater keeps the earliest category on ties.
            if hits > 0 && best.map_or(true, |(_, b)| hits > b) {
                best = Some((c, hits));
            }
        }
        best.map(|(c, _)| c.name.clone())
    }
}

/// Number of distinct keywords present in already-lowercased `text`.
fn keyword_hits(text: &str, keywords: &[String]) -> usize {
    let mut seen: Vec<&str> = Vec::with_capacity(keywords.len());
    for k in keywords {
        let k = k.as_str();
        if !k.is_empty() && !seen.contains(&k) && text.contains(k) {
            seen.push(k);
        }
    }
    seen.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::normalize;
    use serde_json::json;

    fn categorizer() -> Categorizer {
        Categorizer::new(default_categories())
    }

    #[test]
    fn exact_hint_wins() {
        let it = normalize(&json!({
            "title": "Startup raises funding",
            "category_hint": "research_papers"
        }));
        assert_eq!(categorizer().categorize(&it).as_deref(), Some("research_papers"));
    }

    #[test]
    fn unknown_hint_falls_back_to_keywords() {
        let it = normalize(&json!({
            "title": "Startup raises funding after acquisition talks",
            "category_hint": "finance"
        }));
        assert_eq!(categorizer().categorize(&it).as_deref(), Some("company_news"));
    }

    #[test]
    fn ties_go_to_earliest_category() {
        let c = Categorizer::new(vec![
            TrackingCategory::with_keywords("first", ["alpha"]),
            TrackingCategory::with_keywords("second", ["beta"]),
        ]);
        let it = normalize(&json!({ "title": "Alpha and BETA" }));
        assert_eq!(c.categorize(&it).as_deref(), Some("first"));
    }

    #[test]
    fn no_hits_discards() {
        let it = normalize(&json!({ "title": "Weather is nice today" }));
        assert!(categorizer().categorize(&it).is_none());
    }

    #[test]
    fn repeated_keyword_counts_once() {
        let c = Categorizer::new(vec![
            TrackingCategory::with_keywords("a", ["gpu"]),
            TrackingCategory::with_keywords("b", ["chip", "cluster"]),
        ]);
        let it = normalize(&json!({ "content": "gpu gpu gpu on a chip cluster" }));
        assert_eq!(c.categorize(&it).as_deref(), Some("b"));
    }

    #[test]
    fn unknown_name_uses_own_words() {
        assert_eq!(default_keywords("quantum_computing"), vec!["quantum", "computing"]);
        let c = Categorizer::new(vec![TrackingCategory {
            name: "quantum_computing".into(),
            keywords: vec![],
            technology: None,
        }]);
        assert!(c.categories()[0].is_technology());
        let it = normalize(&json!({ "title": "Quantum advantage claimed" }));
        assert_eq!(c.categorize(&it).as_deref(), Some("quantum_computing"));
    }

    #[test]
    fn categorization_is_deterministic() {
        let c = categorizer();
        let it = normalize(&json!({ "title": "EU AI Act regulation and a new LLM launch" }));
        let first = c.categorize(&it);
        for _ in 0..10 {
            assert_eq!(c.categorize(&it), first);
        }
    }
}
