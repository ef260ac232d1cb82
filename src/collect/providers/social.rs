// src/collect/providers/social.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use serde_json::{json, Map, Value};

use super::FeedSource;
use crate::collect::types::{SourceKind, SourceProvider};

/// Engagement counters copied into `metrics` when present.
const ENGAGEMENT_FIELDS: &[&str] = &["mentions", "upvotes", "likes", "shares", "comments", "score"];

/// Trending topics from a social platform, as a JSON array of trend objects
/// (or `{"trends": [...]}`). The platform name becomes each item's source.
pub struct SocialTrendProvider {
    platform: String,
    source: FeedSource,
}

impl SocialTrendProvider {
    pub fn from_fixture(platform: impl Into<String>, content: &str) -> Self {
        Self {
            platform: platform.into(),
            source: FeedSource::Fixture(content.to_string()),
        }
    }

    #[cfg(feature = "collect-http")]
    pub fn from_url(platform: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            source: FeedSource::http(url),
        }
    }

    fn parse_trends_from_str(&self, s: &str) -> Result<Vec<Value>> {
        let t0 = std::time::Instant::now();
        let doc: Value = serde_json::from_str(s)
            .with_context(|| format!("parsing {} trends json", self.platform))?;
        let trends = match doc {
            Value::Array(xs) => xs,
            Value::Object(mut m) => match m.remove("trends") {
                Some(Value::Array(xs)) => xs,
                _ => return Err(anyhow!("{}: expected a `trends` array", self.platform)),
            },
            _ => return Err(anyhow!("{}: expected a JSON array of trends", self.platform)),
        };

        let out: Vec<Value> = trends
            .into_iter()
            .filter(|t| !t.is_null())
            .map(|trend| self.wrap(trend))
            .collect();

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("collect_parse_ms").record(ms);
        counter!("collect_items_total").increment(out.len() as u64);
        Ok(out)
    }

    /// `{ source, type: "social_trend", content: trend }`, lifting the few
    /// fields the normalizer reads from the top level.
    fn wrap(&self, trend: Value) -> Value {
        let mut item = Map::new();
        item.insert("source".into(), json!(self.platform));
        item.insert("type".into(), json!("social_trend"));
        if let Some(obj) = trend.as_object() {
            let title = ["title", "name", "topic"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_str));
            if let Some(t) = title {
                item.insert("title".into(), json!(t));
            }
            for key in ["timestamp", "url", "keywords", "authors"] {
                if let Some(v) = obj.get(key) {
                    item.insert(key.into(), v.clone());
                }
            }
            let engagement: Map<String, Value> = ENGAGEMENT_FIELDS
                .iter()
                .filter_map(|k| obj.get(*k).filter(|v| v.is_number()).map(|v| (k.to_string(), v.clone())))
                .collect();
            if !engagement.is_empty() {
                item.insert("metrics".into(), Value::Object(engagement));
            }
        }
        item.insert("content".into(), trend);
        Value::Object(item)
    }
}

#[async_trait]
impl SourceProvider for SocialTrendProvider {
    async fn fetch_latest(&self) -> Result<Vec<Value>> {
        let body = self.source.body(&self.platform).await?;
        self.parse_trends_from_str(&body)
    }

    fn name(&self) -> &str {
        &self.platform
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Social
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::normalize;

    #[tokio::test]
    async fn wraps_each_trend() {
        let doc = r##"[
            { "name": "#LLMAgents", "text": "Everyone is building LLM agents", "mentions": 1200, "region": "us" },
            "plain string trend",
            null
        ]"##;
        let p = SocialTrendProvider::from_fixture("twitter", doc);
        let items = p.fetch_latest().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["type"], "social_trend");
        assert_eq!(items[0]["source"], "twitter");
        assert_eq!(items[0]["title"], "#LLMAgents");
        assert_eq!(items[0]["metrics"]["mentions"], 1200);
        assert_eq!(items[1]["content"], "plain string trend");

        let it = normalize(&items[0]);
        assert_eq!(it.content, "Everyone is building LLM agents");
        assert_eq!(it.metadata.impact_metrics.get("mentions"), Some(&1200.0));
        assert_eq!(p.kind(), SourceKind::Social);
    }

    #[tokio::test]
    async fn trends_envelope_is_accepted() {
        let p = SocialTrendProvider::from_fixture("reddit", r#"{ "trends": [{ "title": "RLHF" }] }"#);
        assert_eq!(p.fetch_latest().await.unwrap().len(), 1);

        let bad = SocialTrendProvider::from_fixture("reddit", r#"{ "data": 1 }"#);
        assert!(bad.fetch_latest().await.is_err());
    }
}
