// src/collect/providers/rss.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use super::{scrub_html_entities_for_xml, FeedSource};
use crate::collect::types::{SourceKind, SourceProvider};
use crate::item::clean_html;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    author: Option<String>,
    #[serde(rename = "category", default)]
    category: Vec<String>,
}

/// RFC 2822 → unix seconds; `None` when the feed date is unusable.
fn parse_rfc2822_to_unix(ts: &str) -> Option<i64> {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
}

/// News articles from an RSS 2.0 feed; `name` becomes each item's source.
pub struct RssNewsProvider {
    name: String,
    source: FeedSource,
}

impl RssNewsProvider {
    pub fn from_fixture(name: impl Into<String>, content: &str) -> Self {
        Self {
            name: name.into(),
            source: FeedSource::Fixture(content.to_string()),
        }
    }

    #[cfg(feature = "collect-http")]
    pub fn from_url(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: FeedSource::http(url),
        }
    }

    fn parse_items_from_str(&self, s: &str) -> Result<Vec<Value>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean)
            .with_context(|| format!("parsing {} rss xml", self.name))?;

        let mut out = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            let title = clean_html(it.title.as_deref().unwrap_or_default());
            let content = clean_html(it.description.as_deref().unwrap_or_default());
            if title.is_empty() && content.is_empty() {
                continue;
            }
            let keywords: Vec<String> = it
                .category
                .iter()
                .map(|c| clean_html(c))
                .filter(|c| !c.is_empty())
                .collect();

            out.push(json!({
                "title": title,
                "source": self.name,
                "timestamp": it.pub_date.as_deref().and_then(parse_rfc2822_to_unix),
                "content": content,
                "url": it.link.unwrap_or_default(),
                "metadata": {
                    "authors": it.author.into_iter().collect::<Vec<_>>(),
                    "keywords": keywords,
                }
            }));
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("collect_parse_ms").record(ms);
        counter!("collect_items_total").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for RssNewsProvider {
    async fn fetch_latest(&self) -> Result<Vec<Value>> {
        let body = self.source.body(&self.name).await?;
        self.parse_items_from_str(&body)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::News
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>AI Wire</title>
    <item>
      <title>Anthropic raises &lt;b&gt;new&lt;/b&gt; funding</title>
      <link>https://example.com/a</link>
      <pubDate>Tue, 01 Apr 2025 09:30:00 +0000</pubDate>
      <description>&lt;p&gt;The round values the startup&nbsp;at $60B.&lt;/p&gt;</description>
      <category>Funding</category>
      <category>Startups</category>
    </item>
    <item>
      <title>Undated item</title>
      <pubDate>sometime</pubDate>
    </item>
  </channel>
</rss>"#;

    #[tokio::test]
    async fn parses_items_and_cleans_markup() {
        let p = RssNewsProvider::from_fixture("ai-wire", FEED);
        let items = p.fetch_latest().await.unwrap();
        assert_eq!(items.len(), 2);

        let a = &items[0];
        assert_eq!(a["source"], "ai-wire");
        assert_eq!(a["title"], "Anthropic raises new funding");
        assert_eq!(a["content"], "The round values the startup at $60B.");
        assert_eq!(a["timestamp"], 1_743_499_800);
        assert_eq!(a["metadata"]["keywords"], json!(["Funding", "Startups"]));

        // Unparseable dates are left for the normalizer to default.
        assert!(items[1]["timestamp"].is_null());
        assert_eq!(p.kind(), SourceKind::News);
    }

    #[test]
    fn rfc2822_dates() {
        assert_eq!(
            parse_rfc2822_to_unix("Tue, 01 Apr 2025 09:30:00 +0000"),
            Some(1_743_499_800)
        );
        assert_eq!(parse_rfc2822_to_unix("not a date"), None);
    }
}
