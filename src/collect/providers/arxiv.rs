// src/collect/providers/arxiv.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{scrub_html_entities_for_xml, FeedSource};
use crate::collect::types::{SourceKind, SourceProvider};
use crate::item::clean_html;

pub const ARXIV_SOURCE: &str = "arxiv";

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    id: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    published: Option<String>,
    updated: Option<String>,
    #[serde(rename = "author", default)]
    author: Vec<Author>,
    #[serde(rename = "link", default)]
    link: Vec<Link>,
    #[serde(rename = "category", default)]
    category: Vec<Category>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Category {
    #[serde(rename = "@term")]
    term: Option<String>,
}

/// Readable topic for the narrower arXiv subject classes. Umbrella classes
/// (cs.AI, cs.LG, stat.ML) tag most of the feed and would link unrelated papers.
fn subject_topic(term: &str) -> Option<&'static str> {
    Some(match term {
        "cs.CL" => "language model",
        "cs.CV" => "computer vision",
        "cs.RO" => "robotics",
        "cs.NE" => "neural networks",
        _ => return None,
    })
}

/// Research papers from an arXiv Atom query feed.
pub struct ArxivAtomProvider {
    source: FeedSource,
}

impl ArxivAtomProvider {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            source: FeedSource::Fixture(s.to_string()),
        }
    }

    #[cfg(feature = "collect-http")]
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            source: FeedSource::http(url),
        }
    }

    fn parse_entries_from_str(s: &str) -> Result<Vec<Value>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(s);
        let feed: Feed = from_str(&xml_clean).context("parsing arxiv atom xml")?;

        let mut out = Vec::with_capacity(feed.entry.len());
        for e in feed.entry {
            let title = clean_html(e.title.as_deref().unwrap_or_default());
            if title.is_empty() {
                continue;
            }
            let url = e
                .link
                .iter()
                .find(|l| l.rel.as_deref().map_or(true, |r| r == "alternate"))
                .and_then(|l| l.href.clone())
                .or(e.id)
                .unwrap_or_default();
            let authors: Vec<String> = e.author.into_iter().filter_map(|a| a.name).collect();
            let mut keywords: Vec<String> = Vec::new();
            for topic in e
                .category
                .iter()
                .filter_map(|c| c.term.as_deref())
                .filter_map(subject_topic)
            {
                if !keywords.iter().any(|k| k == topic) {
                    keywords.push(topic.to_string());
                }
            }

            out.push(json!({
                "title": title,
                "source": ARXIV_SOURCE,
                "timestamp": e.published.or(e.updated),
                "content": clean_html(e.summary.as_deref().unwrap_or_default()),
                "url": url,
                "metadata": {
                    "authors": authors,
                    "keywords": keywords,
                    "category_hint": "research_papers",
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
impl SourceProvider for ArxivAtomProvider {
    async fn fetch_latest(&self) -> Result<Vec<Value>> {
        let body = self.source.body(ARXIV_SOURCE).await?;
        Self::parse_entries_from_str(&body)
    }

    fn name(&self) -> &str {
        ARXIV_SOURCE
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Research
    }
}
