// src/item.rs
//! Item normalizer: raw provider payloads → canonical [`NewsItem`].
//!
//! Providers hand us arbitrary JSON. Normalization never fails: missing or
//! malformed fields fall back to defaults, so any value (even `null`) yields a
//! well-formed item. Metadata is read from a nested `metadata` object first and
//! then from the top level, accepting the collector vocabulary
//! (`category`, `metrics`, `related`) next to the canonical names.
//!
//! Normalizing an item's own mapping (`NewsItem::to_raw`) returns the same item.

use chrono::{DateTime, Datelike, SecondsFormat, TimeZone, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

/// Maximum number of characters kept from `content`.
pub const CONTENT_CHAR_CAP: usize = 5_000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemMetadata {
    pub authors: Vec<String>,
    pub keywords: Vec<String>,
    /// Empty when the provider gave no hint.
    pub category_hint: String,
    pub impact_metrics: BTreeMap<String, f64>,
    pub related_topics: Vec<String>,
}

/// Canonical news record handed to the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub source: String,
    /// Publication time as reported by the provider (not processing time).
    pub timestamp: DateTime<Utc>,
    pub content: String,
    /// Empty when absent.
    pub url: String,
    pub metadata: ItemMetadata,
}

impl NewsItem {
    /// Re-express the item as the raw mapping shape the normalizer accepts.
    pub fn to_raw(&self) -> Value {
        json!({
            "title": self.title,
            "source": self.source,
            "timestamp": self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            "content": self.content,
            "url": self.url,
            "metadata": {
                "authors": self.metadata.authors,
                "keywords": self.metadata.keywords,
                "category_hint": self.metadata.category_hint,
                "impact_metrics": self.metadata.impact_metrics,
                "related_topics": self.metadata.related_topics,
            }
        })
    }

    /// Stable identity over the lowercased title and url (hex SHA-256).
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(self.title.to_lowercase().as_bytes());
        hasher.update([0u8]);
        hasher.update(self.url.trim().as_bytes());
        hex(&hasher.finalize())
    }

    /// `title + " " + content`, the text categorization and scoring look at.
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }
}

/// Short anonymized id for logs; raw text is never logged.
pub fn anon_id(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    hex(&digest[..6])
}

fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Normalize with the current time as the default timestamp.
pub fn normalize(raw: &Value) -> NewsItem {
    normalize_at(raw, Utc::now())
}

/// Normalize using `now` when the payload carries no usable timestamp.
pub fn normalize_at(raw: &Value, now: DateTime<Utc>) -> NewsItem {
    let empty = Map::new();
    let top = raw.as_object().unwrap_or(&empty);
    let nested = top
        .get("metadata")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let meta = |names: &[&str]| lookup(nested, top, names);

    let metadata = ItemMetadata {
        authors: meta(&["authors"]).map(string_list).unwrap_or_default(),
        keywords: meta(&["keywords"]).map(string_list).unwrap_or_default(),
        category_hint: meta(&["category_hint", "category"])
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
        impact_metrics: meta(&["impact_metrics", "metrics"])
            .map(metric_map)
            .unwrap_or_default(),
        related_topics: meta(&["related_topics", "related"])
            .map(string_list)
            .unwrap_or_default(),
    };

    NewsItem {
        title: top
            .get("title")
            .map(flatten_text)
            .map(|s| clean_text(&s))
            .unwrap_or_default(),
        source: top
            .get("source")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
        timestamp: top
            .get("timestamp")
            .and_then(parse_timestamp)
            .unwrap_or(now),
        content: top
            .get("content")
            .map(flatten_text)
            .map(|s| cap_chars(clean_text(&s), CONTENT_CHAR_CAP))
            .unwrap_or_default(),
        url: top
            .get("url")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
        metadata,
    }
}

/// Nested metadata wins over top-level fields; first matching alias wins.
fn lookup<'a>(nested: &'a Map<String, Value>, top: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .find_map(|n| nested.get(*n).filter(|v| !v.is_null()))
        .or_else(|| names.iter().find_map(|n| top.get(*n).filter(|v| !v.is_null())))
}

/// Strip HTML tags and collapse whitespace. Idempotent on its own output.
pub fn clean_text(s: &str) -> String {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[a-z][^>]*>").expect("tag regex"));
    let out = re_tags.replace_all(s, " ");
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode HTML entities, then clean. Providers use this on markup-bearing feeds.
pub fn clean_html(s: &str) -> String {
    clean_text(&html_escape::decode_html_entities(s))
}

fn cap_chars(s: String, cap: usize) -> String {
    if s.chars().count() > cap {
        // A cut may leave trailing whitespace; trim keeps the output stable.
        s.chars().take(cap).collect::<String>().trim_end().to_string()
    } else {
        s
    }
}

/// Turn any JSON value into text. Social trend payloads arrive as objects.
fn flatten_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(xs) => xs
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" "),
        Value::Object(m) => ["text", "title", "name"]
            .iter()
            .find_map(|k| m.get(*k).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| v.to_string()),
    }
}

/// Sequence of strings; a bare string counts as a single entry.
fn string_list(v: &Value) -> Vec<String> {
    let raw: Vec<&str> = match v {
        Value::String(s) => vec![s.as_str()],
        Value::Array(xs) => xs.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    raw.into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn metric_map(v: &Value) -> BTreeMap<String, f64> {
    let Some(obj) = v.as_object() else {
        return BTreeMap::new();
    };
    obj.iter()
        .filter_map(|(k, v)| {
            let n = match v {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            }?;
            n.is_finite().then(|| (k.trim().to_string(), n))
        })
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

/// Unix values at or beyond this magnitude are epoch milliseconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// RFC 3339, RFC 2822, unix seconds or unix milliseconds.
/// Instants outside years 0..=9999 are rejected; RFC 3339 cannot express them.
pub fn parse_timestamp(v: &Value) -> Option<DateTime<Utc>> {
    let dt = match v {
        Value::Number(n) => match n.as_i64() {
            Some(i) => from_unix_int(i),
            None => from_unix_float(n.as_f64()?),
        },
        Value::String(s) => parse_timestamp_str(s),
        _ => None,
    }?;
    (0..=9999).contains(&dt.year()).then_some(dt)
}

fn from_unix_int(i: i64) -> Option<DateTime<Utc>> {
    if i.unsigned_abs() >= EPOCH_MILLIS_THRESHOLD as u64 {
        Utc.timestamp_millis_opt(i).single()
    } else {
        Utc.timestamp_opt(i, 0).single()
    }
}

fn from_unix_float(f: f64) -> Option<DateTime<Utc>> {
    if !f.is_finite() {
        return None;
    }
    let f = if f.abs() >= EPOCH_MILLIS_THRESHOLD as f64 {
        f / 1_000.0
    } else {
        f
    };
    let secs = f.floor();
    if secs.abs() >= EPOCH_MILLIS_THRESHOLD as f64 {
        return None;
    }
    let nanos = ((f - secs) * 1e9).round() as u32;
    Utc.timestamp_opt(secs as i64, nanos.min(999_999_999)).single()
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc2822) {
        return Utc
            .timestamp_opt(dt.unix_timestamp(), dt.nanosecond())
            .single();
    }
    s.parse::<i64>().ok().and_then(from_unix_int)
}

/// Distinct lowercased entries; used wherever metadata lists act as sets.
pub(crate) fn lower_set<'a, I>(items: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    items
        .into_iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn empty_mapping_gets_defaults() {
        let it = normalize_at(&json!({}), fixed_now());
        assert_eq!(it.title, "");
        assert_eq!(it.source, "");
        assert_eq!(it.timestamp, fixed_now());
        assert!(it.metadata.authors.is_empty());
        assert!(it.metadata.impact_metrics.is_empty());
    }

    #[test]
    fn non_object_input_is_absorbed() {
        let it = normalize_at(&json!([1, 2, 3]), fixed_now());
        assert_eq!(it.content, "");
        assert_eq!(it.timestamp, fixed_now());
    }

    #[test]
    fn collector_aliases_are_accepted() {
        let raw = json!({
            "title": "  GPT  <b>launch</b> ",
            "category": "product_launches",
            "metrics": { "stars": 1200, "citations": "35", "bogus": "n/a" },
            "related": "agents",
            "authors": ["OpenAI", " ", 7],
        });
        let it = normalize_at(&raw, fixed_now());
        assert_eq!(it.title, "GPT launch");
        assert_eq!(it.metadata.category_hint, "product_launches");
        assert_eq!(it.metadata.impact_metrics.len(), 2);
        assert_eq!(it.metadata.related_topics, vec!["agents".to_string()]);
        assert_eq!(it.metadata.authors, vec!["OpenAI".to_string()]);
    }

    #[test]
    fn nested_metadata_wins_over_top_level() {
        let raw = json!({
            "category": "company_news",
            "metadata": { "category_hint": "research_papers" }
        });
        let it = normalize_at(&raw, fixed_now());
        assert_eq!(it.metadata.category_hint, "research_papers");
    }

    #[test]
    fn timestamps_in_several_formats() {
        let a = parse_timestamp(&json!("2024-05-01T10:00:00Z")).unwrap();
        let b = parse_timestamp(&json!("Wed, 01 May 2024 10:00:00 +0000")).unwrap();
        let c = parse_timestamp(&json!(1_714_557_600)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert!(parse_timestamp(&json!("yesterday")).is_none());
    }

    #[test]
    fn epoch_millis_are_rescaled() {
        let secs = parse_timestamp(&json!(1_714_557_600)).unwrap();
        assert_eq!(parse_timestamp(&json!(1_714_557_600_000i64)), Some(secs));
        assert_eq!(parse_timestamp(&json!("1714557600000")), Some(secs));
        let half = parse_timestamp(&json!(1_714_557_600_500.0)).unwrap();
        assert_eq!(half.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn unrepresentable_years_fall_back_to_now() {
        // Nanosecond epochs land far past year 9999 even as milliseconds.
        let raw = json!({ "timestamp": 1_714_557_600_000_000_000i64 });
        let it = normalize_at(&raw, fixed_now());
        assert_eq!(it.timestamp, fixed_now());
        assert!(parse_timestamp(&json!("0000-01-01T00:00:00+01:00")).is_none());

        let raw = json!({ "timestamp": 1_714_557_600_000i64 });
        let once = normalize_at(&raw, fixed_now());
        assert_eq!(normalize(&once.to_raw()), once);
    }

    #[test]
    fn object_content_is_flattened() {
        let raw = json!({ "source": "reddit", "content": { "text": "LLM agents everywhere", "score": 5 } });
        let it = normalize_at(&raw, fixed_now());
        assert_eq!(it.content, "LLM agents everywhere");
    }

    #[test]
    fn normalization_is_idempotent() {
        let raw = json!({
            "title": "New   state-of-the-art model",
            "source": "arxiv",
            "timestamp": 1_714_557_600.25,
            "content": "<p>We present a breakthrough.</p>",
            "url": "https://arxiv.org/abs/1",
            "authors": ["A. Author", "B. Author"],
            "keywords": ["llm"],
            "metrics": { "citations": 3 },
        });
        let once = normalize_at(&raw, fixed_now());
        let twice = normalize(&once.to_raw());
        assert_eq!(once, twice);
    }

    #[test]
    fn content_is_capped() {
        let raw = json!({ "content": "x".repeat(CONTENT_CHAR_CAP + 100) });
        let it = normalize_at(&raw, fixed_now());
        assert_eq!(it.content.chars().count(), CONTENT_CHAR_CAP);
    }

    #[test]
    fn fingerprint_ignores_title_case() {
        let a = normalize_at(&json!({ "title": "Hello", "url": "u" }), fixed_now());
        let b = normalize_at(&json!({ "title": "HELLO", "url": "u" }), fixed_now());
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(anon_id("abc").len(), 12);
    }
}
