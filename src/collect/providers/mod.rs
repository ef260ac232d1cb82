// src/collect/providers/mod.rs
pub mod arxiv;
pub mod rss;
pub mod social;

use anyhow::Result;
#[cfg(feature = "collect-http")]
use anyhow::Context;

pub use arxiv::ArxivAtomProvider;
pub use rss::RssNewsProvider;
pub use social::SocialTrendProvider;

/// Where a provider reads its document from.
pub(crate) enum FeedSource {
    // Own copy, so tests do not need a 'static str.
    Fixture(String),
    #[cfg(feature = "collect-http")]
    Http {
        url: String,
        client: reqwest::Client,
    },
}

impl FeedSource {
    #[cfg(feature = "collect-http")]
    pub(crate) fn http(url: impl Into<String>) -> Self {
        FeedSource::Http {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }

    #[cfg_attr(not(feature = "collect-http"), allow(unused_variables))]
    pub(crate) async fn body(&self, provider: &str) -> Result<String> {
        match self {
            FeedSource::Fixture(s) => Ok(s.clone()),

            #[cfg(feature = "collect-http")]
            FeedSource::Http { url, client } => {
                let resp = client
                    .get(url.as_str())
                    .send()
                    .await
                    .with_context(|| format!("{provider} http get()"))?;
                resp.error_for_status()
                    .with_context(|| format!("{provider} http status"))?
                    .text()
                    .await
                    .with_context(|| format!("{provider} http .text()"))
            }
        }
    }
}

/// Replace HTML-only entities that strict XML parsers reject.
pub(crate) fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}
