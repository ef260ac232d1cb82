// src/collect/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Broad family a provider belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Research,
    News,
    Social,
}

/// A feed of raw items. Output is handed to the normalizer as-is.
#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<Value>>;
    fn name(&self) -> &str;
    fn kind(&self) -> SourceKind;
}
