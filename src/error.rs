// src/error.rs
//! Typed errors for the tracker core.
//!
//! The write path is total (malformed input is absorbed by the normalizer), so
//! only configuration and query-argument problems surface here. Outer layers
//! (config files, providers, the binary) use `anyhow` instead.

use thiserror::Error;

/// Errors raised by the tracker core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// The tracker was configured inconsistently (e.g. no categories).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A query received an argument outside its domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type TrackerResult<T> = Result<T, TrackerError>;
