//! Error types for the GPU rental market pipeline.

use crate::types::Side;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the analytics pipeline.
///
/// Empty joins and empty aggregation groups are not errors; those surface
/// as `Option`/omitted groups at the call site.
#[derive(Error, Debug)]
pub enum Error {
    /// No input batches (or no surviving rows) for one side.
    /// Fatal for a run: matching requires both sides.
    #[error("no {0} observations available")]
    SourceUnavailable(Side),

    /// A row failed schema validation at the load boundary.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// Per-unit price derivation guard: configuration size must be positive.
    #[error("config size must be positive for per-unit pricing, got {0}")]
    InvalidConfigSize(u32),

    /// Invalid pipeline configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A per-unit discount was requested but no size-1 baseline exists.
    #[error("no size-1 observations to use as a per-unit baseline")]
    NoBaseline,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a malformed-record error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedRecord(msg.into())
    }

    /// Create a configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }
}
