//! Error types for tabfeed
//!
//! Only the capture parsing surface returns errors. Filtering inside the
//! normalizer never does: a raw notice that fails a precondition is dropped
//! silently, which is normal operation rather than a fault.

use thiserror::Error;

/// Errors that can occur while loading recorded notices
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Failed to parse raw notice: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}
