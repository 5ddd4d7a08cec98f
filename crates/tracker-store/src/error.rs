//! Store error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing a document.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error.
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document could not be (de)serialized.
    #[error("json error on {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
