//! Error types for snapshot storage.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while loading or saving snapshots.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No snapshot has been stored yet.
    #[error("no snapshot stored")]
    Missing,

    /// The stored snapshot does not decode.
    #[error("snapshot corrupted: {0}")]
    Corrupted(serde_json::Error),

    /// The state could not be serialized.
    #[error("snapshot encoding failed: {0}")]
    Encode(serde_json::Error),

    /// The backend refused the operation.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}
