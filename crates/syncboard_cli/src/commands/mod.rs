//! CLI command implementations.

pub mod seed;
pub mod serve;

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// A seed file could not be read.
    #[error("cannot read seed file {path}: {source}")]
    SeedRead {
        /// The seed file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A seed file is not a valid board.
    #[error("invalid seed file {path}: {source}")]
    SeedParse {
        /// The seed file.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// The server failed to start or stop.
    #[error(transparent)]
    Server(#[from] syncboard_server::ServerError),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON encoding error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
