//! Error types for mstviz

use thiserror::Error;

/// Result type alias for mstviz operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or rendering a diagram
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A block that is neither a tree node, a commit nor a record.
    #[error("Unrecognized block {cid}: {block}")]
    UnrecognizedBlock { cid: String, block: String },

    #[error("Malformed block {cid}: {reason}")]
    MalformedBlock { cid: String, reason: String },

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Render error: {0}")]
    Render(String),
}
