//! Error types for Magpie

use thiserror::Error;

/// Result type alias for Magpie operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Magpie operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error (missing credentials, bad config file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Version-control API error
    #[error("VCS error: {0}")]
    Vcs(String),

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Database error
    #[error("Database error: {0}")]
    Db(#[from] magpie_db::Error),

    /// Diff parse error
    #[error("Diff parse error: {0}")]
    DiffParse(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
