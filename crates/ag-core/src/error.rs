//! Error types for ag-core

use thiserror::Error;

/// Main error type for ag-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported flow: {0}")]
    UnsupportedFlow(String),

    #[error("Operation timed out: {0}")]
    OperationTimeout(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

/// Result type alias for ag-core
pub type Result<T> = std::result::Result<T, Error>;
