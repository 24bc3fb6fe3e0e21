//! Error types for ag-api

use thiserror::Error;

/// ag-api error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication failed")]
    AuthFailed,

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Core error: {0}")]
    Core(#[from] ag_core::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ApiError>;
