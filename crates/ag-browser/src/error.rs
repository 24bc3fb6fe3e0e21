//! Error types for ag-browser

use thiserror::Error;

/// ag-browser error type
#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Browser initialization failed: {0}")]
    Initialization(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Interaction failed: {0}")]
    Interaction(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Session already closed")]
    Closed,
}

impl From<BrowserError> for ag_core::Error {
    fn from(err: BrowserError) -> Self {
        match err {
            BrowserError::Timeout(msg) => ag_core::Error::OperationTimeout(msg),
            other => ag_core::Error::Browser(other.to_string()),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, BrowserError>;
