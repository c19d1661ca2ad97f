//! Error types for the remarkable_cloud crate.

use thiserror::Error;

/// Errors that can occur when talking to the document storage service.
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Unexpected response from service: {0}")]
    Protocol(String),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Inconsistent metadata: {0}")]
    Consistency(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to package document: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Failed to format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// Result type alias for CloudError.
pub type Result<T> = std::result::Result<T, CloudError>;
