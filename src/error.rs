//! Error types for the settings subsystem

use thiserror::Error;

/// Main error type for the settings subsystem
#[derive(Error, Debug)]
pub enum Error {
    /// Authoritative store error
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors raised by the authoritative settings store
#[derive(Error, Debug)]
pub enum SourceError {
    /// Store cannot be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Requested document not found
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Caller lacks permission for the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
