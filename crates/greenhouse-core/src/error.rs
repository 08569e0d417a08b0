//! Error types for greenhouse-core

use thiserror::Error;

/// Result type alias using greenhouse-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in greenhouse-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Key-value backend failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted queue blob exists but is not a valid record array
    #[error("Corrupt queue data: {0}")]
    Corrupt(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An observation with this id is already queued
    #[error("Duplicate observation id: {0}")]
    DuplicateId(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP transport error while uploading
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend rejected an upload
    #[error("Upload failed: {0}")]
    Upload(String),
}

impl Error {
    /// Whether retrying the same storage call might succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Io(_) | Self::LibSql(_))
    }
}
