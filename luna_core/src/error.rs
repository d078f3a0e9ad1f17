//! Error types for the luna_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for luna_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rejected input on a write path (lengths, dates, user ids)
    #[error("Validation error: {0}")]
    Validation(String),

    /// The persistence collaborator could not complete an operation
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl Error {
    /// Whether this error came from rejected input rather than the store
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
