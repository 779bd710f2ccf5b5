//! Error types for the Rapport engine
//!
//! Most of the pipeline never fails: malformed input degrades to neutral
//! defaults and arithmetic is guarded. The variants here cover the edges
//! that do touch the outside world (configuration, persistence) and the
//! state reconstruction that can reject a corrupt record.

use crate::config::ConfigError;
use thiserror::Error;

/// Main error type for Rapport operations
#[derive(Error, Debug)]
pub enum RapportError {
    /// Persisted profile could not be reconstructed
    #[error("Corrupt profile state: {0}")]
    State(String),

    /// No profile stored for the contact
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Rapport operations
pub type Result<T> = std::result::Result<T, RapportError>;

/// Convert anyhow::Error to RapportError
impl From<anyhow::Error> for RapportError {
    fn from(err: anyhow::Error) -> Self {
        RapportError::Other(err.to_string())
    }
}
