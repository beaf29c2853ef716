//! Error types for the appraisal scoring engine
//!
//! This module provides structured error handling using thiserror for
//! error definitions and anyhow for error propagation at the boundary.

use thiserror::Error;

/// Main error type for appraisal engine operations
#[derive(Error, Debug)]
pub enum AppraisalError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Schema migration failed
    #[error("Migration error: {0}")]
    Migration(String),

    /// Input rejected before any write (bad rating value, empty weight set, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Snapshot not found
    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(String),

    /// Invalid entity ID format
    #[error("Invalid ID: {0}")]
    InvalidId(#[from] uuid::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

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

/// Result type alias for appraisal engine operations
pub type Result<T> = std::result::Result<T, AppraisalError>;

/// Convert anyhow::Error to AppraisalError
impl From<anyhow::Error> for AppraisalError {
    fn from(err: anyhow::Error) -> Self {
        AppraisalError::Other(err.to_string())
    }
}

impl From<libsql::Error> for AppraisalError {
    fn from(err: libsql::Error) -> Self {
        AppraisalError::Database(err.to_string())
    }
}
