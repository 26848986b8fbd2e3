//! Error types for the shop-ledger library.
//!
//! This module provides custom error types using `thiserror` for better error
//! handling and more specific error messages throughout the application.

use thiserror::Error;

/// Errors that can occur in the shop-ledger application.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// A required field is missing or invalid
    #[error("Validation error: {0}")]
    Validation(String),

    /// An operation referenced a record that does not exist
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Record kind (client, job, event)
        kind: &'static str,
        /// The id that did not match any record
        id: i64,
    },

    /// A snapshot document could not be parsed
    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(#[from] serde_json::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Local store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid date format
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// CSV export errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Result with LedgerError
pub type Result<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    /// Shorthand for a client-not-found error
    #[must_use]
    pub const fn client_not_found(id: i64) -> Self {
        Self::NotFound { kind: "Client", id }
    }

    /// Shorthand for a job-not-found error
    #[must_use]
    pub const fn job_not_found(id: i64) -> Self {
        Self::NotFound { kind: "Job", id }
    }

    /// Shorthand for an event-not-found error
    #[must_use]
    pub const fn event_not_found(id: i64) -> Self {
        Self::NotFound { kind: "Event", id }
    }
}

impl From<anyhow::Error> for LedgerError {
    fn from(err: anyhow::Error) -> Self {
        LedgerError::Other(err.to_string())
    }
}

impl From<sled::Error> for LedgerError {
    fn from(err: sled::Error) -> Self {
        LedgerError::Storage(err.to_string())
    }
}
