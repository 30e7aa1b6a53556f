//! Error types for Strata
//!
//! Provides a unified error type for all operations. "Not found" and
//! "duplicate key" are not errors: they surface as `Ok(false)` / `Ok(None)`.

use thiserror::Error;

/// Result type alias using StrataError
pub type Result<T> = std::result::Result<T, StrataError>;

/// Unified error type for Strata operations
#[derive(Debug, Error)]
pub enum StrataError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Segment corruption in {segment} at byte {offset}: {reason}")]
    Corruption {
        segment: String,
        offset: u64,
        reason: String,
    },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    // -------------------------------------------------------------------------
    // Index Errors
    // -------------------------------------------------------------------------
    #[error("B+ tree invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Schema / Input Errors
    // -------------------------------------------------------------------------
    #[error("Schema mismatch: expected {expected} fields, got {actual}")]
    SchemaMismatch { expected: usize, actual: usize },

    #[error("Field '{field}' exceeds the fixed width of {width} bytes")]
    FieldTooLong { field: String, width: usize },

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    // -------------------------------------------------------------------------
    // Catalog Errors
    // -------------------------------------------------------------------------
    #[error("Catalog error: {0}")]
    Catalog(String),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Parse error: {0}")]
    Parse(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for StrataError {
    fn from(err: bincode::Error) -> Self {
        StrataError::Serialization(err.to_string())
    }
}

impl StrataError {
    /// True for errors caused by the command itself rather than by the
    /// files underneath; a script keeps running after these.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            StrataError::SchemaMismatch { .. }
                | StrataError::FieldTooLong { .. }
                | StrataError::InvalidField(_)
                | StrataError::InvalidName(_)
                | StrataError::Catalog(_)
                | StrataError::Parse(_)
                | StrataError::Config(_)
        )
    }
}
