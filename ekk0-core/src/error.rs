//! Error types for the ekk0 core library.
//!
//! The simulation itself never fails: invalid commands are silent no-ops and
//! death is an ordinary state. Errors only surface at the persistence and
//! configuration boundaries, where callers convert them to safe defaults.

use thiserror::Error;

/// Top-level error type for all ekk0 core operations.
#[derive(Error, Debug)]
pub enum Ekk0Error {
    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored snapshot exists but cannot be used.
    #[error("Malformed snapshot for visitor {visitor}: {reason}")]
    Snapshot {
        /// Visitor whose snapshot was rejected.
        visitor: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Ekk0Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, Ekk0Error>;
