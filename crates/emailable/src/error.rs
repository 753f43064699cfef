//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
///
/// A lookup that finds nothing is a normal `None` result, never an error.
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error (JSON metadata column).
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A stored timestamp column could not be parsed.
    #[error("Timestamp error: {0}")]
    Timestamp(#[from] chrono::ParseError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
