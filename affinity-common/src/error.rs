//! Common error types for Affinity

use thiserror::Error;

/// Common result type for Affinity operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Affinity services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Stored JSON column could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for transient store failures a caller may retry with backoff.
    ///
    /// The engine never retries on its own.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Database(sqlx::Error::PoolTimedOut)
                | Error::Database(sqlx::Error::PoolClosed)
                | Error::Database(sqlx::Error::Io(_))
        )
    }
}
