//! Storage error types.

use thiserror::Error;

/// Errors that can occur in a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value could not be decoded into its domain type.
    #[error("corrupt row: column {column} holds unexpected value {value:?}")]
    Decode {
        column: &'static str,
        value: String,
    },
}

/// Convenience type alias for storage results.
pub type Result<T> = std::result::Result<T, StoreError>;
