//! Error types for the todo service.

use std::time::Duration;

/// Top-level error type for the binary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Operation {operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },
}

impl DatabaseError {
    /// Shorthand for a missing todo row.
    pub fn todo_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: "todo".to_string(),
            id: id.to_string(),
        }
    }
}

/// Rejected client input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,

    #[error("date is required")]
    MissingDate,

    #[error("status is required")]
    MissingStatus,

    #[error("id must be positive, got {0}")]
    InvalidId(i64),

    #[error("malformed request: {0}")]
    Malformed(String),
}

/// Domain error taxonomy surfaced by the todo service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound,

    /// Success with nothing to show.
    #[error("empty content")]
    EmptyContent,

    #[error("internal error: {0}")]
    Internal(#[from] DatabaseError),
}

impl ServiceError {
    /// Translate a storage error, turning the distinguished "no rows"
    /// condition into [`ServiceError::NotFound`].
    pub fn from_storage(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { .. } => Self::NotFound,
            other => Self::Internal(other),
        }
    }
}

/// Result type alias for the binary.
pub type Result<T> = std::result::Result<T, Error>;
