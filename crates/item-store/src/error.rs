use thiserror::Error;

/// Errors that can occur when interacting with the item store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated on insert or update.
    #[error("Conflicting item: {0}")]
    Conflict(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The backing storage refused the operation.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type for item store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
