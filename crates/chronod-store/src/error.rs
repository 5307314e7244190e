use thiserror::Error;

/// Errors that can occur during task store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No task with the given id exists.
    #[error("task not found: {id}")]
    NotFound { id: i64 },

    /// A SQLite operation failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
