use thiserror::Error;

/// Errors that can occur within the scheduling and execution core.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The schedule expression could not be parsed. Non-fatal at reload
    /// time: the offending task is excluded, all others proceed.
    #[error("invalid schedule expression: {0}")]
    InvalidSchedule(String),

    /// No task with the given id exists in the store.
    #[error("task not found: {id}")]
    TaskNotFound { id: i64 },

    /// The task has no command to run. Recorded in the log before failing.
    #[error("empty command")]
    EmptyCommand,

    /// The shell command could not be launched or exited non-zero.
    #[error("command failed: {0}")]
    CommandFailed(String),

    /// The task store rejected an operation.
    #[error("store error: {0}")]
    Store(#[from] chronod_store::StoreError),

    /// Log directory or file could not be created/opened; aborts the one
    /// run being attempted, nothing else.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
