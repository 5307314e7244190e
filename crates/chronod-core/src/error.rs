use thiserror::Error;

/// Errors raised while assembling the process-level configuration.
#[derive(Debug, Error)]
pub enum ChronodError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ChronodError>;
