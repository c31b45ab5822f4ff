//! Error types for the runner module.

use thiserror::Error;

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors that can occur while launching or supervising the external binary.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Binary not found on PATH: {0}")]
    BinaryNotFound(String),

    #[error("Failed to start {binary}: {reason}")]
    SpawnFailed { binary: String, reason: String },

    #[error("{command} command failed with exit code {exit_code}: {last_stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        last_stderr: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
