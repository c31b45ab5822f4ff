//! Process runner trait and types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RunnerResult;
use crate::options::TerragruntOptions;

/// Result of a finished (or dry-run) process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Command line that was (or would have been) executed
    pub command_line: String,
    /// Exit code from the process
    pub exit_code: i32,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Duration in milliseconds
    pub duration_ms: u64,
    /// True when nothing was spawned
    pub dry_run: bool,
}

impl ExecutionResult {
    /// Check if execution was successful (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Last non-empty stderr line, used in failure messages.
    pub fn last_stderr_line(&self) -> &str {
        self.stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("no error output")
    }
}

/// Something that can launch the infrastructure binary.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Check whether the binary can be launched at all.
    async fn is_available(&self, binary: &str) -> bool;

    /// Run the command described by `options`, streaming its output.
    ///
    /// A non-zero exit is returned as [`crate::RunnerError::CommandFailed`].
    async fn run(&self, options: &TerragruntOptions) -> RunnerResult<ExecutionResult>;
}
