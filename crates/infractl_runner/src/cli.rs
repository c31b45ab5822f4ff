//! Subprocess runner for the Terragrunt CLI.
//!
//! The child's stdout and stderr are drained by two tasks that forward each
//! line to the parent's matching stream as soon as it arrives.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::{RunnerError, RunnerResult};
use crate::options::TerragruntOptions;
use crate::runner::{ExecutionResult, ProcessRunner};

/// One line of child output.
#[derive(Debug, Clone)]
pub struct LogLine {
    pub timestamp: chrono::DateTime<Utc>,
    pub stream: LogStream,
    pub message: String,
}

/// Log stream type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    Stdout,
    Stderr,
}

impl std::fmt::Display for LogStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout => write!(f, "stdout"),
            Self::Stderr => write!(f, "stderr"),
        }
    }
}

/// Log handler callback type.
pub type LogHandler = Arc<dyn Fn(LogLine) + Send + Sync>;

/// CLI runner options.
#[derive(Debug, Clone)]
pub struct CliRunnerOptions {
    /// Dry-run mode (log commands without executing)
    pub dry_run: bool,
    /// CI mode (timestamp and stream prefix on every line)
    pub ci_mode: bool,
}

impl Default for CliRunnerOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            ci_mode: std::env::var("CI").is_ok(),
        }
    }
}

impl CliRunnerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn ci_mode(mut self) -> Self {
        self.ci_mode = true;
        self
    }
}

/// Runs the real binary as a child process.
pub struct CliRunner {
    options: CliRunnerOptions,
    log_handler: Option<LogHandler>,
}

impl CliRunner {
    pub fn new(options: CliRunnerOptions) -> Self {
        Self {
            options,
            log_handler: None,
        }
    }

    /// Set a log handler that receives every line of child output.
    pub fn with_log_handler(mut self, handler: LogHandler) -> Self {
        self.log_handler = Some(handler);
        self
    }

    /// Check if dry-run mode is enabled.
    pub fn is_dry_run(&self) -> bool {
        self.options.dry_run
    }

    /// Locate `binary` on PATH.
    pub fn resolve_binary(binary: &str) -> RunnerResult<PathBuf> {
        which::which(binary).map_err(|_| RunnerError::BinaryNotFound(binary.to_string()))
    }

    fn spawn_forwarder<R>(&self, reader: R, stream: LogStream) -> JoinHandle<String>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let ci_mode = self.options.ci_mode;
        let handler = self.log_handler.clone();

        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut buf = Vec::new();
            let mut captured = String::new();

            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf).await {
                    Ok(0) => break,
                    Ok(_) => {
                        let text = String::from_utf8_lossy(&buf);
                        let message = text.trim_end_matches(['\n', '\r']).to_string();
                        captured.push_str(&message);
                        captured.push('\n');

                        let line = LogLine {
                            timestamp: Utc::now(),
                            stream,
                            message,
                        };
                        emit(&line, ci_mode);
                        if let Some(handler) = &handler {
                            handler(line);
                        }
                    }
                    Err(e) => {
                        warn!("Stopped reading child {}: {}", stream, e);
                        break;
                    }
                }
            }

            captured
        })
    }
}

fn emit(line: &LogLine, ci_mode: bool) {
    if ci_mode {
        let prefixed = format!(
            "[{}] [{}] {}",
            line.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            line.stream,
            line.message
        );
        match line.stream {
            LogStream::Stdout => println!("{prefixed}"),
            LogStream::Stderr => eprintln!("{prefixed}"),
        }
    } else {
        match line.stream {
            LogStream::Stdout => println!("{}", line.message),
            LogStream::Stderr => eprintln!("{}", line.message),
        }
    }
}

#[async_trait]
impl ProcessRunner for CliRunner {
    async fn is_available(&self, binary: &str) -> bool {
        Self::resolve_binary(binary).is_ok()
    }

    async fn run(&self, options: &TerragruntOptions) -> RunnerResult<ExecutionResult> {
        let command_line = options.command_line();
        let workdir = options.effective_working_dir();

        info!("Running: {}", command_line);
        debug!("Working directory: {}", workdir.display());

        if self.options.dry_run {
            info!("[DRY-RUN] Would execute in {}: {}", workdir.display(), command_line);
            for key in options.env.keys() {
                info!("[DRY-RUN] With environment variable {}", key);
            }
            let now = Utc::now();
            return Ok(ExecutionResult {
                command_line,
                exit_code: 0,
                stdout: String::new(),
                stderr: String::new(),
                started_at: now,
                finished_at: now,
                duration_ms: 0,
                dry_run: true,
            });
        }

        let spawn_failed = |reason: String| RunnerError::SpawnFailed {
            binary: options.binary.clone(),
            reason,
        };

        let binary = Self::resolve_binary(&options.binary)
            .map_err(|e| spawn_failed(e.to_string()))?;

        let mut child = Command::new(&binary)
            .args(options.build_args())
            .current_dir(workdir)
            .envs(&options.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| spawn_failed(e.to_string()))?;

        let started_at = Utc::now();

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| spawn_failed("stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| spawn_failed("stderr was not captured".to_string()))?;

        let stdout_task = self.spawn_forwarder(stdout, LogStream::Stdout);
        let stderr_task = self.spawn_forwarder(stderr, LogStream::Stderr);

        let status = child.wait().await?;
        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();

        let finished_at = Utc::now();
        let duration_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;
        let exit_code = status.code().unwrap_or(-1);

        let result = ExecutionResult {
            command_line,
            exit_code,
            stdout,
            stderr,
            started_at,
            finished_at,
            duration_ms,
            dry_run: false,
        };

        if !result.success() {
            error!(
                "{} failed with exit code {} after {}ms",
                options.command, exit_code, duration_ms
            );
            return Err(RunnerError::CommandFailed {
                command: options.command.clone(),
                exit_code,
                last_stderr: result.last_stderr_line().to_string(),
            });
        }

        info!("{} completed successfully in {}ms", options.command, duration_ms);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ci_mode_builder() {
        let options = CliRunnerOptions::new().ci_mode().dry_run();
        assert!(options.ci_mode);
        assert!(options.dry_run);
    }

    #[test]
    fn test_missing_binary_not_resolved() {
        let err = CliRunner::resolve_binary("infractl-definitely-not-a-binary").unwrap_err();
        assert!(matches!(err, RunnerError::BinaryNotFound(_)));
    }

    #[tokio::test]
    async fn test_dry_run_does_not_spawn() {
        let runner = CliRunner::new(CliRunnerOptions::new().dry_run());
        let options = TerragruntOptions::new("plan")
            .binary("infractl-definitely-not-a-binary")
            .non_interactive();

        let result = runner.run(&options).await.unwrap();
        assert!(result.dry_run);
        assert!(result.success());
        assert_eq!(
            result.command_line,
            "infractl-definitely-not-a-binary plan --terragrunt-non-interactive"
        );
    }
}
