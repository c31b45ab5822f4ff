//! Integration tests for the subprocess runner.
//!
//! A small shell script stands in for Terragrunt so the real spawn, stream
//! and exit-code paths are exercised.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::tempdir;

use infractl_runner::{
    CliRunner, CliRunnerOptions, LogLine, LogStream, ProcessRunner, RunnerError,
    TerragruntOptions,
};

fn fake_binary(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-terragrunt");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn runner_with_capture() -> (CliRunner, Arc<Mutex<Vec<LogLine>>>) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = lines.clone();
    let runner = CliRunner::new(CliRunnerOptions {
        dry_run: false,
        ci_mode: false,
    })
    .with_log_handler(Arc::new(move |line| sink.lock().push(line)));
    (runner, lines)
}

/// Arguments, working directory and child environment reach the process.
#[tokio::test]
async fn test_streams_args_env_and_workdir() {
    let temp = tempdir().unwrap();
    let workdir = temp.path().join("stack");
    fs::create_dir(&workdir).unwrap();
    let binary = fake_binary(
        temp.path(),
        r#"echo "args: $*"
echo "config: $INFRACTL_CONFIG_FILE_PATH"
echo "cwd: $(pwd)"
echo "warning line" >&2"#,
    );

    let (runner, lines) = runner_with_capture();
    let options = TerragruntOptions::new("plan")
        .binary(binary.display().to_string())
        .working_dir(&workdir)
        .non_interactive()
        .env("INFRACTL_CONFIG_FILE_PATH", "/tmp/compiled.json");

    let result = runner.run(&options).await.unwrap();

    assert!(result.success());
    assert!(result.stdout.contains("args: plan --terragrunt-non-interactive"));
    assert!(result.stdout.contains("config: /tmp/compiled.json"));
    let canonical = workdir.canonicalize().unwrap();
    assert!(result
        .stdout
        .lines()
        .any(|l| l == format!("cwd: {}", canonical.display()) || l == format!("cwd: {}", workdir.display())));
    assert_eq!(result.stderr.trim(), "warning line");

    let lines = lines.lock();
    assert!(lines
        .iter()
        .any(|l| l.stream == LogStream::Stderr && l.message == "warning line"));
    assert_eq!(
        lines.iter().filter(|l| l.stream == LogStream::Stdout).count(),
        3
    );
}

/// A non-zero exit surfaces the code and the last stderr line.
#[tokio::test]
async fn test_non_zero_exit_is_command_failed() {
    let temp = tempdir().unwrap();
    let binary = fake_binary(
        temp.path(),
        r#"echo "first problem" >&2
echo "Error: state lock held" >&2
exit 3"#,
    );

    let (runner, _) = runner_with_capture();
    let options = TerragruntOptions::new("apply")
        .binary(binary.display().to_string())
        .working_dir(temp.path());

    let err = runner.run(&options).await.unwrap_err();
    match err {
        RunnerError::CommandFailed {
            command,
            exit_code,
            last_stderr,
        } => {
            assert_eq!(command, "apply");
            assert_eq!(exit_code, 3);
            assert_eq!(last_stderr, "Error: state lock held");
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// A binary that cannot be found is a spawn failure.
#[tokio::test]
async fn test_missing_binary_is_spawn_failure() {
    let temp = tempdir().unwrap();
    let (runner, _) = runner_with_capture();
    let options = TerragruntOptions::new("plan")
        .binary(temp.path().join("nope").display().to_string())
        .working_dir(temp.path());

    let err = runner.run(&options).await.unwrap_err();
    assert!(matches!(err, RunnerError::SpawnFailed { .. }));
}
