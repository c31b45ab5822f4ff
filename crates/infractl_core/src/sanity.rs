//! Pre-flight checks run before compiling.

use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use infractl_config::{is_yaml_path, ConfigReader};
use infractl_runner::{ProcessRunner, RunnerError};

use crate::error::{CoreError, CoreResult};

/// The binary must be launchable.
pub async fn check_binary(runner: &dyn ProcessRunner, binary: &str) -> CoreResult<()> {
    if runner.is_available(binary).await {
        debug!("{} is available", binary);
        Ok(())
    } else {
        Err(RunnerError::BinaryNotFound(binary.to_string()).into())
    }
}

/// The environments directory must exist and hold at least one YAML file.
pub fn check_envs_dir(envs: &Path) -> CoreResult<()> {
    if !envs.is_dir() {
        return Err(CoreError::not_found("Environment configuration directory", envs));
    }

    let found = WalkDir::new(envs)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .any(|entry| is_yaml_path(entry.path()));

    if found {
        Ok(())
    } else {
        Err(CoreError::not_found(
            "Environment configuration files (.yaml/.yml)",
            envs,
        ))
    }
}

/// The file must be an existing, non-empty YAML file.
pub fn check_env_file(path: &Path) -> CoreResult<()> {
    ConfigReader::check_file(path)?;
    Ok(())
}
