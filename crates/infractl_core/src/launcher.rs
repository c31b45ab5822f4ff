//! Launches Terragrunt for a stack, layer or component.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use infractl_runner::{ExecutionResult, ProcessRunner, TerragruntOptions, TERRAGRUNT_BINARY};

use crate::error::{CoreError, CoreResult};
use crate::hierarchy::StackSelection;
use crate::paths::{RepoPaths, TERRAGRUNT_MARKER};

/// Child environment variable holding the compiled JSON path.
pub const CONFIG_FILE_ENV_VAR: &str = "INFRACTL_CONFIG_FILE_PATH";

/// Terragrunt action to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Plan,
    Apply,
    Destroy,
}

impl Action {
    pub fn command(&self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Apply => "apply",
            Self::Destroy => "destroy",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.command())
    }
}

/// Per-launch options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaunchOptions {
    /// Use `run-all <action>`
    pub run_all: bool,
    /// Only used with `run_all`
    pub parallelism: Option<u32>,
    /// Ignored for `plan`
    pub auto_approve: bool,
    /// Passed through after the generated flags
    pub extra_args: Vec<String>,
}

impl LaunchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run_all(mut self, parallelism: Option<u32>) -> Self {
        self.run_all = true;
        self.parallelism = parallelism;
        self
    }

    pub fn auto_approve(mut self, enabled: bool) -> Self {
        self.auto_approve = enabled;
        self
    }

    pub fn extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }
}

/// Runs Terragrunt with the compiled configuration handed over through the
/// child environment.
pub struct StackLauncher {
    runner: Arc<dyn ProcessRunner>,
    paths: RepoPaths,
    compiled_json: PathBuf,
    binary: String,
    extra_env: BTreeMap<String, String>,
}

impl StackLauncher {
    pub fn new(runner: Arc<dyn ProcessRunner>, paths: RepoPaths, compiled_json: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            paths,
            compiled_json: compiled_json.into(),
            binary: TERRAGRUNT_BINARY.to_string(),
            extra_env: BTreeMap::new(),
        }
    }

    /// Add variables (e.g. dotenv values) to the child environment.
    pub fn with_env(mut self, vars: BTreeMap<String, String>) -> Self {
        self.extra_env.extend(vars);
        self
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Resolve and check the directory Terragrunt runs in.
    pub fn workdir(&self, selection: &StackSelection) -> CoreResult<PathBuf> {
        let dir = self.paths.selection_dir(selection);
        if !dir.is_dir() {
            return Err(CoreError::not_found(
                format!("Working directory for '{selection}'"),
                dir,
            ));
        }

        if selection.component.is_some() {
            let marker = dir.join(TERRAGRUNT_MARKER);
            if !marker.is_file() {
                return Err(CoreError::not_found(
                    format!("{TERRAGRUNT_MARKER} for component '{selection}'"),
                    marker,
                ));
            }
        }
        Ok(dir)
    }

    /// Build the full invocation without running it.
    pub fn options(
        &self,
        action: Action,
        selection: &StackSelection,
        launch: &LaunchOptions,
    ) -> CoreResult<TerragruntOptions> {
        let workdir = self.workdir(selection)?;

        let mut options = if launch.run_all {
            TerragruntOptions::run_all(action.command())
                .parallelism(launch.parallelism.unwrap_or(0))
        } else {
            TerragruntOptions::new(action.command())
        };

        options = options
            .binary(self.binary.clone())
            .working_dir(workdir)
            .non_interactive()
            .auto_approve(launch.auto_approve && action != Action::Plan)
            .args(launch.extra_args.iter().cloned())
            .envs(self.extra_env.clone())
            .env(CONFIG_FILE_ENV_VAR, self.compiled_json.display().to_string());

        Ok(options)
    }

    pub async fn launch(
        &self,
        action: Action,
        selection: &StackSelection,
        launch: &LaunchOptions,
    ) -> CoreResult<ExecutionResult> {
        let options = self.options(action, selection, launch)?;
        info!(
            "Running terragrunt {} for '{}' in {}",
            action,
            selection,
            options.effective_working_dir().display()
        );
        Ok(self.runner.run(&options).await?)
    }

    pub async fn plan(&self, selection: &StackSelection, launch: &LaunchOptions) -> CoreResult<ExecutionResult> {
        self.launch(Action::Plan, selection, launch).await
    }

    pub async fn apply(&self, selection: &StackSelection, launch: &LaunchOptions) -> CoreResult<ExecutionResult> {
        self.launch(Action::Apply, selection, launch).await
    }

    pub async fn destroy(&self, selection: &StackSelection, launch: &LaunchOptions) -> CoreResult<ExecutionResult> {
        self.launch(Action::Destroy, selection, launch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infractl_runner::{MockResponse, MockRunner, RunnerError};
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn repo() -> (TempDir, RepoPaths) {
        let temp = tempdir().unwrap();
        let paths = RepoPaths::from_root(temp.path());
        fs::create_dir_all(paths.component_dir("core", "network", "vpc")).unwrap();
        (temp, paths)
    }

    fn launcher(runner: &MockRunner, paths: RepoPaths) -> StackLauncher {
        StackLauncher::new(Arc::new(runner.clone()), paths, "/cache/dev.json")
    }

    #[tokio::test]
    async fn test_plan_passes_config_path_and_dotenv() {
        let (_temp, paths) = repo();
        let runner = MockRunner::new();
        let stack_dir = paths.stack_dir("core");

        let mut dotenv = BTreeMap::new();
        dotenv.insert("AWS_PROFILE".to_string(), "sandbox".to_string());
        let launcher = launcher(&runner, paths).with_env(dotenv);

        let selection = StackSelection::stack_only("core").unwrap();
        launcher
            .plan(&selection, &LaunchOptions::new().auto_approve(true))
            .await
            .unwrap();

        let call = runner.last_call().unwrap();
        assert_eq!(call.working_dir, stack_dir);
        assert_eq!(call.args, vec!["plan", "--terragrunt-non-interactive"]);
        assert_eq!(call.env[CONFIG_FILE_ENV_VAR], "/cache/dev.json");
        assert_eq!(call.env["AWS_PROFILE"], "sandbox");
    }

    #[tokio::test]
    async fn test_run_all_apply_with_trailing_args() {
        let (_temp, paths) = repo();
        let runner = MockRunner::new();
        let launcher = launcher(&runner, paths);

        let selection = StackSelection::new("core", Some("network".into()), None).unwrap();
        let launch = LaunchOptions::new()
            .run_all(Some(4))
            .auto_approve(true)
            .extra_args(vec!["-lock=false".into()]);
        launcher.apply(&selection, &launch).await.unwrap();

        assert_eq!(
            runner.last_call().unwrap().args,
            vec![
                "run-all",
                "apply",
                "--terragrunt-non-interactive",
                "-auto-approve",
                "--terragrunt-parallelism=4",
                "-lock=false",
            ]
        );
    }

    #[test]
    fn test_component_needs_terragrunt_file() {
        let (_temp, paths) = repo();
        let vpc = paths.component_dir("core", "network", "vpc");
        let launcher = launcher(&MockRunner::new(), paths);
        let selection =
            StackSelection::new("core", Some("network".into()), Some("vpc".into())).unwrap();

        assert!(matches!(
            launcher.workdir(&selection),
            Err(CoreError::NotFound { .. })
        ));

        fs::write(vpc.join(TERRAGRUNT_MARKER), "").unwrap();
        assert_eq!(launcher.workdir(&selection).unwrap(), vpc);
    }

    #[test]
    fn test_missing_workdir() {
        let (_temp, paths) = repo();
        let launcher = launcher(&MockRunner::new(), paths);
        let selection = StackSelection::stack_only("platform").unwrap();
        assert!(launcher.workdir(&selection).is_err());
    }

    #[tokio::test]
    async fn test_failure_surfaces_as_runner_error() {
        let (_temp, paths) = repo();
        let runner = MockRunner::new().add_response(MockResponse::failure(1, "Error: no state\n"));
        let launcher = launcher(&runner, paths);

        let err = launcher
            .destroy(&StackSelection::stack_only("core").unwrap(), &LaunchOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Runner(RunnerError::CommandFailed { exit_code: 1, .. })
        ));
    }
}
