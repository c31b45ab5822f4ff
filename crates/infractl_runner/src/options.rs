//! Terragrunt invocation options.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default binary name, resolved on PATH.
pub const TERRAGRUNT_BINARY: &str = "terragrunt";

const RUN_ALL: &str = "run-all";

/// Everything needed to launch one Terragrunt command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerragruntOptions {
    /// Binary to execute
    pub binary: String,
    /// Directory the process runs in (`.` when unset)
    pub working_dir: Option<PathBuf>,
    /// Command, e.g. `plan` or `run-all apply`
    pub command: String,
    pub config_path: Option<PathBuf>,
    pub non_interactive: bool,
    pub auto_approve: bool,
    pub no_color: bool,
    pub debug: bool,
    pub strict_mode: bool,
    pub ignore_dependencies: bool,
    /// Only honoured for `run-all` commands
    pub parallelism: u32,
    pub include_dirs: Vec<PathBuf>,
    pub exclude_dirs: Vec<PathBuf>,
    pub target: Option<String>,
    pub replace: Option<String>,
    pub destroy: bool,
    pub refresh_only: bool,
    pub json_output_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    /// Appended verbatim after every generated flag
    pub additional_args: Vec<String>,
    /// Extra variables for the child process environment
    pub env: BTreeMap<String, String>,
}

impl Default for TerragruntOptions {
    fn default() -> Self {
        Self {
            binary: TERRAGRUNT_BINARY.to_string(),
            working_dir: None,
            command: String::new(),
            config_path: None,
            non_interactive: false,
            auto_approve: false,
            no_color: false,
            debug: false,
            strict_mode: false,
            ignore_dependencies: false,
            parallelism: 0,
            include_dirs: Vec::new(),
            exclude_dirs: Vec::new(),
            target: None,
            replace: None,
            destroy: false,
            refresh_only: false,
            json_output_dir: None,
            output_dir: None,
            additional_args: Vec::new(),
            env: BTreeMap::new(),
        }
    }
}

impl TerragruntOptions {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Default::default()
        }
    }

    /// `run-all <command>`
    pub fn run_all(command: &str) -> Self {
        Self::new(format!("{RUN_ALL} {command}"))
    }

    pub fn binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn non_interactive(mut self) -> Self {
        self.non_interactive = true;
        self
    }

    pub fn auto_approve(mut self, enabled: bool) -> Self {
        self.auto_approve = enabled;
        self
    }

    pub fn no_color(mut self) -> Self {
        self.no_color = true;
        self
    }

    pub fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    pub fn strict_mode(mut self) -> Self {
        self.strict_mode = true;
        self
    }

    pub fn ignore_dependencies(mut self) -> Self {
        self.ignore_dependencies = true;
        self
    }

    pub fn parallelism(mut self, parallelism: u32) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }

    pub fn exclude_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.exclude_dirs.push(dir.into());
        self
    }

    pub fn target(mut self, address: impl Into<String>) -> Self {
        self.target = Some(address.into());
        self
    }

    pub fn replace(mut self, address: impl Into<String>) -> Self {
        self.replace = Some(address.into());
        self
    }

    pub fn destroy(mut self) -> Self {
        self.destroy = true;
        self
    }

    pub fn refresh_only(mut self) -> Self {
        self.refresh_only = true;
        self
    }

    pub fn json_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.json_output_dir = Some(dir.into());
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.additional_args.extend(args);
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn envs(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env.extend(vars);
        self
    }

    /// True for `run-all ...` commands.
    pub fn is_run_all(&self) -> bool {
        self.command.starts_with(RUN_ALL)
    }

    /// Directory the process should run in.
    pub fn effective_working_dir(&self) -> &Path {
        self.working_dir.as_deref().unwrap_or_else(|| Path::new("."))
    }

    /// Build the argument vector, in the order Terragrunt documents its flags.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if !self.command.is_empty() {
            match self.command.strip_prefix(RUN_ALL) {
                Some(rest) => {
                    args.push(RUN_ALL.to_string());
                    let rest = rest.trim();
                    if !rest.is_empty() {
                        args.push(rest.to_string());
                    }
                }
                None => args.push(self.command.clone()),
            }
        }

        if let Some(path) = &self.config_path {
            args.push("--terragrunt-config".to_string());
            args.push(path.display().to_string());
        }
        if self.non_interactive {
            args.push("--terragrunt-non-interactive".to_string());
        }
        if self.auto_approve {
            args.push("-auto-approve".to_string());
        }
        if self.no_color {
            args.push("--terragrunt-no-color".to_string());
        }
        if self.debug {
            args.push("--terragrunt-debug".to_string());
        }
        if self.strict_mode {
            args.push("--strict-mode".to_string());
        }
        if self.ignore_dependencies {
            args.push("--terragrunt-ignore-dependency-order".to_string());
        }

        if self.parallelism > 0 && self.is_run_all() {
            args.push(format!("--terragrunt-parallelism={}", self.parallelism));
        }

        // Unresolvable relative dirs are skipped.
        for dir in self.include_dirs.iter().filter_map(|d| absolute(d)) {
            args.push(format!("--terragrunt-include-dir={}", dir.display()));
        }
        for dir in self.exclude_dirs.iter().filter_map(|d| absolute(d)) {
            args.push(format!("--terragrunt-exclude-dir={}", dir.display()));
        }

        if let Some(target) = &self.target {
            args.push(format!("-target={target}"));
        }
        if let Some(replace) = &self.replace {
            args.push(format!("-replace={replace}"));
        }
        if self.destroy {
            args.push("-destroy".to_string());
        }
        if self.refresh_only {
            args.push("-refresh-only".to_string());
        }

        if let Some(dir) = &self.json_output_dir {
            args.push(format!("--terragrunt-json-out-dir={}", dir.display()));
        }
        if let Some(dir) = &self.output_dir {
            args.push(format!("--terragrunt-out-dir={}", dir.display()));
        }

        args.extend(self.additional_args.iter().cloned());
        args
    }

    /// Human-readable command line, for logs and dry runs.
    pub fn command_line(&self) -> String {
        let mut line = self.binary.clone();
        for arg in self.build_args() {
            if arg.contains(' ') {
                line.push_str(&format!(" '{arg}'"));
            } else {
                line.push(' ');
                line.push_str(&arg);
            }
        }
        line
    }
}

fn absolute(path: &Path) -> Option<PathBuf> {
    if path.is_absolute() {
        return Some(path.to_path_buf());
    }
    std::env::current_dir().ok().map(|cwd| cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_command() {
        let args = TerragruntOptions::new("plan").non_interactive().build_args();
        assert_eq!(args, vec!["plan", "--terragrunt-non-interactive"]);
    }

    #[test]
    fn test_run_all_split_and_parallelism() {
        let args = TerragruntOptions::run_all("apply")
            .non_interactive()
            .auto_approve(true)
            .parallelism(4)
            .build_args();
        assert_eq!(
            args,
            vec![
                "run-all",
                "apply",
                "--terragrunt-non-interactive",
                "-auto-approve",
                "--terragrunt-parallelism=4",
            ]
        );
    }

    #[test]
    fn test_parallelism_ignored_without_run_all() {
        let args = TerragruntOptions::new("plan").parallelism(8).build_args();
        assert_eq!(args, vec!["plan"]);
    }

    #[test]
    fn test_full_flag_order() {
        let args = TerragruntOptions::new("plan")
            .config_path("/repo/terragrunt.hcl")
            .non_interactive()
            .auto_approve(true)
            .no_color()
            .debug()
            .strict_mode()
            .ignore_dependencies()
            .include_dir("/repo/a")
            .exclude_dir("/repo/b")
            .target("module.vpc")
            .replace("aws_instance.web")
            .destroy()
            .refresh_only()
            .json_output_dir("/tmp/json")
            .output_dir("/tmp/out")
            .args(vec!["-lock=false".to_string()])
            .build_args();

        assert_eq!(
            args,
            vec![
                "plan",
                "--terragrunt-config",
                "/repo/terragrunt.hcl",
                "--terragrunt-non-interactive",
                "-auto-approve",
                "--terragrunt-no-color",
                "--terragrunt-debug",
                "--strict-mode",
                "--terragrunt-ignore-dependency-order",
                "--terragrunt-include-dir=/repo/a",
                "--terragrunt-exclude-dir=/repo/b",
                "-target=module.vpc",
                "-replace=aws_instance.web",
                "-destroy",
                "-refresh-only",
                "--terragrunt-json-out-dir=/tmp/json",
                "--terragrunt-out-dir=/tmp/out",
                "-lock=false",
            ]
        );
    }

    #[test]
    fn test_relative_include_dir_made_absolute() {
        let args = TerragruntOptions::new("plan").include_dir("modules").build_args();
        let expected = std::env::current_dir().unwrap().join("modules");
        assert_eq!(args[1], format!("--terragrunt-include-dir={}", expected.display()));
    }

    #[test]
    fn test_defaults() {
        let options = TerragruntOptions::default();
        assert_eq!(options.binary, "terragrunt");
        assert_eq!(options.effective_working_dir(), Path::new("."));
        assert!(options.build_args().is_empty());
    }
}
