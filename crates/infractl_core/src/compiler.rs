//! Compilation client: read, merge, expand and validate environment files.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use infractl_config::{
    merge_sections, ConfigReader, EnvConfig, Expander, LayeredEnv, MissingPolicy,
    MissingVariable, ReadOptions,
};
use infractl_runner::{ProcessRunner, TERRAGRUNT_BINARY};

use crate::cache::{self, DEFAULT_TARGET_NAME};
use crate::dotenv;
use crate::error::CoreResult;
use crate::gitignore;
use crate::hierarchy::{HierarchyValidator, StackSelection};
use crate::paths::{RepoPaths, DEFAULT_BASE_ENV};
use crate::sanity;

/// Client options.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base file name under `_ENVS` (extension optional)
    pub base: String,
    /// Reject unknown keys in configuration files
    pub strict: bool,
    /// Skip the binary availability check
    pub dry_run: bool,
    /// Binary the sanity check looks for
    pub binary: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE_ENV.to_string(),
            strict: false,
            dry_run: false,
            binary: TERRAGRUNT_BINARY.to_string(),
        }
    }
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Turns the base and target files into one compiled configuration.
pub struct Client {
    paths: RepoPaths,
    options: ClientOptions,
    env: LayeredEnv,
}

impl Client {
    pub fn new(paths: RepoPaths, options: ClientOptions) -> Self {
        Self {
            paths,
            options,
            env: LayeredEnv::default(),
        }
    }

    pub fn paths(&self) -> &RepoPaths {
        &self.paths
    }

    /// Environment used for placeholder expansion.
    pub fn env(&self) -> &LayeredEnv {
        &self.env
    }

    pub fn base_file(&self) -> PathBuf {
        self.paths.base_env_file(&self.options.base)
    }

    pub fn target_file(&self, target_env: Option<&str>) -> PathBuf {
        self.paths.target_env_file(target_env)
    }

    /// Create the cache directory, update `.gitignore` and load dotenv files.
    pub fn initialise(&mut self) -> CoreResult<()> {
        cache::ensure_cache_dir(&self.paths.cache)?;
        gitignore::ensure_entries(&self.paths.root, gitignore::DEFAULT_ENTRIES)?;

        let cwd = std::env::current_dir()?;
        self.env = LayeredEnv::new(dotenv::load(&self.paths.root, &cwd)?);

        debug!("Client initialised at {}", self.paths.root.display());
        Ok(())
    }

    pub async fn run_sanity_check(
        &self,
        runner: &dyn ProcessRunner,
        target_env: Option<&str>,
    ) -> CoreResult<()> {
        if self.options.dry_run {
            debug!("Dry run: skipping {} availability check", self.options.binary);
        } else {
            sanity::check_binary(runner, &self.options.binary).await?;
        }
        sanity::check_envs_dir(&self.paths.envs)?;
        sanity::check_env_file(&self.base_file())?;
        sanity::check_env_file(&self.target_file(target_env))?;
        Ok(())
    }

    fn read_options(&self) -> ReadOptions {
        ReadOptions {
            strict: self.options.strict,
        }
    }

    fn read(&self, path: &Path) -> CoreResult<EnvConfig> {
        Ok(ConfigReader::read(path, self.read_options())?)
    }

    /// Read both files and merge the target over the base.
    pub fn merged(&self, target_env: Option<&str>) -> CoreResult<EnvConfig> {
        let base = self.read(&self.base_file())?;
        let target = self.read(&self.target_file(target_env))?;

        let outcome = merge_sections(&base, &target);
        if !outcome.overridden.is_empty() {
            info!("Target overrides: {}", outcome.overridden.join(", "));
        }
        Ok(outcome.config)
    }

    /// Read, merge, expand and validate the stack hierarchy.
    pub fn compile(&self, target_env: Option<&str>) -> CoreResult<EnvConfig> {
        let merged = self.merged(target_env)?;
        let compiled = Expander::new(&merged, &self.env).expand();

        HierarchyValidator::new(&compiled, &self.paths.terragrunt).validate_stacks()?;

        info!(
            "Compiled '{}' over '{}'",
            target_env.unwrap_or(DEFAULT_TARGET_NAME),
            self.options.base
        );
        Ok(compiled)
    }

    /// Report placeholders that `policy` considers unsatisfied.
    pub fn missing_variables(
        &self,
        target_env: Option<&str>,
        policy: MissingPolicy,
    ) -> CoreResult<Vec<MissingVariable>> {
        let merged = self.merged(target_env)?;
        Ok(Expander::new(&merged, &self.env).missing_variables(policy))
    }

    /// Fail with one error listing every missing variable.
    pub fn check_variables(&self, target_env: Option<&str>, policy: MissingPolicy) -> CoreResult<()> {
        let merged = self.merged(target_env)?;
        Expander::new(&merged, &self.env).validate(policy)?;
        Ok(())
    }

    pub fn validate_selection(&self, compiled: &EnvConfig, selection: &StackSelection) -> CoreResult<()> {
        HierarchyValidator::new(compiled, &self.paths.terragrunt).validate_selection(selection)
    }

    pub fn to_json(&self, compiled: &EnvConfig) -> CoreResult<String> {
        Ok(compiled.to_json_pretty()?)
    }

    /// Write the compiled JSON into the cache and return its absolute path.
    pub fn write_cache(
        &self,
        target_env: Option<&str>,
        json: &str,
        override_name: Option<&str>,
    ) -> CoreResult<PathBuf> {
        let env = target_env.unwrap_or(DEFAULT_TARGET_NAME);
        let filename = cache::cache_filename(env, override_name);
        cache::write_file(&self.paths.cache, &filename, json)
    }
}
