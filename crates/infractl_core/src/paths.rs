//! Repository path resolution.
//!
//! Everything is anchored at the git repository root:
//!
//! ```text
//! <root>/infra/.infractl-cache/            compiled JSON cache
//! <root>/infra/terragrunt/                 stack/layer/component tree
//! <root>/infra/terragrunt/_ENVS/*.yaml     base and per-environment files
//! <root>/infra/terragrunt/target.yaml      default target file
//! ```

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::hierarchy::StackSelection;

pub const INFRA_DIR: &str = "infra";
pub const TERRAGRUNT_DIR: &str = "terragrunt";
pub const ENVS_DIR: &str = "_ENVS";
pub const CACHE_DIR: &str = ".infractl-cache";
pub const BASE_ENV_FILE: &str = "base.yaml";
pub const TARGET_ENV_FILE: &str = "target.yaml";
pub const DEFAULT_BASE_ENV: &str = "base";
/// Every component directory must contain this file.
pub const COMPONENT_MARKER: &str = "component.hcl";
/// A component working directory must contain this file before Terragrunt runs in it.
pub const TERRAGRUNT_MARKER: &str = "terragrunt.hcl";

/// Walk upward from `start` until a directory containing `.git` is found.
pub fn find_repo_root(start: &Path) -> CoreResult<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
        .ok_or_else(|| CoreError::RepoRootNotFound(start.to_path_buf()))
}

/// True when `name` is exactly one ordinary path component.
///
/// Stack, layer and component names are joined onto directories, so empty
/// names, `.`/`..`, absolute paths and names containing separators are refused.
pub fn is_plain_name(name: &str) -> bool {
    if name.is_empty() || name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Give `path` the extension `ext`.
///
/// A path that already carries `ext` (any case) is returned unchanged; any
/// other extension is replaced; a path without one gets `ext` appended.
pub fn force_extension(path: impl AsRef<Path>, ext: &str) -> PathBuf {
    let path = path.as_ref();
    let ext = ext.trim_start_matches('.');
    match path.extension().and_then(|e| e.to_str()) {
        Some(current) if current.eq_ignore_ascii_case(ext) => path.to_path_buf(),
        _ => path.with_extension(ext),
    }
}

/// Absolute locations inside the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPaths {
    pub root: PathBuf,
    pub cache: PathBuf,
    pub terragrunt: PathBuf,
    pub envs: PathBuf,
}

impl RepoPaths {
    /// Resolve paths from the repository containing the current directory.
    pub fn discover() -> CoreResult<Self> {
        let cwd = std::env::current_dir()?;
        let root = find_repo_root(&cwd)?;
        debug!("Repository root: {}", root.display());
        Ok(Self::from_root(root))
    }

    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let infra = root.join(INFRA_DIR);
        let terragrunt = infra.join(TERRAGRUNT_DIR);
        Self {
            cache: infra.join(CACHE_DIR),
            envs: terragrunt.join(ENVS_DIR),
            terragrunt,
            root,
        }
    }

    /// `_ENVS/<name>.yaml`, defaulting to `base`.
    pub fn base_env_file(&self, name: &str) -> PathBuf {
        let name = if name.trim().is_empty() {
            DEFAULT_BASE_ENV
        } else {
            name
        };
        self.envs.join(force_extension(name, "yaml"))
    }

    /// `_ENVS/<env>.yaml`, or `terragrunt/target.yaml` when no environment is named.
    pub fn target_env_file(&self, env: Option<&str>) -> PathBuf {
        match env.map(str::trim).filter(|e| !e.is_empty()) {
            Some(env) => self.envs.join(force_extension(env, "yaml")),
            None => self.terragrunt.join(TARGET_ENV_FILE),
        }
    }

    pub fn stack_dir(&self, stack: &str) -> PathBuf {
        self.terragrunt.join(stack)
    }

    pub fn layer_dir(&self, stack: &str, layer: &str) -> PathBuf {
        self.stack_dir(stack).join(layer)
    }

    pub fn component_dir(&self, stack: &str, layer: &str, component: &str) -> PathBuf {
        self.layer_dir(stack, layer).join(component)
    }

    /// Deepest directory named by `selection`.
    pub fn selection_dir(&self, selection: &StackSelection) -> PathBuf {
        match (&selection.layer, &selection.component) {
            (Some(layer), Some(component)) => {
                self.component_dir(&selection.stack, layer, component)
            }
            (Some(layer), None) => self.layer_dir(&selection.stack, layer),
            _ => self.stack_dir(&selection.stack),
        }
    }
}
