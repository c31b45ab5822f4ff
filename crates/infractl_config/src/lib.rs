//! # infractl_config
//!
//! Environment configuration pipeline for infractl.
//!
//! A base file and a target-environment file are read from YAML, merged
//! section by section, and have their `${VAR}` / `${VAR:-default}`
//! placeholders expanded against the environment and the `secrets` table.
//!
//! ## Features
//!
//! - **Reader**: YAML decoding with lenient scalars and an unknown-key walk
//! - **Merger**: wholesale section overrides from the target file
//! - **Expander**: environment, secret and literal-default resolution
//! - **Missing-variable report**: one aggregated error listing every gap
//!
//! ## Example
//!
//! ```rust,no_run
//! use infractl_config::{merge, ConfigReader, Expander, ProcessEnv, ReadOptions};
//!
//! let base = ConfigReader::read("infra/terragrunt/_ENVS/base.yaml", ReadOptions::default()).ok();
//! let target = ConfigReader::read("infra/terragrunt/_ENVS/dev.yaml", ReadOptions::default()).ok();
//!
//! if let Some(merged) = merge(base, target) {
//!     let compiled = Expander::new(&merged, &ProcessEnv).expand();
//!     println!("{}", compiled.to_json_pretty().unwrap());
//! }
//! ```

pub mod env;
pub mod error;
pub mod expand;
pub mod merge;
pub mod models;
pub mod reader;
pub mod scalar;

pub use env::{EnvSource, LayeredEnv, ProcessEnv};
pub use error::{ConfigError, ConfigResult, FormatIssue};
pub use expand::{Expander, MissingPolicy, MissingVariable, PLACEHOLDER_PATTERN};
pub use merge::{merge, merge_sections, MergeOutcome, SectionOverride, SECTION_OVERRIDES};
pub use models::{
    ComponentConfig, EnvConfig, FreeForm, Git, IaC, IaCVersions, LayerConfig, Product,
    ProviderConfig, Providers, RemoteState, RemoteStateS3, RootConfig, Secrets, StackConfig,
    VersionConstraint,
};
pub use reader::{is_yaml_path, ConfigReader, ReadOptions};
