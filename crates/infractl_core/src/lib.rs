//! # infractl_core
//!
//! Repository-aware orchestration for infractl.
//!
//! Locates the repository, prepares the cache and `.gitignore`, loads dotenv
//! files, compiles the base and target environment files into one JSON
//! document, checks it against the stack/layer/component directory tree and
//! launches Terragrunt with the compiled file's path in its environment.
//!
//! ## Features
//!
//! - **Paths**: repository root discovery and the fixed `infra/terragrunt` layout
//! - **Client**: sanity checks, compile, missing-variable report, cache write
//! - **Hierarchy**: declared stacks matched against directories and marker files
//! - **Launcher**: `plan` / `apply` / `destroy`, single or `run-all`
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use infractl_core::{Client, ClientOptions, LaunchOptions, RepoPaths, StackLauncher, StackSelection};
//! use infractl_runner::{CliRunner, CliRunnerOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let paths = RepoPaths::discover()?;
//!     let mut client = Client::new(paths.clone(), ClientOptions::default());
//!     client.initialise()?;
//!
//!     let compiled = client.compile(Some("dev"))?;
//!     let json = client.to_json(&compiled)?;
//!     let cached = client.write_cache(Some("dev"), &json, None)?;
//!
//!     let runner = Arc::new(CliRunner::new(CliRunnerOptions::default()));
//!     let launcher = StackLauncher::new(runner, paths, cached);
//!     launcher
//!         .plan(&StackSelection::stack_only("core")?, &LaunchOptions::default())
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod compiler;
pub mod dotenv;
pub mod error;
pub mod gitignore;
pub mod hierarchy;
pub mod launcher;
pub mod paths;
pub mod sanity;

pub use compiler::{Client, ClientOptions};
pub use error::{CoreError, CoreResult, ErrorCategory};
pub use hierarchy::{EntityKind, HierarchyIssue, HierarchyValidator, StackSelection};
pub use launcher::{Action, LaunchOptions, StackLauncher, CONFIG_FILE_ENV_VAR};
pub use paths::{find_repo_root, RepoPaths};
