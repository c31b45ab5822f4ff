//! # infractl_runner
//!
//! Terragrunt process execution for infractl.
//!
//! # Features
//!
//! - **Options**: typed Terragrunt flags rendered into a fixed argument order
//! - **Streaming**: child stdout/stderr forwarded line by line as it arrives
//! - **Dry-Run Mode**: log the command line without spawning anything
//! - **CI Integration**: timestamped, stream-prefixed output when `CI` is set
//! - **Mock Runner**: for testing without Terragrunt installed
//!
//! # Example
//!
//! ```rust,no_run
//! use infractl_runner::{CliRunner, CliRunnerOptions, ProcessRunner, TerragruntOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = CliRunner::new(CliRunnerOptions::default());
//!
//!     let options = TerragruntOptions::new("plan")
//!         .working_dir("infra/terragrunt/core")
//!         .non_interactive()
//!         .env("INFRACTL_CONFIG_FILE_PATH", "/tmp/compiled.json");
//!
//!     let result = runner.run(&options).await?;
//!     println!("Exit code: {}", result.exit_code);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod mock;
pub mod options;
pub mod runner;

pub use cli::{CliRunner, CliRunnerOptions, LogHandler, LogLine, LogStream};
pub use error::{RunnerError, RunnerResult};
pub use mock::{CapturedCall, MockResponse, MockRunner};
pub use options::{TerragruntOptions, TERRAGRUNT_BINARY};
pub use runner::{ExecutionResult, ProcessRunner};
