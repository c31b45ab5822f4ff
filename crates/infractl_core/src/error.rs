//! Error types for the core module.

use std::path::PathBuf;

use thiserror::Error;

use infractl_config::ConfigError;
use infractl_runner::RunnerError;

use crate::hierarchy::{EntityKind, HierarchyIssue};

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Broad error classes, used to pick a process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    InvalidArguments,
    InvalidFormat,
    ParseError,
    ConfigurationError,
    MissingVariable,
    HierarchyMismatch,
    SubprocessFailure,
    General,
}

/// Errors that can occur during core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("No git repository found in {0} or any of its parents")]
    RepoRootNotFound(PathBuf),

    #[error("{what} not found: {}", .path.display())]
    NotFound { what: String, path: PathBuf },

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("No stacks are declared in the configuration")]
    NoStacks,

    #[error("{kind} '{name}' is not declared in {parent}")]
    UnknownEntity {
        kind: EntityKind,
        name: String,
        parent: String,
    },

    #[error("Directory for {kind} '{name}' not found: {}", .path.display())]
    MissingDirectory {
        kind: EntityKind,
        name: String,
        path: PathBuf,
    },

    #[error("{kind} name '{name}' is not a single directory name")]
    InvalidName { kind: EntityKind, name: String },

    #[error("Component '{name}' is missing its marker file: {}", .path.display())]
    MissingMarker { name: String, path: PathBuf },

    #[error(
        "Stack '{stack}' does not match its directory layout:\n  - {}",
        .issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n  - ")
    )]
    HierarchyMismatch {
        stack: String,
        issues: Vec<HierarchyIssue>,
    },

    #[error("Failed to load dotenv file {}: {reason}", .path.display())]
    Dotenv { path: PathBuf, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub fn not_found(what: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::NotFound {
            what: what.into(),
            path: path.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::RepoRootNotFound(_) | Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::UnknownEntity { .. } | Self::MissingDirectory { .. } => ErrorCategory::NotFound,
            Self::InvalidSelection(_) => ErrorCategory::InvalidArguments,
            Self::NoStacks | Self::Dotenv { .. } | Self::InvalidName { .. } => {
                ErrorCategory::ConfigurationError
            }
            Self::MissingMarker { .. } | Self::HierarchyMismatch { .. } => {
                ErrorCategory::HierarchyMismatch
            }
            Self::Config(e) => match e {
                ConfigError::NotFound(_) => ErrorCategory::NotFound,
                ConfigError::InvalidFormat { .. } => ErrorCategory::InvalidFormat,
                ConfigError::Parse { .. } => ErrorCategory::ParseError,
                ConfigError::Configuration { .. } | ConfigError::UnknownFields { .. } => {
                    ErrorCategory::ConfigurationError
                }
                ConfigError::MissingVariables { .. } => ErrorCategory::MissingVariable,
                ConfigError::Io(_) | ConfigError::Json(_) => ErrorCategory::General,
            },
            Self::Runner(e) => match e {
                RunnerError::BinaryNotFound(_) => ErrorCategory::NotFound,
                _ => ErrorCategory::SubprocessFailure,
            },
            Self::Io(_) | Self::Json(_) => ErrorCategory::General,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            CoreError::not_found("base file", "/x").category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            CoreError::Config(ConfigError::MissingVariables {
                names: vec!["A".into()],
                locations: vec![],
            })
            .category(),
            ErrorCategory::MissingVariable
        );
        assert_eq!(
            CoreError::Runner(RunnerError::CommandFailed {
                command: "plan".into(),
                exit_code: 1,
                last_stderr: String::new(),
            })
            .category(),
            ErrorCategory::SubprocessFailure
        );
        assert_eq!(
            CoreError::HierarchyMismatch {
                stack: "core".into(),
                issues: vec![],
            }
            .category(),
            ErrorCategory::HierarchyMismatch
        );
    }
}
