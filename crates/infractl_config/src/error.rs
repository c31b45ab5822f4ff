//! Error types for the configuration module.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Why a file was rejected before parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatIssue {
    /// Extension is neither `.yaml` nor `.yml`.
    NotYaml,
    /// File exists but has zero length.
    Empty,
}

impl fmt::Display for FormatIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotYaml => write!(f, "not a YAML file (expected a .yaml or .yml extension)"),
            Self::Empty => write!(f, "file is empty"),
        }
    }
}

/// Errors that can occur while reading, merging or expanding configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration file {path}: {reason}")]
    InvalidFormat { path: PathBuf, reason: FormatIssue },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(
        "Configuration error in {stage}: field '{field}' is invalid. \
         Expected {expected}, got {actual}. {reason}"
    )]
    Configuration {
        stage: String,
        field: String,
        actual: String,
        expected: String,
        reason: String,
    },

    #[error("Unknown fields in {path}: {}", .fields.join(", "))]
    UnknownFields { path: PathBuf, fields: Vec<String> },

    #[error(
        "Missing environment variables: {}\n\n  \
         Referenced at:\n    {}\n\n  \
         Export them, add them to .env, or give the placeholder a default (${{NAME:-value}}).",
        .names.join(", "),
        .locations.join("\n    ")
    )]
    MissingVariables {
        names: Vec<String>,
        locations: Vec<String>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
