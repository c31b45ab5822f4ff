//! Environment configuration file reading.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult, FormatIssue};
use crate::models::{
    ComponentConfig, EnvConfig, Git, IaC, IaCVersions, LayerConfig, Product, ProviderConfig,
    RemoteState, RemoteStateS3, RootConfig, Secrets, StackConfig, VersionConstraint,
};
use crate::scalar;

/// Options controlling how strictly a file is decoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    /// Reject keys that are not part of the schema instead of dropping them.
    pub strict: bool,
}

impl ReadOptions {
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

/// Top-level sections kept as raw YAML until each is decoded on its own.
#[derive(Debug, Default, Deserialize)]
struct RawEnvConfig {
    #[serde(default)]
    config: Option<Value>,
    #[serde(default)]
    git: Option<Value>,
    #[serde(default)]
    product: Option<Value>,
    #[serde(default)]
    iac: Option<Value>,
    #[serde(default)]
    providers: Option<Value>,
    #[serde(default)]
    secrets: Option<Value>,
    #[serde(default)]
    stacks: Option<Vec<Value>>,
}

/// Reader for environment configuration files.
pub struct ConfigReader;

impl ConfigReader {
    /// Read and decode a YAML environment configuration file.
    pub fn read(path: impl AsRef<Path>, options: ReadOptions) -> ConfigResult<EnvConfig> {
        let path = path.as_ref();
        debug!("Reading environment configuration from {:?}", path);

        Self::check_file(path)?;
        let content = fs::read_to_string(path)?;
        Self::from_str(&content, path, options)
    }

    /// Check extension, existence and size without parsing.
    pub fn check_file(path: &Path) -> ConfigResult<()> {
        if !is_yaml_path(path) {
            return Err(ConfigError::InvalidFormat {
                path: path.to_path_buf(),
                reason: FormatIssue::NotYaml,
            });
        }

        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
            _ => ConfigError::Io(e),
        })?;

        if metadata.len() == 0 {
            return Err(ConfigError::InvalidFormat {
                path: path.to_path_buf(),
                reason: FormatIssue::Empty,
            });
        }

        Ok(())
    }

    /// Decode configuration from YAML text. `origin` is used in error messages.
    pub fn from_str(content: &str, origin: &Path, options: ReadOptions) -> ConfigResult<EnvConfig> {
        let parse_error = |source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        };

        let document: Value = serde_yaml::from_str(content).map_err(parse_error)?;
        let raw: RawEnvConfig = match document {
            Value::Null => RawEnvConfig::default(),
            ref doc => serde_yaml::from_value(doc.clone()).map_err(parse_error)?,
        };

        let unknown = unknown_fields(&document);
        if !unknown.is_empty() {
            if options.strict {
                return Err(ConfigError::UnknownFields {
                    path: origin.to_path_buf(),
                    fields: unknown,
                });
            }
            warn!(
                "Ignoring unknown fields in {}: {}",
                origin.display(),
                unknown.join(", ")
            );
        }

        let stacks = raw
            .stacks
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, stack)| decode_section::<StackConfig>(&format!("stacks[{i}]"), Some(stack)))
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(EnvConfig {
            config: decode_root(raw.config)?,
            git: decode_section::<Git>("git", raw.git)?,
            product: decode_section::<Product>("product", raw.product)?,
            iac: decode_section::<IaC>("iac", raw.iac)?,
            providers: decode_section("providers", raw.providers)?,
            secrets: decode_secrets(raw.secrets)?,
            stacks,
        })
    }
}

/// True when the path carries a `.yaml` or `.yml` extension.
pub fn is_yaml_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn decode_root(section: Option<Value>) -> ConfigResult<RootConfig> {
    let raw_version = section
        .as_ref()
        .and_then(|s| s.get("version"))
        .map(|v| scalar::to_text(v).unwrap_or_else(|| format!("{v:?}")))
        .unwrap_or_else(|| "<missing>".to_string());

    let mut root = decode_section::<RootConfig>("config", section)?;

    if root.version.trim().is_empty() {
        return Err(ConfigError::Configuration {
            stage: "RootConfig".to_string(),
            field: "version".to_string(),
            actual: raw_version,
            expected: "non-empty string".to_string(),
            reason: "Version is required".to_string(),
        });
    }

    if root.last_updated.is_empty() {
        root.last_updated = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    }

    Ok(root)
}

fn decode_secrets(section: Option<Value>) -> ConfigResult<Secrets> {
    match section {
        None | Some(Value::Null) => Ok(Secrets::default()),
        Some(value) => {
            scalar::nested_string_map(value).map_err(|e| section_error("secrets", e))
        }
    }
}

fn decode_section<T>(stage: &str, section: Option<Value>) -> ConfigResult<T>
where
    T: DeserializeOwned + Default,
{
    match section {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_yaml::from_value(value).map_err(|e| section_error(stage, e)),
    }
}

fn section_error(stage: &str, error: serde_yaml::Error) -> ConfigError {
    ConfigError::Configuration {
        stage: stage.to_string(),
        field: stage.to_string(),
        actual: "a value of the wrong shape".to_string(),
        expected: format!("a valid '{stage}' section"),
        reason: error.to_string(),
    }
}

/// Walk the raw document and list keys the schema does not know about.
///
/// Free-form blocks (`inputs`, provider `config`) and secret groups are not
/// inspected.
fn unknown_fields(document: &Value) -> Vec<String> {
    let mut found = Vec::new();
    let Some(root) = document.as_mapping() else {
        return found;
    };

    check_keys(root, "", EnvConfig::FIELDS, &mut found);

    if let Some(config) = mapping(root, "config") {
        check_keys(config, "config", RootConfig::FIELDS, &mut found);
    }
    if let Some(git) = mapping(root, "git") {
        check_keys(git, "git", Git::FIELDS, &mut found);
    }
    if let Some(product) = mapping(root, "product") {
        check_keys(product, "product", Product::FIELDS, &mut found);
    }
    if let Some(iac) = mapping(root, "iac") {
        check_keys(iac, "iac", IaC::FIELDS, &mut found);
        if let Some(versions) = mapping(iac, "versions") {
            check_keys(versions, "iac.versions", IaCVersions::FIELDS, &mut found);
        }
        if let Some(remote) = mapping(iac, "remote_state") {
            check_keys(remote, "iac.remote_state", RemoteState::FIELDS, &mut found);
            if let Some(s3) = mapping(remote, "s3") {
                check_keys(s3, "iac.remote_state.s3", RemoteStateS3::FIELDS, &mut found);
            }
        }
    }
    if let Some(providers) = mapping(root, "providers") {
        for (name, provider) in providers {
            let Some(provider) = provider.as_mapping() else {
                continue;
            };
            let prefix = format!("providers.{}", key_text(name));
            check_keys(provider, &prefix, ProviderConfig::FIELDS, &mut found);
            if let Some(constraint) = mapping(provider, "version_constraint") {
                let prefix = format!("{prefix}.version_constraint");
                check_keys(constraint, &prefix, VersionConstraint::FIELDS, &mut found);
            }
        }
    }

    let stacks = root.get("stacks").and_then(Value::as_sequence);
    for (i, stack) in stacks.into_iter().flatten().enumerate() {
        let Some(stack) = stack.as_mapping() else {
            continue;
        };
        let stack_prefix = format!("stacks[{i}]");
        check_keys(stack, &stack_prefix, StackConfig::FIELDS, &mut found);

        let layers = stack.get("layers").and_then(Value::as_sequence);
        for (j, layer) in layers.into_iter().flatten().enumerate() {
            let Some(layer) = layer.as_mapping() else {
                continue;
            };
            let layer_prefix = format!("{stack_prefix}.layers[{j}]");
            check_keys(layer, &layer_prefix, LayerConfig::FIELDS, &mut found);

            let components = layer.get("components").and_then(Value::as_sequence);
            for (k, component) in components.into_iter().flatten().enumerate() {
                if let Some(component) = component.as_mapping() {
                    let prefix = format!("{layer_prefix}.components[{k}]");
                    check_keys(component, &prefix, ComponentConfig::FIELDS, &mut found);
                }
            }
        }
    }

    found
}

fn mapping<'a>(parent: &'a Mapping, key: &str) -> Option<&'a Mapping> {
    parent.get(key).and_then(Value::as_mapping)
}

fn key_text(key: &Value) -> String {
    scalar::to_text(key).unwrap_or_else(|| format!("{key:?}"))
}

fn check_keys(map: &Mapping, prefix: &str, known: &[&str], found: &mut Vec<String>) {
    for key in map.keys() {
        let name = key_text(key);
        if !known.contains(&name.as_str()) {
            if prefix.is_empty() {
                found.push(name);
            } else {
                found.push(format!("{prefix}.{name}"));
            }
        }
    }
}
