//! Environment configuration data model.
//!
//! The same types describe the YAML input files and the compiled JSON
//! artifact handed to Terragrunt, so field names are identical in both.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::scalar;

/// Free-form key/value block (provider settings, stack inputs).
pub type FreeForm = serde_json::Map<String, serde_json::Value>;

/// Provider name -> provider configuration.
pub type Providers = BTreeMap<String, ProviderConfig>;

/// Secret group -> key -> template string.
pub type Secrets = BTreeMap<String, BTreeMap<String, String>>;

/// Root `config` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootConfig {
    #[serde(default, deserialize_with = "scalar::string")]
    pub version: String,
    #[serde(default, deserialize_with = "scalar::string")]
    pub last_updated: String,
    #[serde(default, deserialize_with = "scalar::string")]
    pub description: String,
}

impl RootConfig {
    pub const FIELDS: &'static [&'static str] = &["version", "last_updated", "description"];
}

/// Git settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Git {
    #[serde(default, deserialize_with = "scalar::string")]
    pub base_url: String,
}

impl Git {
    pub const FIELDS: &'static [&'static str] = &["base_url"];
}

/// Product identification, optionally propagated as stack tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, deserialize_with = "scalar::string")]
    pub name: String,
    #[serde(default, deserialize_with = "scalar::string")]
    pub version: String,
    #[serde(default, deserialize_with = "scalar::string")]
    pub description: String,
    #[serde(default, deserialize_with = "scalar::boolean")]
    pub use_as_stack_tags: bool,
}

impl Product {
    pub const FIELDS: &'static [&'static str] =
        &["name", "version", "description", "use_as_stack_tags"];
}

/// Default tool versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IaCVersions {
    #[serde(default, deserialize_with = "scalar::string")]
    pub terraform_version_default: String,
    #[serde(default, deserialize_with = "scalar::string")]
    pub terragrunt_version_default: String,
}

impl IaCVersions {
    pub const FIELDS: &'static [&'static str] =
        &["terraform_version_default", "terragrunt_version_default"];
}

/// S3 remote-state backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteStateS3 {
    #[serde(default, deserialize_with = "scalar::string")]
    pub bucket: String,
    #[serde(default, deserialize_with = "scalar::string")]
    pub lock_table: String,
    #[serde(default, deserialize_with = "scalar::string")]
    pub region: String,
}

impl RemoteStateS3 {
    pub const FIELDS: &'static [&'static str] = &["bucket", "lock_table", "region"];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteState {
    #[serde(default)]
    pub s3: RemoteStateS3,
}

impl RemoteState {
    pub const FIELDS: &'static [&'static str] = &["s3"];
}

/// `iac` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IaC {
    #[serde(default)]
    pub versions: IaCVersions,
    #[serde(default)]
    pub remote_state: RemoteState,
}

impl IaC {
    pub const FIELDS: &'static [&'static str] = &["versions", "remote_state"];
}

/// Provider version pinning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionConstraint {
    #[serde(default, deserialize_with = "scalar::string")]
    pub source: String,
    #[serde(default, deserialize_with = "scalar::string")]
    pub required_version: String,
    #[serde(default, deserialize_with = "scalar::boolean")]
    pub enabled: bool,
}

impl VersionConstraint {
    pub const FIELDS: &'static [&'static str] = &["source", "required_version", "enabled"];
}

/// A single provider block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub config: FreeForm,
    #[serde(default)]
    pub version_constraint: VersionConstraint,
}

impl ProviderConfig {
    pub const FIELDS: &'static [&'static str] = &["config", "version_constraint"];
}

/// A deployable unit inside a layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentConfig {
    #[serde(default, deserialize_with = "scalar::string")]
    pub name: String,
    #[serde(default, deserialize_with = "scalar::string_list")]
    pub providers: Vec<String>,
    #[serde(default, deserialize_with = "scalar::string_map")]
    pub tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "FreeForm::is_empty")]
    pub inputs: FreeForm,
}

impl ComponentConfig {
    pub const FIELDS: &'static [&'static str] = &["name", "providers", "tags", "inputs"];
}

/// A group of components inside a stack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    #[serde(default, deserialize_with = "scalar::string")]
    pub name: String,
    #[serde(default, deserialize_with = "scalar::string_map")]
    pub tags: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "scalar::list")]
    pub components: Vec<ComponentConfig>,
    #[serde(default, skip_serializing_if = "FreeForm::is_empty")]
    pub inputs: FreeForm,
}

impl LayerConfig {
    pub const FIELDS: &'static [&'static str] = &["name", "tags", "components", "inputs"];

    pub fn component(&self, name: &str) -> Option<&ComponentConfig> {
        self.components.iter().find(|c| c.name == name)
    }
}

/// Top-level unit of the `stack/layer/component` hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackConfig {
    #[serde(default, deserialize_with = "scalar::string")]
    pub name: String,
    #[serde(default, deserialize_with = "scalar::string_map")]
    pub tags: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "scalar::list")]
    pub layers: Vec<LayerConfig>,
    #[serde(default, skip_serializing_if = "FreeForm::is_empty")]
    pub inputs: FreeForm,
}

impl StackConfig {
    pub const FIELDS: &'static [&'static str] = &["name", "tags", "layers", "inputs"];

    pub fn layer(&self, name: &str) -> Option<&LayerConfig> {
        self.layers.iter().find(|l| l.name == name)
    }
}

/// Complete environment configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    #[serde(default)]
    pub config: RootConfig,
    #[serde(default)]
    pub git: Git,
    #[serde(default)]
    pub product: Product,
    #[serde(default)]
    pub iac: IaC,
    #[serde(default)]
    pub providers: Providers,
    #[serde(default, deserialize_with = "scalar::nested_string_map")]
    pub secrets: Secrets,
    #[serde(default, deserialize_with = "scalar::list")]
    pub stacks: Vec<StackConfig>,
}

impl EnvConfig {
    pub const FIELDS: &'static [&'static str] =
        &["config", "git", "product", "iac", "providers", "secrets", "stacks"];

    /// Find a stack by name.
    pub fn stack(&self, name: &str) -> Option<&StackConfig> {
        self.stacks.iter().find(|s| s.name == name)
    }

    /// Look up `secrets.<group>.<key>`.
    pub fn secret(&self, group: &str, key: &str) -> Option<&str> {
        self.secrets.get(group)?.get(key).map(String::as_str)
    }

    /// Serialize as indented JSON, the format of the compiled artifact.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a compiled JSON artifact.
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EnvConfig {
        let mut inputs = FreeForm::new();
        inputs.insert("cidr".into(), serde_json::json!("10.0.0.0/16"));

        let mut providers = Providers::new();
        let mut provider_config = FreeForm::new();
        provider_config.insert("region".into(), serde_json::json!("us-east-1"));
        provider_config.insert("max_retries".into(), serde_json::json!(3));
        providers.insert(
            "aws".into(),
            ProviderConfig {
                config: provider_config,
                version_constraint: VersionConstraint {
                    source: "hashicorp/aws".into(),
                    required_version: "~> 5.0".into(),
                    enabled: true,
                },
            },
        );

        let mut secrets = Secrets::new();
        secrets
            .entry("db".into())
            .or_default()
            .insert("password".into(), "s3cret".into());

        EnvConfig {
            config: RootConfig {
                version: "1.0.0".into(),
                last_updated: "2024-01-01T00:00:00Z".into(),
                description: "sample".into(),
            },
            git: Git {
                base_url: "github.com/acme".into(),
            },
            product: Product {
                name: "acme".into(),
                version: "0.1.0".into(),
                description: String::new(),
                use_as_stack_tags: true,
            },
            iac: IaC::default(),
            providers,
            secrets,
            stacks: vec![StackConfig {
                name: "core".into(),
                tags: BTreeMap::from([("team".to_string(), "platform".to_string())]),
                layers: vec![LayerConfig {
                    name: "dns".into(),
                    tags: BTreeMap::new(),
                    components: vec![ComponentConfig {
                        name: "zone".into(),
                        providers: vec!["aws".into()],
                        tags: BTreeMap::new(),
                        inputs: FreeForm::new(),
                    }],
                    inputs: FreeForm::new(),
                }],
                inputs,
            }],
        }
    }

    #[test]
    fn test_json_round_trip_preserves_values() {
        let config = sample();
        let json = config.to_json_pretty().unwrap();
        let parsed = EnvConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_empty_inputs_omitted_from_json() {
        let json = sample().to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let component = &value["stacks"][0]["layers"][0]["components"][0];
        assert!(component.get("inputs").is_none());
        assert!(value["stacks"][0].get("inputs").is_some());
    }

    #[test]
    fn test_lookups() {
        let config = sample();
        let stack = config.stack("core").unwrap();
        assert!(stack.layer("dns").unwrap().component("zone").is_some());
        assert!(stack.layer("missing").is_none());
        assert_eq!(config.secret("db", "password"), Some("s3cret"));
        assert_eq!(config.secret("db", "user"), None);
    }
}
