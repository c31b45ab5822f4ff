//! `${VAR}` / `${VAR:-default}` placeholder expansion.
//!
//! Resolution order for one placeholder:
//!
//! 1. the environment variable, when set and non-empty;
//! 2. a `secrets.<group>.<key>` default, resolved recursively;
//! 3. a non-empty literal default;
//! 4. otherwise the placeholder text is kept as-is.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::Value;
use tracing::{debug, warn};

use crate::env::EnvSource;
use crate::error::{ConfigError, ConfigResult};
use crate::models::EnvConfig;

/// Placeholder syntax: name, then an optional `:-default`.
pub const PLACEHOLDER_PATTERN: &str = r"\$\{([^}:-]+)(?::-([^}]*))?\}";

const SECRET_PREFIX: &str = "secrets.";

fn placeholder() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(PLACEHOLDER_PATTERN).expect("placeholder pattern is valid"))
}

/// How `missing_variables` decides that a placeholder is missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Missing only if expansion would leave the placeholder unresolved.
    #[default]
    Unresolvable,
    /// Every variable must come from the environment; literal defaults do
    /// not count. Secret defaults are checked through their own placeholders.
    RequireEnvironment,
}

/// A variable that could not be satisfied, and where it was referenced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingVariable {
    pub name: String,
    pub location: String,
}

/// A single parsed placeholder.
struct Placeholder<'t> {
    name: &'t str,
    default: Option<&'t str>,
}

impl<'t> Placeholder<'t> {
    fn from_captures(caps: &Captures<'t>) -> Option<Self> {
        let name = caps.get(1)?.as_str();
        let default = caps.get(2).map(|m| m.as_str()).filter(|d| !d.is_empty());
        Some(Self { name, default })
    }

    fn is_secret(&self) -> bool {
        self.default.is_some_and(|d| d.starts_with(SECRET_PREFIX))
    }

    /// `(group, key)` when the default is a well-formed secret reference.
    fn secret_ref(&self) -> Option<(&'t str, &'t str)> {
        let path = self.default?.strip_prefix(SECRET_PREFIX)?;
        let (group, key) = path.split_once('.')?;
        if group.is_empty() || key.is_empty() {
            return None;
        }
        Some((group, key))
    }
}

/// Expands placeholders across an [`EnvConfig`].
///
/// Secret lookups always go to the secrets table of the configuration the
/// expander was built with, never to an already-expanded copy.
pub struct Expander<'a> {
    config: &'a EnvConfig,
    env: &'a dyn EnvSource,
}

impl<'a> Expander<'a> {
    pub fn new(config: &'a EnvConfig, env: &'a dyn EnvSource) -> Self {
        Self { config, env }
    }

    /// Resolve every placeholder in `template`.
    pub fn resolve(&self, template: &str) -> String {
        let mut chain = Vec::new();
        self.resolve_in(template, &mut chain)
    }

    fn resolve_in(&self, template: &str, chain: &mut Vec<String>) -> String {
        placeholder()
            .replace_all(template, |caps: &Captures<'_>| {
                let original = caps[0].to_string();
                match Placeholder::from_captures(caps) {
                    Some(p) => self.resolve_placeholder(&p, chain).unwrap_or(original),
                    None => original,
                }
            })
            .into_owned()
    }

    fn resolve_placeholder(&self, p: &Placeholder<'_>, chain: &mut Vec<String>) -> Option<String> {
        if let Some(value) = self.env.lookup(p.name) {
            return Some(value);
        }

        if p.is_secret() {
            let (group, key) = p.secret_ref()?;
            let secret = self.config.secret(group, key)?;
            let id = format!("{group}.{key}");
            if chain.contains(&id) {
                warn!(
                    "Secret reference cycle at secrets.{} (via {}); leaving placeholder unresolved",
                    id,
                    chain.join(" -> ")
                );
                return None;
            }
            chain.push(id);
            let resolved = self.resolve_in(secret, chain);
            chain.pop();
            return Some(resolved);
        }

        p.default.map(str::to_string)
    }

    /// Return a fully expanded copy of the configuration.
    pub fn expand(&self) -> EnvConfig {
        let mut expanded = self.config.clone();
        visit_fields(&mut expanded, &mut |_, value| *value = self.resolve(value));
        debug!("Expanded placeholders in configuration");
        expanded
    }

    /// List every placeholder that `policy` considers missing, in scan order.
    pub fn missing_variables(&self, policy: MissingPolicy) -> Vec<MissingVariable> {
        let mut scratch = self.config.clone();
        let mut missing = Vec::new();
        visit_fields(&mut scratch, &mut |location, value| {
            let mut names = Vec::new();
            let mut chain = Vec::new();
            self.collect_missing(value, policy, &mut chain, &mut names);
            missing.extend(names.into_iter().map(|name| MissingVariable {
                name,
                location: location.to_string(),
            }));
        });
        missing
    }

    fn collect_missing(
        &self,
        template: &str,
        policy: MissingPolicy,
        chain: &mut Vec<String>,
        names: &mut Vec<String>,
    ) {
        for caps in placeholder().captures_iter(template) {
            let Some(p) = Placeholder::from_captures(&caps) else {
                continue;
            };
            if self.env.lookup(p.name).is_some() {
                continue;
            }

            if p.is_secret() {
                let found = p.secret_ref().and_then(|(group, key)| {
                    let secret = self.config.secret(group, key)?;
                    Some((format!("{group}.{key}"), secret))
                });
                match found {
                    Some((id, secret)) if !chain.contains(&id) => {
                        chain.push(id);
                        let before = names.len();
                        self.collect_missing(secret, policy, chain, names);
                        chain.pop();
                        // An unresolvable secret leaves this placeholder unresolved too.
                        if policy == MissingPolicy::Unresolvable && names.len() > before {
                            names.push(p.name.to_string());
                        }
                    }
                    _ => names.push(p.name.to_string()),
                }
                continue;
            }

            match (policy, p.default) {
                (MissingPolicy::Unresolvable, Some(_)) => {}
                _ => names.push(p.name.to_string()),
            }
        }
    }

    /// Fail with one aggregated error when any variable is missing.
    pub fn validate(&self, policy: MissingPolicy) -> ConfigResult<()> {
        let missing = self.missing_variables(policy);
        if missing.is_empty() {
            return Ok(());
        }

        let mut names: Vec<String> = Vec::new();
        let mut locations: Vec<String> = Vec::new();
        for var in missing {
            if !names.contains(&var.name) {
                names.push(var.name.clone());
            }
            let location = format!("{} ({})", var.location, var.name);
            if !locations.contains(&location) {
                locations.push(location);
            }
        }

        Err(ConfigError::MissingVariables { names, locations })
    }
}

/// Visit every expandable string field, in expansion order, with its location.
fn visit_fields(config: &mut EnvConfig, f: &mut dyn FnMut(&str, &mut String)) {
    for (group, entries) in config.secrets.iter_mut() {
        for (key, value) in entries.iter_mut() {
            f(&format!("secrets.{group}.{key}"), value);
        }
    }

    for (name, provider) in config.providers.iter_mut() {
        for (key, value) in provider.config.iter_mut() {
            visit_json(&format!("providers.{name}.config.{key}"), value, f);
        }
        let vc = &mut provider.version_constraint;
        f(&format!("providers.{name}.version_constraint.source"), &mut vc.source);
        f(
            &format!("providers.{name}.version_constraint.required_version"),
            &mut vc.required_version,
        );
    }

    f("config.version", &mut config.config.version);
    f("config.last_updated", &mut config.config.last_updated);
    f("config.description", &mut config.config.description);

    f("git.base_url", &mut config.git.base_url);

    f("product.name", &mut config.product.name);
    f("product.version", &mut config.product.version);
    f("product.description", &mut config.product.description);

    let iac = &mut config.iac;
    f("iac.versions.terraform_version_default", &mut iac.versions.terraform_version_default);
    f("iac.versions.terragrunt_version_default", &mut iac.versions.terragrunt_version_default);
    f("iac.remote_state.s3.bucket", &mut iac.remote_state.s3.bucket);
    f("iac.remote_state.s3.lock_table", &mut iac.remote_state.s3.lock_table);
    f("iac.remote_state.s3.region", &mut iac.remote_state.s3.region);

    for (index, stack) in config.stacks.iter_mut().enumerate() {
        f(&format!("stacks[{index}].name"), &mut stack.name);
        for (tag, value) in stack.tags.iter_mut() {
            f(&format!("stacks[{index}].tags.{tag}"), value);
        }
    }
}

fn visit_json(location: &str, value: &mut Value, f: &mut dyn FnMut(&str, &mut String)) {
    match value {
        Value::String(s) => f(location, s),
        Value::Array(items) => {
            for (index, item) in items.iter_mut().enumerate() {
                visit_json(&format!("{location}[{index}]"), item, f);
            }
        }
        Value::Object(map) => {
            for (key, item) in map.iter_mut() {
                visit_json(&format!("{location}.{key}"), item, f);
            }
        }
        _ => {}
    }
}
