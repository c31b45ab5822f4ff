//! Checks that declared stacks, layers and components exist on disk.
//!
//! Expected layout under the Terragrunt directory:
//! `<stack>/<layer>/<component>/component.hcl`. Directories that exist but
//! are not declared are ignored.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use infractl_config::{ComponentConfig, EnvConfig, LayerConfig, StackConfig};

use crate::error::{CoreError, CoreResult};
use crate::paths::{is_plain_name, COMPONENT_MARKER};

/// Level of the hierarchy an entity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Stack,
    Layer,
    Component,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stack => write!(f, "stack"),
            Self::Layer => write!(f, "layer"),
            Self::Component => write!(f, "component"),
        }
    }
}

/// One problem found inside an existing stack directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HierarchyIssue {
    MissingLayerDir { layer: String, path: PathBuf },
    MissingComponentDir {
        layer: String,
        component: String,
        path: PathBuf,
    },
    MissingMarker {
        layer: String,
        component: String,
        path: PathBuf,
    },
    DuplicateLayer { layer: String },
    DuplicateComponent { layer: String, component: String },
    InvalidName { kind: EntityKind, name: String },
}

impl fmt::Display for HierarchyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLayerDir { layer, path } => {
                write!(f, "layer '{}': directory not found at {}", layer, path.display())
            }
            Self::MissingComponentDir {
                layer,
                component,
                path,
            } => write!(
                f,
                "component '{}/{}': directory not found at {}",
                layer,
                component,
                path.display()
            ),
            Self::MissingMarker {
                layer,
                component,
                path,
            } => write!(
                f,
                "component '{}/{}': missing {} at {}",
                layer,
                component,
                COMPONENT_MARKER,
                path.display()
            ),
            Self::InvalidName { kind, name } => {
                write!(f, "{} name '{}' is not a single directory name", kind, name)
            }
            Self::DuplicateLayer { layer } => write!(f, "layer '{}' is declared more than once", layer),
            Self::DuplicateComponent { layer, component } => write!(
                f,
                "component '{}' is declared more than once in layer '{}'",
                component, layer
            ),
        }
    }
}

/// The stack, and optionally layer and component, a command targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackSelection {
    pub stack: String,
    pub layer: Option<String>,
    pub component: Option<String>,
}

impl StackSelection {
    /// Build a selection, rejecting inconsistent combinations.
    ///
    /// Empty strings count as absent. A stack is always required and a
    /// component needs a layer.
    pub fn new(
        stack: impl Into<String>,
        layer: Option<String>,
        component: Option<String>,
    ) -> CoreResult<Self> {
        let stack = stack.into().trim().to_string();
        let layer = layer.map(|l| l.trim().to_string()).filter(|l| !l.is_empty());
        let component = component
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        if stack.is_empty() {
            let reason = match (&layer, &component) {
                (Some(layer), _) => format!("layer '{layer}' requires a stack to be specified"),
                (None, Some(component)) => {
                    format!("component '{component}' requires a stack to be specified")
                }
                (None, None) => "stack name is required".to_string(),
            };
            return Err(CoreError::InvalidSelection(reason));
        }

        if let (None, Some(component)) = (&layer, &component) {
            return Err(CoreError::InvalidSelection(format!(
                "component '{component}' requires a layer to be specified"
            )));
        }

        let names = [Some(&stack), layer.as_ref(), component.as_ref()];
        if let Some(bad) = names.into_iter().flatten().find(|n| !is_plain_name(n)) {
            return Err(CoreError::InvalidSelection(format!(
                "'{bad}' is not a single directory name"
            )));
        }

        Ok(Self {
            stack,
            layer,
            component,
        })
    }

    pub fn stack_only(stack: impl Into<String>) -> CoreResult<Self> {
        Self::new(stack, None, None)
    }
}

impl fmt::Display for StackSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stack)?;
        if let Some(layer) = &self.layer {
            write!(f, "/{layer}")?;
        }
        if let Some(component) = &self.component {
            write!(f, "/{component}")?;
        }
        Ok(())
    }
}

/// Validates a compiled configuration against the Terragrunt directory tree.
pub struct HierarchyValidator<'a> {
    config: &'a EnvConfig,
    base_dir: PathBuf,
}

impl<'a> HierarchyValidator<'a> {
    pub fn new(config: &'a EnvConfig, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Check every declared stack in order.
    ///
    /// A missing stack directory fails immediately. Inside an existing stack,
    /// all layer and component problems are gathered before failing.
    pub fn validate_stacks(&self) -> CoreResult<()> {
        if self.config.stacks.is_empty() {
            return Err(CoreError::NoStacks);
        }

        for stack in &self.config.stacks {
            require_plain_name(EntityKind::Stack, &stack.name)?;
            let stack_dir = self.base_dir.join(&stack.name);
            if !stack_dir.is_dir() {
                return Err(CoreError::MissingDirectory {
                    kind: EntityKind::Stack,
                    name: stack.name.clone(),
                    path: stack_dir,
                });
            }

            let issues = self.stack_issues(stack, &stack_dir);
            if !issues.is_empty() {
                return Err(CoreError::HierarchyMismatch {
                    stack: stack.name.clone(),
                    issues,
                });
            }
            debug!("Stack '{}' matches {}", stack.name, stack_dir.display());
        }

        info!("Validated {} stack(s)", self.config.stacks.len());
        Ok(())
    }

    fn stack_issues(&self, stack: &StackConfig, stack_dir: &Path) -> Vec<HierarchyIssue> {
        let mut issues = Vec::new();
        let mut seen_layers = HashSet::new();

        for layer in &stack.layers {
            if !is_plain_name(&layer.name) {
                issues.push(HierarchyIssue::InvalidName {
                    kind: EntityKind::Layer,
                    name: layer.name.clone(),
                });
                continue;
            }
            if !seen_layers.insert(layer.name.as_str()) {
                issues.push(HierarchyIssue::DuplicateLayer {
                    layer: layer.name.clone(),
                });
                continue;
            }

            let layer_dir = stack_dir.join(&layer.name);
            if !layer_dir.is_dir() {
                issues.push(HierarchyIssue::MissingLayerDir {
                    layer: layer.name.clone(),
                    path: layer_dir,
                });
                continue;
            }

            let mut seen_components = HashSet::new();
            for component in &layer.components {
                if !is_plain_name(&component.name) {
                    issues.push(HierarchyIssue::InvalidName {
                        kind: EntityKind::Component,
                        name: component.name.clone(),
                    });
                    continue;
                }
                if !seen_components.insert(component.name.as_str()) {
                    issues.push(HierarchyIssue::DuplicateComponent {
                        layer: layer.name.clone(),
                        component: component.name.clone(),
                    });
                    continue;
                }

                let component_dir = layer_dir.join(&component.name);
                if !component_dir.is_dir() {
                    issues.push(HierarchyIssue::MissingComponentDir {
                        layer: layer.name.clone(),
                        component: component.name.clone(),
                        path: component_dir,
                    });
                    continue;
                }

                let marker = component_dir.join(COMPONENT_MARKER);
                if !marker.is_file() {
                    issues.push(HierarchyIssue::MissingMarker {
                        layer: layer.name.clone(),
                        component: component.name.clone(),
                        path: marker,
                    });
                }
            }
        }

        issues
    }

    pub fn stack(&self, name: &str) -> Option<&'a StackConfig> {
        self.config.stack(name)
    }

    pub fn layer(&self, stack: &str, layer: &str) -> Option<&'a LayerConfig> {
        self.stack(stack)?.layer(layer)
    }

    pub fn component(&self, stack: &str, layer: &str, component: &str) -> Option<&'a ComponentConfig> {
        self.layer(stack, layer)?.component(component)
    }

    pub fn validate_requested_stack(&self, stack: &str) -> CoreResult<&'a StackConfig> {
        let config = self.stack(stack).ok_or_else(|| CoreError::UnknownEntity {
            kind: EntityKind::Stack,
            name: stack.to_string(),
            parent: "the configuration".to_string(),
        })?;
        require_dir(EntityKind::Stack, stack, self.base_dir.join(stack))?;
        Ok(config)
    }

    pub fn validate_requested_layer(&self, stack: &str, layer: &str) -> CoreResult<&'a LayerConfig> {
        let stack_config = self.validate_requested_stack(stack)?;
        let config = stack_config
            .layer(layer)
            .ok_or_else(|| CoreError::UnknownEntity {
                kind: EntityKind::Layer,
                name: layer.to_string(),
                parent: format!("stack '{stack}'"),
            })?;
        require_dir(EntityKind::Layer, layer, self.base_dir.join(stack).join(layer))?;
        Ok(config)
    }

    pub fn validate_requested_component(
        &self,
        stack: &str,
        layer: &str,
        component: &str,
    ) -> CoreResult<&'a ComponentConfig> {
        let layer_config = self.validate_requested_layer(stack, layer)?;
        let config = layer_config
            .component(component)
            .ok_or_else(|| CoreError::UnknownEntity {
                kind: EntityKind::Component,
                name: component.to_string(),
                parent: format!("layer '{layer}' of stack '{stack}'"),
            })?;

        let dir = self.base_dir.join(stack).join(layer).join(component);
        require_dir(EntityKind::Component, component, dir.clone())?;

        let marker = dir.join(COMPONENT_MARKER);
        if !marker.is_file() {
            return Err(CoreError::MissingMarker {
                name: component.to_string(),
                path: marker,
            });
        }
        Ok(config)
    }

    /// Point-validate whatever `selection` names.
    pub fn validate_selection(&self, selection: &StackSelection) -> CoreResult<()> {
        match (&selection.layer, &selection.component) {
            (Some(layer), Some(component)) => {
                self.validate_requested_component(&selection.stack, layer, component)?;
            }
            (Some(layer), None) => {
                self.validate_requested_layer(&selection.stack, layer)?;
            }
            _ => {
                self.validate_requested_stack(&selection.stack)?;
            }
        }
        Ok(())
    }
}

fn require_plain_name(kind: EntityKind, name: &str) -> CoreResult<()> {
    if is_plain_name(name) {
        Ok(())
    } else {
        Err(CoreError::InvalidName {
            kind,
            name: name.to_string(),
        })
    }
}

fn require_dir(kind: EntityKind, name: &str, path: PathBuf) -> CoreResult<()> {
    require_plain_name(kind, name)?;
    if path.is_dir() {
        Ok(())
    } else {
        Err(CoreError::MissingDirectory {
            kind,
            name: name.to_string(),
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_requires_stack() {
        let err = StackSelection::new("", Some("network".into()), None).unwrap_err();
        assert!(err.to_string().contains("layer 'network' requires a stack"));
        assert!(StackSelection::new("  ", None, None).is_err());
    }

    #[test]
    fn test_selection_component_requires_layer() {
        let err = StackSelection::new("core", None, Some("vpc".into())).unwrap_err();
        assert!(matches!(err, CoreError::InvalidSelection(_)));
        assert!(err.to_string().contains("requires a layer"));
    }

    #[test]
    fn test_selection_empty_strings_are_absent() {
        let selection = StackSelection::new("core", Some(String::new()), None).unwrap();
        assert_eq!(selection.layer, None);
        assert_eq!(selection.to_string(), "core");

        let full = StackSelection::new("core", Some("network".into()), Some("vpc".into())).unwrap();
        assert_eq!(full.to_string(), "core/network/vpc");
    }

    #[test]
    fn test_selection_rejects_path_like_names() {
        for bad in ["/etc", "..", "core/network"] {
            let err = StackSelection::new(bad, None, None).unwrap_err();
            assert!(matches!(err, CoreError::InvalidSelection(_)), "{bad} accepted");
        }
        assert!(StackSelection::new("core", Some("../x".into()), None).is_err());
    }

    #[test]
    fn test_declared_names_must_be_plain() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir(temp.path().join("core")).unwrap();

        let mut config = EnvConfig::default();
        config.stacks.push(StackConfig {
            name: "core".into(),
            layers: vec![LayerConfig {
                name: String::new(),
                ..Default::default()
            }],
            ..Default::default()
        });
        let err = HierarchyValidator::new(&config, temp.path())
            .validate_stacks()
            .unwrap_err();
        match err {
            CoreError::HierarchyMismatch { issues, .. } => assert_eq!(
                issues,
                vec![HierarchyIssue::InvalidName {
                    kind: EntityKind::Layer,
                    name: String::new(),
                }]
            ),
            other => panic!("unexpected error: {other}"),
        }

        config.stacks[0].name = "/etc".into();
        let err = HierarchyValidator::new(&config, temp.path())
            .validate_stacks()
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidName { kind: EntityKind::Stack, .. }));
        assert!(matches!(
            HierarchyValidator::new(&config, temp.path()).validate_requested_stack("/etc"),
            Err(CoreError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_no_stacks() {
        let config = EnvConfig::default();
        let err = HierarchyValidator::new(&config, "/nowhere")
            .validate_stacks()
            .unwrap_err();
        assert!(matches!(err, CoreError::NoStacks));
    }
}
