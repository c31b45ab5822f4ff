//! Base + target configuration merging.
//!
//! Overrides are section-level: when the target sets a section at all, the
//! whole section replaces the base one. Fields inside a section are never
//! inherited from the base, so a target `product` with only `name` set drops
//! the base product's `version` and `description`.

use tracing::debug;

use crate::models::{EnvConfig, Git, IaC, Product, RootConfig};

/// One row of the override table.
pub struct SectionOverride {
    pub name: &'static str,
    /// Whether the target sets this section (non-default / non-empty).
    pub is_set: fn(&EnvConfig) -> bool,
    /// Copy the section from `target` into `merged`.
    pub apply: fn(&mut EnvConfig, &EnvConfig),
}

/// Override rules, one per top-level section.
pub static SECTION_OVERRIDES: [SectionOverride; 7] = [
    SectionOverride {
        name: "config",
        is_set: |c| c.config != RootConfig::default(),
        apply: |m, t| m.config = t.config.clone(),
    },
    SectionOverride {
        name: "git",
        is_set: |c| c.git != Git::default(),
        apply: |m, t| m.git = t.git.clone(),
    },
    SectionOverride {
        name: "product",
        is_set: |c| c.product != Product::default(),
        apply: |m, t| m.product = t.product.clone(),
    },
    SectionOverride {
        name: "iac",
        is_set: |c| c.iac != IaC::default(),
        apply: |m, t| m.iac = t.iac.clone(),
    },
    SectionOverride {
        name: "providers",
        is_set: |c| !c.providers.is_empty(),
        apply: |m, t| m.providers = t.providers.clone(),
    },
    SectionOverride {
        name: "secrets",
        is_set: |c| !c.secrets.is_empty(),
        apply: |m, t| m.secrets = t.secrets.clone(),
    },
    SectionOverride {
        name: "stacks",
        is_set: |c| !c.stacks.is_empty(),
        apply: |m, t| m.stacks = t.stacks.clone(),
    },
];

/// Result of a merge, with the sections taken from the target.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub config: EnvConfig,
    pub overridden: Vec<&'static str>,
}

/// Merge `target` over `base`.
///
/// When either side is absent the other is returned as-is, without running
/// the per-section rules.
pub fn merge(base: Option<EnvConfig>, target: Option<EnvConfig>) -> Option<EnvConfig> {
    match (base, target) {
        (None, target) => target,
        (base, None) => base,
        (Some(base), Some(target)) => Some(merge_sections(&base, &target).config),
    }
}

/// Apply the override table to two present configurations.
pub fn merge_sections(base: &EnvConfig, target: &EnvConfig) -> MergeOutcome {
    let mut merged = base.clone();
    let mut overridden = Vec::new();

    for rule in &SECTION_OVERRIDES {
        if (rule.is_set)(target) {
            (rule.apply)(&mut merged, target);
            overridden.push(rule.name);
        }
    }

    debug!("Sections overridden by target: {:?}", overridden);

    MergeOutcome {
        config: merged,
        overridden,
    }
}
