//! Environment variable sources used during placeholder expansion.

use std::collections::{BTreeMap, HashMap};

/// Read-only view of environment variables.
///
/// Only non-empty values count as set, matching how placeholders treat
/// `FOO=` in a shell.
pub trait EnvSource: Send + Sync {
    /// Raw lookup, returning whatever the source holds.
    fn get(&self, name: &str) -> Option<String>;

    /// Lookup that treats empty values as unset.
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).filter(|value| !value.is_empty())
    }
}

/// The current process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        BTreeMap::get(self, name).cloned()
    }
}

/// Process environment first, then values loaded from dotenv files.
#[derive(Debug, Clone, Default)]
pub struct LayeredEnv {
    overlay: BTreeMap<String, String>,
}

impl LayeredEnv {
    pub fn new(overlay: BTreeMap<String, String>) -> Self {
        Self { overlay }
    }

    /// Values contributed by dotenv files.
    pub fn overlay(&self) -> &BTreeMap<String, String> {
        &self.overlay
    }

    /// Dotenv values a child process should receive on top of the inherited
    /// environment: only keys the process environment does not already set.
    pub fn child_overlay(&self) -> BTreeMap<String, String> {
        self.overlay
            .iter()
            .filter(|(name, _)| ProcessEnv.lookup(name).is_none())
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

impl EnvSource for LayeredEnv {
    fn get(&self, name: &str) -> Option<String> {
        ProcessEnv
            .lookup(name)
            .or_else(|| self.overlay.get(name).cloned())
    }
}
