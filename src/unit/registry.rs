//! Unit registry: name→factory lookup.
//!
//! The registry is an explicit value injected into the orchestrator rather
//! than a process-global table, so tests can build isolated registries with
//! purpose-built units.

use std::collections::BTreeMap;

use crate::config::Config;
use crate::unit::Unit;

/// Per-run options forwarded to unit factories.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitOptions {
    /// Enable verbose operation detail in progress reporting.
    pub verbose: bool,
    /// Simulate execution without making changes.
    pub dry_run: bool,
}

/// Factory producing a unit instance for one orchestration run.
pub type UnitFactory = Box<dyn Fn(&Config, UnitOptions) -> Box<dyn Unit> + Send + Sync>;

/// Normalize a unit name for consistent lookup.
///
/// Lookup keys are case- and surrounding-whitespace-insensitive.
pub fn normalize_unit_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Name→factory lookup producing unit instances.
///
/// Instances produced from one registry are scoped to a single orchestration
/// run; the registry itself holds no per-run state.
#[derive(Default)]
pub struct UnitRegistry {
    factories: BTreeMap<String, UnitFactory>,
}

impl UnitRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit factory under a normalized name.
    ///
    /// A later registration under the same name replaces the earlier one.
    pub fn register<F>(&mut self, name: impl AsRef<str>, factory: F)
    where
        F: Fn(&Config, UnitOptions) -> Box<dyn Unit> + Send + Sync + 'static,
    {
        self.factories
            .insert(normalize_unit_name(name.as_ref()), Box::new(factory));
    }

    /// Whether a unit name (after normalization) is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&normalize_unit_name(name))
    }

    /// Instantiate a unit by name for one run.
    pub fn instantiate(
        &self,
        name: &str,
        config: &Config,
        options: UnitOptions,
    ) -> Option<Box<dyn Unit>> {
        self.factories
            .get(&normalize_unit_name(name))
            .map(|factory| factory(config, options))
    }

    /// All registered unit names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Number of registered units.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for UnitRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitRegistry")
            .field("units", &self.names())
            .finish()
    }
}
