//! Dependency resolution and execution ordering.
//!
//! Resolution starts from the requested unit names, discovers the transitive
//! dependency closure breadth-first (instantiating units along the way), and
//! orders the discovered set with Kahn's algorithm. Optional dependencies of
//! requested units are pulled into the plan and remembered separately, since
//! they get a softer default recovery policy.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::config::Config;
use crate::error::{CairnError, Result};
use crate::unit::{normalize_unit_name, Unit, UnitOptions, UnitRegistry};

/// The immutable execution plan produced by one resolution.
#[derive(Debug, Clone)]
pub struct ResolvedPlan {
    /// Unit names in topological order (dependencies before dependents).
    ///
    /// Relative order among independent units is unspecified; callers must
    /// not depend on it.
    pub order: Vec<String>,
    /// Names included solely as optional dependencies of requested units.
    pub auto_optional: HashSet<String>,
}

/// Discovers the dependency closure and computes a valid execution order.
///
/// The resolver owns the per-run unit instance cache; after resolution the
/// instances are handed to the execution engine via [`into_units`].
///
/// [`into_units`]: DependencyResolver::into_units
pub struct DependencyResolver<'a> {
    registry: &'a UnitRegistry,
    config: &'a Config,
    options: UnitOptions,
    units: HashMap<String, Box<dyn Unit>>,
}

impl<'a> DependencyResolver<'a> {
    /// Create a resolver for one orchestration run.
    pub fn new(registry: &'a UnitRegistry, config: &'a Config, options: UnitOptions) -> Self {
        Self {
            registry,
            config,
            options,
            units: HashMap::new(),
        }
    }

    /// Instantiate a unit if not already cached for this run.
    fn load_unit(&mut self, name: &str) -> Result<&dyn Unit> {
        if !self.units.contains_key(name) {
            let unit = self
                .registry
                .instantiate(name, self.config, self.options)
                .ok_or_else(|| CairnError::UnknownUnit {
                    name: name.to_string(),
                    available: self.registry.names(),
                })?;
            self.units.insert(name.to_string(), unit);
        }
        Ok(self.units[name].as_ref())
    }

    /// Resolve the requested names into a topologically ordered plan.
    ///
    /// Fails with [`CairnError::UnknownUnit`] when a requested or declared
    /// name is not registered, and [`CairnError::CircularDependency`] when
    /// the discovered subgraph contains a cycle.
    pub fn resolve(&mut self, requested: &[String]) -> Result<ResolvedPlan> {
        let normalized: Vec<String> = requested
            .iter()
            .map(|name| normalize_unit_name(name))
            .collect();
        let requested_set: HashSet<String> = normalized.iter().cloned().collect();

        // Reverse adjacency: dependency name -> units that depend on it.
        let mut dependents: HashMap<String, HashSet<String>> = HashMap::new();
        // Number of dependencies each unit declares (deduplicated).
        let mut in_degree: HashMap<String, usize> = HashMap::new();
        let mut auto_optional: HashSet<String> = HashSet::new();

        // Breadth-first discovery of the transitive closure.
        let mut discovered: Vec<String> = Vec::new();
        let mut processed: HashSet<String> = HashSet::new();
        let mut to_process: VecDeque<String> = normalized.into();

        while let Some(name) = to_process.pop_front() {
            if !processed.insert(name.clone()) {
                continue;
            }
            discovered.push(name.clone());
            dependents.entry(name.clone()).or_default();
            in_degree.entry(name.clone()).or_insert(0);

            let dependencies = self.load_unit(&name)?.dependencies();
            for dep in dependencies {
                let dep_name = normalize_unit_name(&dep.unit);

                if !dep.required && !requested_set.contains(&dep_name) {
                    auto_optional.insert(dep_name.clone());
                }

                if !processed.contains(&dep_name) {
                    to_process.push_back(dep_name.clone());
                }

                // Duplicate declarations of the same dependency count once.
                if dependents.entry(dep_name).or_default().insert(name.clone()) {
                    *in_degree.entry(name.clone()).or_insert(0) += 1;
                }
            }
        }

        // Kahn's algorithm, seeded in discovery order.
        let mut queue: VecDeque<String> = discovered
            .iter()
            .filter(|name| in_degree.get(*name).copied().unwrap_or(0) == 0)
            .cloned()
            .collect();
        let mut order = Vec::with_capacity(discovered.len());

        while let Some(name) = queue.pop_front() {
            order.push(name.clone());

            if let Some(deps) = dependents.get(&name) {
                for dependent in deps {
                    if let Some(degree) = in_degree.get_mut(dependent) {
                        *degree -= 1;
                        if *degree == 0 {
                            queue.push_back(dependent.clone());
                        }
                    }
                }
            }
        }

        if order.len() != discovered.len() {
            let emitted: HashSet<&String> = order.iter().collect();
            let mut units: Vec<String> = discovered
                .iter()
                .filter(|name| !emitted.contains(name))
                .cloned()
                .collect();
            units.sort();
            return Err(CairnError::CircularDependency { units });
        }

        Ok(ResolvedPlan {
            order,
            auto_optional,
        })
    }

    /// Hand the instantiated units over to the execution engine.
    pub fn into_units(self) -> HashMap<String, Box<dyn Unit>> {
        self.units
    }
}
