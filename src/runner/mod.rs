//! Unit execution orchestration.
//!
//! The [`Orchestrator`] is the facade the CLI talks to: it resolves a set of
//! requested unit names into a dependency-ordered plan, executes the plan
//! with progress reporting and interactive failure recovery, and summarizes
//! the outcome. The registry is injected, so callers (and tests) control
//! exactly which units exist.

pub mod executor;
pub mod progress;
pub mod recovery;
pub mod resolver;
pub mod summary;

pub use executor::ExecutionEngine;
pub use progress::{ProgressObserver, ProgressThrottle, MIN_DELIVERY_INTERVAL};
pub use recovery::{prompt_recovery, RecoveryAction, RecoveryDecider};
pub use resolver::{DependencyResolver, ResolvedPlan};
pub use summary::{summarize, ExecutionSummary};

use std::collections::BTreeMap;

use crate::config::Config;
use crate::error::Result;
use crate::unit::{UnitOptions, UnitRegistry, UnitResult};

/// Coordinates resolution, execution, and summarization for one registry.
///
/// Orchestration runs are fully sequential; each `execute` call builds its
/// own unit instances and execution state, so an `Orchestrator` can be
/// reused across consecutive runs.
pub struct Orchestrator<'a> {
    registry: &'a UnitRegistry,
    config: &'a Config,
    options: UnitOptions,
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator over an injected registry and configuration.
    pub fn new(registry: &'a UnitRegistry, config: &'a Config) -> Self {
        Self::with_options(registry, config, UnitOptions::default())
    }

    /// Create an orchestrator with explicit per-run unit options.
    pub fn with_options(
        registry: &'a UnitRegistry,
        config: &'a Config,
        options: UnitOptions,
    ) -> Self {
        Self {
            registry,
            config,
            options,
        }
    }

    /// Resolve the requested unit names into an execution plan.
    pub fn resolve(&self, requested: &[String]) -> Result<ResolvedPlan> {
        let mut resolver = DependencyResolver::new(self.registry, self.config, self.options);
        resolver.resolve(requested)
    }

    /// Resolve and execute the requested units.
    ///
    /// Fails only on resolution errors (unknown unit, dependency cycle).
    /// Execution-time failures are recovered through `decider` — or the
    /// default policy when none is supplied — and land in the result map.
    pub fn execute(
        &self,
        requested: &[String],
        observer: Option<&mut ProgressObserver<'_>>,
        decider: Option<&mut RecoveryDecider<'_>>,
    ) -> Result<BTreeMap<String, UnitResult>> {
        let mut resolver = DependencyResolver::new(self.registry, self.config, self.options);
        let plan = resolver.resolve(requested)?;
        let mut engine = ExecutionEngine::new(resolver.into_units());
        Ok(engine.execute(&plan, observer, decider))
    }

    /// Reduce a result map into aggregate counts.
    pub fn summarize(&self, results: &BTreeMap<String, UnitResult>) -> ExecutionSummary {
        summarize(results)
    }

    /// Check requested names against the registry without instantiating.
    ///
    /// Returns the invalid names as originally provided.
    pub fn validate(&self, requested: &[String]) -> (bool, Vec<String>) {
        let invalid: Vec<String> = requested
            .iter()
            .filter(|name| !self.registry.contains(name))
            .cloned()
            .collect();
        (invalid.is_empty(), invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CairnError;
    use crate::unit::{ProbeResult, ProgressFn, Unit};

    struct TrivialUnit;

    impl Unit for TrivialUnit {
        fn name(&self) -> &str {
            "trivial"
        }

        fn description(&self) -> &str {
            "does very little"
        }

        fn probe(&self) -> ProbeResult {
            ProbeResult::missing("absent")
        }

        fn execute(&mut self, _progress: &mut ProgressFn<'_>) -> Result<UnitResult> {
            Ok(UnitResult::success("done"))
        }
    }

    fn registry() -> UnitRegistry {
        let mut registry = UnitRegistry::new();
        registry.register("trivial", |_c, _o| Box::new(TrivialUnit));
        registry
    }

    #[test]
    fn validate_reports_unknown_names_as_provided() {
        let registry = registry();
        let config = Config::default();
        let orchestrator = Orchestrator::new(&registry, &config);

        let (ok, invalid) =
            orchestrator.validate(&["TRIVIAL".to_string(), "Nginx".to_string()]);
        assert!(!ok);
        assert_eq!(invalid, vec!["Nginx".to_string()]);
    }

    #[test]
    fn execute_fails_on_unknown_unit_before_running_anything() {
        let registry = registry();
        let config = Config::default();
        let orchestrator = Orchestrator::new(&registry, &config);

        let err = orchestrator
            .execute(&["nginx".to_string()], None, None)
            .unwrap_err();
        assert!(matches!(err, CairnError::UnknownUnit { .. }));
    }

    #[test]
    fn execute_and_summarize_round_trip() {
        let registry = registry();
        let config = Config::default();
        let orchestrator = Orchestrator::new(&registry, &config);

        let results = orchestrator
            .execute(&["trivial".to_string()], None, None)
            .unwrap();
        let summary = orchestrator.summarize(&results);
        assert_eq!(summary.total, 1);
        assert_eq!(summary.successful, 1);
    }
}
