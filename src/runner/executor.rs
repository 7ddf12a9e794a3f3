//! The execution engine.
//!
//! Walks a resolved plan strictly in order, one unit at a time. Each unit
//! goes through the same state machine:
//!
//! 1. **Probe** — already satisfied? Record an idempotence skip and move on
//!    without ever invoking the unit.
//! 2. **Dependency gate** — every *required* dependency must have succeeded
//!    (or been skipped as already satisfied). Otherwise the unit is blocked.
//! 3. **Attempt loop** — execute the unit; on failure ask the recovery
//!    decider whether to retry, skip, or abort. Faults raised by a unit are
//!    converted into failed results, never propagated out of the run.
//!
//! The engine itself is infallible: resolution errors are the only way an
//! orchestration call fails, and those happen before execution begins.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::unit::{normalize_unit_name, Unit, UnitResult, UnitStatus};

use super::progress::{scale_unit_progress, ProgressObserver, ProgressThrottle};
use super::recovery::{RecoveryAction, RecoveryDecider};
use super::resolver::ResolvedPlan;

/// Running tally for one `execute` call.
struct ExecutionContext {
    total: usize,
    completed: usize,
    results: BTreeMap<String, UnitResult>,
}

impl ExecutionContext {
    fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            results: BTreeMap::new(),
        }
    }

    fn overall_progress(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Executes a resolved plan, owning the unit instances for the run.
pub struct ExecutionEngine {
    units: HashMap<String, Box<dyn Unit>>,
}

impl ExecutionEngine {
    /// Create an engine from the resolver's instance cache.
    pub fn new(units: HashMap<String, Box<dyn Unit>>) -> Self {
        Self { units }
    }

    /// Execute every plan member in order.
    ///
    /// Returns the per-unit result map. On an Abort decision the map is
    /// returned as-is: plan members after the abort point are absent. All
    /// other failures are recorded and recovered locally, so this call
    /// itself cannot fail.
    pub fn execute(
        &mut self,
        plan: &ResolvedPlan,
        observer: Option<&mut ProgressObserver<'_>>,
        mut decider: Option<&mut RecoveryDecider<'_>>,
    ) -> BTreeMap<String, UnitResult> {
        let mut context = ExecutionContext::new(plan.order.len());
        let mut throttle = observer.map(|o| ProgressThrottle::new(o));

        for name in &plan.order {
            let base = context.overall_progress();
            report(
                &mut throttle,
                base,
                &format!("Processing unit: {name}"),
                None,
                false,
            );

            let Some(unit) = self.units.get_mut(name) else {
                // Plan and instance cache are produced together by the
                // resolver; a missing entry means they were mixed across runs.
                warn!(unit = %name, "no instance for plan member");
                let result = UnitResult::blocked(
                    format!("No instance of '{name}' in this run"),
                    None,
                );
                record_skip(&mut context, name, result);
                report_milestone(&mut throttle, &context, &format!("Skipped {name}"));
                continue;
            };

            // Probe: the unit's execute capability is never invoked when the
            // target state is already present.
            let probe = unit.probe();
            if probe.satisfied {
                debug!(unit = %name, "already satisfied, skipping");
                let message = probe.message.clone();
                record_skip(&mut context, name, UnitResult::already_satisfied(probe.message));
                report_milestone(
                    &mut throttle,
                    &context,
                    &format!("Skipped {name}: {message}"),
                );
                continue;
            }

            // Dependency gate: required dependencies must have succeeded or
            // been skipped as already satisfied. Skips that followed a
            // failure block dependents, transitively.
            let blocked_on: Vec<String> = unit
                .dependencies()
                .iter()
                .filter(|dep| dep.required)
                .map(|dep| normalize_unit_name(&dep.unit))
                .filter(|dep_name| {
                    !context
                        .results
                        .get(dep_name)
                        .is_some_and(UnitResult::satisfies_dependents)
                })
                .collect();

            if !blocked_on.is_empty() {
                let list = blocked_on.join(", ");
                debug!(unit = %name, blocked_on = %list, "required dependencies not satisfied");
                let result = UnitResult::blocked(
                    format!("Skipped due to failed required dependencies: {list}"),
                    Some(unit.recovery_hint()),
                );
                record_skip(&mut context, name, result);
                report_milestone(
                    &mut throttle,
                    &context,
                    &format!("Skipped {name}: required dependencies failed ({list})"),
                );
                continue;
            }

            // Attempt loop: retries are always operator-driven; the engine
            // never re-runs a unit on its own.
            loop {
                let attempt = {
                    let completed = context.completed;
                    let total = context.total;
                    let throttle = &mut throttle;
                    let mut unit_progress = |percent: f64, message: &str, detail: Option<&str>| {
                        if let Some(t) = throttle.as_mut() {
                            t.maybe_deliver(
                                scale_unit_progress(percent, completed, total),
                                &format!("[{name}] {message}"),
                                detail,
                                false,
                            );
                        }
                    };
                    unit.execute(&mut unit_progress)
                };

                let mut attempt = match attempt {
                    Ok(result) => result,
                    Err(fault) => {
                        warn!(unit = %name, error = %fault, "unit execution faulted");
                        UnitResult::failure(fault.to_string(), Some(unit.recovery_hint()))
                    }
                };

                match attempt.status {
                    UnitStatus::Success => {
                        context.results.insert(name.clone(), attempt);
                        context.completed += 1;
                        report_milestone(&mut throttle, &context, &format!("Completed: {name}"));
                        break;
                    }
                    UnitStatus::Skipped => {
                        // The unit declined on its own; treat as completed.
                        let message = attempt.message.clone();
                        record_skip(&mut context, name, attempt);
                        report_milestone(
                            &mut throttle,
                            &context,
                            &format!("Skipped {name}: {message}"),
                        );
                        break;
                    }
                    UnitStatus::Failed => {
                        if attempt.recovery_hint.is_none() {
                            attempt.recovery_hint = Some(unit.recovery_hint());
                        }
                        context.results.insert(name.clone(), attempt.clone());
                        report(
                            &mut throttle,
                            base,
                            &format!("Failed: {name}"),
                            attempt.details.as_deref(),
                            true,
                        );

                        let action = match decider.as_mut() {
                            Some(decide) => decide(name, &attempt),
                            // Default policy: units pulled in only as
                            // optional dependencies are skipped; requested
                            // or required units abort the run.
                            None if plan.auto_optional.contains(name) => RecoveryAction::Skip,
                            None => RecoveryAction::Abort,
                        };

                        match action {
                            RecoveryAction::Retry => continue,
                            RecoveryAction::Skip => {
                                let mut message =
                                    format!("Skipped after failure: {}", attempt.message);
                                if let Some(hint) = &attempt.recovery_hint {
                                    message.push_str(&format!(" (try: {hint})"));
                                }
                                let result = UnitResult::skipped_after_failure(message, &attempt);
                                let message = result.message.clone();
                                record_skip(&mut context, name, result);
                                report_milestone(
                                    &mut throttle,
                                    &context,
                                    &format!("Skipped {name}: {message}"),
                                );
                                break;
                            }
                            RecoveryAction::Abort => {
                                report(&mut throttle, 1.0, "Execution aborted", None, true);
                                return context.results;
                            }
                        }
                    }
                }
            }
        }

        report(&mut throttle, 1.0, "Execution complete", None, true);
        context.results
    }
}

/// Record a skipped unit and count it as completed.
fn record_skip(context: &mut ExecutionContext, name: &str, result: UnitResult) {
    context.results.insert(name.to_string(), result);
    context.completed += 1;
}

/// Forced progress update at the current completion fraction.
fn report_milestone(
    throttle: &mut Option<ProgressThrottle<'_, '_>>,
    context: &ExecutionContext,
    message: &str,
) {
    report(throttle, context.overall_progress(), message, None, true);
}

fn report(
    throttle: &mut Option<ProgressThrottle<'_, '_>>,
    percent: f64,
    message: &str,
    detail: Option<&str>,
    force: bool,
) {
    if let Some(t) = throttle.as_mut() {
        t.maybe_deliver(percent, message, detail, force);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::{HashSet, VecDeque};
    use std::rc::Rc;

    use crate::error::Result;
    use crate::unit::{Dependency, ProbeResult, ProgressFn, SkipReason};

    /// Scripted unit for engine tests: fixed probe answer and a queue of
    /// per-attempt outcomes.
    struct ScriptedUnit {
        name: &'static str,
        dependencies: Vec<Dependency>,
        satisfied: bool,
        outcomes: VecDeque<Result<UnitResult>>,
        executions: Rc<RefCell<usize>>,
    }

    impl ScriptedUnit {
        fn succeeding(name: &'static str, dependencies: Vec<Dependency>) -> Self {
            Self::with_outcomes(name, dependencies, vec![Ok(UnitResult::success("done"))])
        }

        fn with_outcomes(
            name: &'static str,
            dependencies: Vec<Dependency>,
            outcomes: Vec<Result<UnitResult>>,
        ) -> Self {
            Self {
                name,
                dependencies,
                satisfied: false,
                outcomes: outcomes.into(),
                executions: Rc::new(RefCell::new(0)),
            }
        }

        fn already_satisfied(name: &'static str) -> Self {
            let mut unit = Self::succeeding(name, vec![]);
            unit.satisfied = true;
            unit
        }

        fn execution_counter(&self) -> Rc<RefCell<usize>> {
            Rc::clone(&self.executions)
        }
    }

    impl Unit for ScriptedUnit {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "scripted"
        }

        fn dependencies(&self) -> Vec<Dependency> {
            self.dependencies.clone()
        }

        fn probe(&self) -> ProbeResult {
            if self.satisfied {
                ProbeResult::satisfied("already configured")
            } else {
                ProbeResult::missing("not configured")
            }
        }

        fn execute(&mut self, progress: &mut ProgressFn<'_>) -> Result<UnitResult> {
            *self.executions.borrow_mut() += 1;
            progress(0.0, "starting", None);
            progress(1.0, "finished", None);
            self.outcomes
                .pop_front()
                .unwrap_or_else(|| Ok(UnitResult::success("done")))
        }
    }

    fn engine_with(units: Vec<ScriptedUnit>) -> (ExecutionEngine, ResolvedPlan) {
        let order: Vec<String> = units.iter().map(|u| u.name.to_string()).collect();
        let map: HashMap<String, Box<dyn Unit>> = units
            .into_iter()
            .map(|u| (u.name.to_string(), Box::new(u) as Box<dyn Unit>))
            .collect();
        (
            ExecutionEngine::new(map),
            ResolvedPlan {
                order,
                auto_optional: HashSet::new(),
            },
        )
    }

    #[test]
    fn satisfied_probe_skips_without_executing() {
        let unit = ScriptedUnit::already_satisfied("apt");
        let counter = unit.execution_counter();
        let (mut engine, plan) = engine_with(vec![unit]);

        let results = engine.execute(&plan, None, None);

        assert_eq!(*counter.borrow(), 0);
        let result = &results["apt"];
        assert_eq!(result.status, UnitStatus::Skipped);
        assert_eq!(result.skip_reason, Some(SkipReason::AlreadySatisfied));
    }

    #[test]
    fn satisfied_dependency_does_not_block_dependent() {
        let apt = ScriptedUnit::already_satisfied("apt");
        let ssh = ScriptedUnit::succeeding("ssh", vec![Dependency::required("apt")]);
        let (mut engine, plan) = engine_with(vec![apt, ssh]);

        let results = engine.execute(&plan, None, None);

        assert_eq!(results["ssh"].status, UnitStatus::Success);
    }

    #[test]
    fn failed_required_dependency_blocks_dependent() {
        let apt = ScriptedUnit::with_outcomes(
            "apt",
            vec![],
            vec![Ok(UnitResult::failure("mirror down", None))],
        );
        let ssh = ScriptedUnit::succeeding("ssh", vec![Dependency::required("apt")]);
        let ssh_counter = ssh.execution_counter();
        let (mut engine, plan) = engine_with(vec![apt, ssh]);

        let mut decider = |_: &str, _: &UnitResult| RecoveryAction::Skip;
        let results = engine.execute(&plan, None, Some(&mut decider));

        assert_eq!(*ssh_counter.borrow(), 0);
        let ssh_result = &results["ssh"];
        assert_eq!(ssh_result.status, UnitStatus::Skipped);
        assert_eq!(ssh_result.skip_reason, Some(SkipReason::DependencyBlocked));
        assert!(ssh_result.message.contains("apt"));
    }

    #[test]
    fn blocking_propagates_transitively() {
        let apt = ScriptedUnit::with_outcomes(
            "apt",
            vec![],
            vec![Ok(UnitResult::failure("mirror down", None))],
        );
        let ssh = ScriptedUnit::succeeding("ssh", vec![Dependency::required("apt")]);
        let harden = ScriptedUnit::succeeding("harden", vec![Dependency::required("ssh")]);
        let (mut engine, plan) = engine_with(vec![apt, ssh, harden]);

        let mut decider = |_: &str, _: &UnitResult| RecoveryAction::Skip;
        let results = engine.execute(&plan, None, Some(&mut decider));

        // ssh was blocked, so harden is blocked in turn
        assert_eq!(
            results["harden"].skip_reason,
            Some(SkipReason::DependencyBlocked)
        );
    }

    #[test]
    fn optional_dependency_failure_does_not_block() {
        let desktop = ScriptedUnit::with_outcomes(
            "desktop",
            vec![],
            vec![Ok(UnitResult::failure("no packages", None))],
        );
        let gui = ScriptedUnit::succeeding("gui", vec![Dependency::optional("desktop")]);
        let (mut engine, plan) = engine_with(vec![desktop, gui]);

        let mut decider = |_: &str, _: &UnitResult| RecoveryAction::Skip;
        let results = engine.execute(&plan, None, Some(&mut decider));

        assert_eq!(results["gui"].status, UnitStatus::Success);
    }

    #[test]
    fn fault_is_converted_to_failed_result() {
        let unit = ScriptedUnit::with_outcomes(
            "apt",
            vec![],
            vec![Err(crate::error::CairnError::CommandFailed {
                command: "apt-get update".into(),
                code: Some(100),
            })],
        );
        let (mut engine, plan) = engine_with(vec![unit]);

        let mut seen_failure = None;
        let mut decider = |name: &str, result: &UnitResult| {
            seen_failure = Some((name.to_string(), result.clone()));
            RecoveryAction::Skip
        };
        let results = engine.execute(&plan, None, Some(&mut decider));

        let (failed_name, failure) = seen_failure.unwrap();
        assert_eq!(failed_name, "apt");
        assert_eq!(failure.status, UnitStatus::Failed);
        assert!(failure.message.contains("apt-get update"));
        assert!(failure.recovery_hint.is_some());
        assert_eq!(results["apt"].skip_reason, Some(SkipReason::AfterFailure));
    }

    #[test]
    fn retry_reinvokes_execute() {
        let unit = ScriptedUnit::with_outcomes(
            "apt",
            vec![],
            vec![
                Ok(UnitResult::failure("transient", None)),
                Ok(UnitResult::success("done on retry")),
            ],
        );
        let counter = unit.execution_counter();
        let (mut engine, plan) = engine_with(vec![unit]);

        let mut decider = |_: &str, _: &UnitResult| RecoveryAction::Retry;
        let results = engine.execute(&plan, None, Some(&mut decider));

        assert_eq!(*counter.borrow(), 2);
        assert_eq!(results["apt"].status, UnitStatus::Success);
    }

    #[test]
    fn abort_truncates_result_map() {
        let first = ScriptedUnit::with_outcomes(
            "first",
            vec![],
            vec![Ok(UnitResult::failure("boom", None))],
        );
        let second = ScriptedUnit::succeeding("second", vec![]);
        let second_counter = second.execution_counter();
        let (mut engine, plan) = engine_with(vec![first, second]);

        let mut decider = |_: &str, _: &UnitResult| RecoveryAction::Abort;
        let results = engine.execute(&plan, None, Some(&mut decider));

        assert_eq!(results.len(), 1);
        assert_eq!(results["first"].status, UnitStatus::Failed);
        assert!(!results.contains_key("second"));
        assert_eq!(*second_counter.borrow(), 0);
    }

    #[test]
    fn default_policy_skips_auto_included_optionals() {
        let desktop = ScriptedUnit::with_outcomes(
            "desktop",
            vec![],
            vec![Ok(UnitResult::failure("no packages", None))],
        );
        let gui = ScriptedUnit::succeeding("gui", vec![Dependency::optional("desktop")]);
        let (mut engine, mut plan) = engine_with(vec![desktop, gui]);
        plan.auto_optional.insert("desktop".to_string());

        let results = engine.execute(&plan, None, None);

        assert_eq!(results["desktop"].skip_reason, Some(SkipReason::AfterFailure));
        assert_eq!(results["gui"].status, UnitStatus::Success);
    }

    #[test]
    fn default_policy_aborts_for_requested_units() {
        let apt = ScriptedUnit::with_outcomes(
            "apt",
            vec![],
            vec![Ok(UnitResult::failure("boom", None))],
        );
        let ssh = ScriptedUnit::succeeding("ssh", vec![]);
        let (mut engine, plan) = engine_with(vec![apt, ssh]);

        let results = engine.execute(&plan, None, None);

        assert_eq!(results.len(), 1);
        assert_eq!(results["apt"].status, UnitStatus::Failed);
    }

    #[test]
    fn final_update_is_forced_and_complete() {
        let unit = ScriptedUnit::succeeding("apt", vec![]);
        let (mut engine, plan) = engine_with(vec![unit]);

        let mut deliveries: Vec<(f64, String)> = Vec::new();
        let mut observer =
            |p: f64, m: &str, _d: Option<&str>| deliveries.push((p, m.to_string()));
        engine.execute(&plan, Some(&mut observer), None);

        let (percent, message) = deliveries.last().unwrap();
        assert_eq!(*percent, 1.0);
        assert_eq!(message, "Execution complete");
    }

    #[test]
    fn empty_plan_still_reports_completion() {
        let (mut engine, _) = engine_with(vec![]);
        let plan = ResolvedPlan {
            order: vec![],
            auto_optional: HashSet::new(),
        };

        let mut deliveries = Vec::new();
        let mut observer = |p: f64, _m: &str, _d: Option<&str>| deliveries.push(p);
        let results = engine.execute(&plan, Some(&mut observer), None);

        assert!(results.is_empty());
        assert_eq!(deliveries.last(), Some(&1.0));
    }

    #[test]
    fn unit_progress_is_scaled_into_overall_slice() {
        let first = ScriptedUnit::succeeding("first", vec![]);
        let second = ScriptedUnit::succeeding("second", vec![]);
        let (mut engine, plan) = engine_with(vec![first, second]);

        let mut deliveries: Vec<f64> = Vec::new();
        let mut observer = |p: f64, _m: &str, _d: Option<&str>| deliveries.push(p);
        engine.execute(&plan, Some(&mut observer), None);

        assert!(deliveries.iter().all(|p| (0.0..=1.0).contains(p)));
        // Non-decreasing in delivery order
        for pair in deliveries.windows(2) {
            assert!(pair[1] >= pair[0], "progress went backwards: {deliveries:?}");
        }
    }
}
