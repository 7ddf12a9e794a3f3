//! Unit capability interface and result model.
//!
//! A *unit* is an independently implemented piece of setup work: it carries
//! a name, dependency declarations, an idempotence probe, and an execute
//! action. The orchestrator never looks past this interface.
//!
//! # Result model
//!
//! [`UnitStatus`] has three values, but `Skipped` is deliberately
//! sub-classified by [`SkipReason`]: a unit skipped because its target state
//! was *already satisfied* counts as success for dependency gating, while a
//! unit skipped *after a failure* (or because its own dependencies failed)
//! blocks its dependents. That asymmetry is what makes re-runs idempotent.

pub mod registry;

pub use registry::{normalize_unit_name, UnitOptions, UnitRegistry};

use serde::Serialize;

use crate::error::Result;

/// Execution status for a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    /// Unit executed successfully.
    Success,
    /// Unit execution failed.
    Failed,
    /// Unit was not executed; see [`SkipReason`].
    Skipped,
}

/// Why a unit was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The probe reported the target state already present.
    AlreadySatisfied,
    /// A required dependency did not succeed.
    DependencyBlocked,
    /// The unit failed and the operator chose to skip it.
    AfterFailure,
}

/// A dependency declaration between units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Name of the depended-on unit.
    pub unit: String,
    /// Required dependencies must succeed (or be already satisfied) before
    /// the declaring unit runs. Optional dependencies are auto-included in
    /// the plan but never block the declaring unit.
    pub required: bool,
}

impl Dependency {
    /// Declare a required dependency.
    pub fn required(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            required: true,
        }
    }

    /// Declare an optional dependency.
    pub fn optional(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            required: false,
        }
    }
}

/// Outcome of a unit's idempotence probe.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    /// Whether the unit's target state is already present.
    pub satisfied: bool,
    /// Human-readable explanation of what was detected (or missing).
    pub message: String,
}

impl ProbeResult {
    /// The target state is already present.
    pub fn satisfied(message: impl Into<String>) -> Self {
        Self {
            satisfied: true,
            message: message.into(),
        }
    }

    /// The target state is missing; the unit should run.
    pub fn missing(message: impl Into<String>) -> Self {
        Self {
            satisfied: false,
            message: message.into(),
        }
    }
}

/// Result of a unit execution (or an engine decision about a unit).
#[derive(Debug, Clone, Serialize)]
pub struct UnitResult {
    /// Final status.
    pub status: UnitStatus,
    /// Human-readable result message.
    pub message: String,
    /// Additional diagnostic detail (e.g. captured command output).
    pub details: Option<String>,
    /// Suggested remediation command, attached on failure.
    pub recovery_hint: Option<String>,
    /// Sub-classification when `status` is `Skipped`.
    pub skip_reason: Option<SkipReason>,
}

impl UnitResult {
    /// Successful execution.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: UnitStatus::Success,
            message: message.into(),
            details: None,
            recovery_hint: None,
            skip_reason: None,
        }
    }

    /// Failed execution.
    pub fn failure(message: impl Into<String>, recovery_hint: Option<String>) -> Self {
        Self {
            status: UnitStatus::Failed,
            message: message.into(),
            details: None,
            recovery_hint,
            skip_reason: None,
        }
    }

    /// Skipped because the probe reported the target state present.
    pub fn already_satisfied(message: impl Into<String>) -> Self {
        Self {
            status: UnitStatus::Skipped,
            message: message.into(),
            details: None,
            recovery_hint: None,
            skip_reason: Some(SkipReason::AlreadySatisfied),
        }
    }

    /// Skipped because required dependencies did not succeed.
    pub fn blocked(message: impl Into<String>, recovery_hint: Option<String>) -> Self {
        Self {
            status: UnitStatus::Skipped,
            message: message.into(),
            details: None,
            recovery_hint,
            skip_reason: Some(SkipReason::DependencyBlocked),
        }
    }

    /// Skipped by an operator decision after a failed attempt.
    pub fn skipped_after_failure(message: impl Into<String>, failure: &UnitResult) -> Self {
        Self {
            status: UnitStatus::Skipped,
            message: message.into(),
            details: failure.details.clone(),
            recovery_hint: failure.recovery_hint.clone(),
            skip_reason: Some(SkipReason::AfterFailure),
        }
    }

    /// Attach diagnostic detail.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Whether this result counts as success for dependency gating.
    ///
    /// `Success` and `Skipped(AlreadySatisfied)` satisfy dependents; every
    /// other outcome blocks them.
    pub fn satisfies_dependents(&self) -> bool {
        match self.status {
            UnitStatus::Success => true,
            UnitStatus::Skipped => self.skip_reason == Some(SkipReason::AlreadySatisfied),
            UnitStatus::Failed => false,
        }
    }
}

/// Progress reporting function handed to a unit's execute action.
///
/// Arguments: local percent in `[0.0, 1.0]` (monotonically non-decreasing),
/// a status message, and optional verbose operation detail.
pub type ProgressFn<'a> = dyn FnMut(f64, &str, Option<&str>) + 'a;

/// The capability interface implemented by every setup unit.
///
/// Units are instantiated once per orchestration run through the
/// [`UnitRegistry`] and owned by the engine for that run's duration.
pub trait Unit {
    /// Unique unit name (case-insensitive lookup key).
    fn name(&self) -> &str;

    /// Human-readable description of the unit's purpose.
    fn description(&self) -> &str;

    /// Static dependency declarations, read at resolution time.
    fn dependencies(&self) -> Vec<Dependency> {
        Vec::new()
    }

    /// Cheap, side-effect-free check whether the target state is present.
    ///
    /// Called once per unit per run, before any execution decision. When it
    /// reports satisfied, `execute` is never invoked.
    fn probe(&self) -> ProbeResult;

    /// Perform the unit's work, reporting progress along the way.
    ///
    /// A returned `Err` is treated as a fault: the engine converts it into
    /// a `Failed` result rather than letting it escape the run.
    fn execute(&mut self, progress: &mut ProgressFn<'_>) -> Result<UnitResult>;

    /// Suggested external remediation command, attached to failed results.
    fn recovery_hint(&self) -> String {
        format!("cairn run {} --verbose", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_constructors_set_required_flag() {
        assert!(Dependency::required("apt").required);
        assert!(!Dependency::optional("desktop").required);
    }

    #[test]
    fn success_satisfies_dependents() {
        assert!(UnitResult::success("done").satisfies_dependents());
    }

    #[test]
    fn already_satisfied_skip_satisfies_dependents() {
        let result = UnitResult::already_satisfied("already configured");
        assert_eq!(result.status, UnitStatus::Skipped);
        assert!(result.satisfies_dependents());
    }

    #[test]
    fn failure_blocks_dependents() {
        assert!(!UnitResult::failure("boom", None).satisfies_dependents());
    }

    #[test]
    fn blocked_skip_blocks_dependents() {
        let result = UnitResult::blocked("deps failed", None);
        assert_eq!(result.skip_reason, Some(SkipReason::DependencyBlocked));
        assert!(!result.satisfies_dependents());
    }

    #[test]
    fn skipped_after_failure_blocks_dependents_and_keeps_hint() {
        let failure = UnitResult::failure("boom", Some("cairn run ssh --verbose".into()))
            .with_details("trace");
        let result = UnitResult::skipped_after_failure("Skipped after failure: boom", &failure);
        assert_eq!(result.status, UnitStatus::Skipped);
        assert_eq!(result.skip_reason, Some(SkipReason::AfterFailure));
        assert!(!result.satisfies_dependents());
        assert_eq!(result.recovery_hint.as_deref(), Some("cairn run ssh --verbose"));
        assert_eq!(result.details.as_deref(), Some("trace"));
    }

    #[test]
    fn probe_result_constructors() {
        assert!(ProbeResult::satisfied("present").satisfied);
        assert!(!ProbeResult::missing("absent").satisfied);
    }
}
