//! Failure recovery protocol.
//!
//! When a unit fails, the engine asks a recovery decider how to proceed:
//! retry the unit, skip it, or abort the run. The decider is an ordinary
//! closure, so tests can script decisions; the interactive CLI builds one
//! from [`prompt_recovery`].

use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;

use crate::error::Result;
use crate::unit::UnitResult;

/// Recovery decision after a unit failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Re-execute the unit from the beginning.
    Retry,
    /// Record the failure, skip the unit, continue with the next one.
    Skip,
    /// Stop the run, returning the results recorded so far.
    Abort,
}

/// Decision function invoked with the failed unit's name and result.
pub type RecoveryDecider<'a> = dyn FnMut(&str, &UnitResult) -> RecoveryAction + 'a;

/// Prompt the operator for a recovery action after a unit failure.
///
/// Shows the failure message and recovery hint, then a three-way select
/// menu defaulting to Retry.
pub fn prompt_recovery(unit_name: &str, failure: &UnitResult) -> Result<RecoveryAction> {
    eprintln!(
        "{} {}",
        style(format!("✗ {unit_name} failed:")).red().bold(),
        failure.message
    );
    if let Some(hint) = &failure.recovery_hint {
        eprintln!("  {} {}", style("hint:").yellow(), hint);
    }

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("How do you want to proceed?")
        .items(&["Retry", "Skip", "Abort"])
        .default(0)
        .interact()
        .map_err(anyhow::Error::from)?;

    Ok(match selection {
        0 => RecoveryAction::Retry,
        1 => RecoveryAction::Skip,
        _ => RecoveryAction::Abort,
    })
}
