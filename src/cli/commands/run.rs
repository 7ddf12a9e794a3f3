//! Run command implementation.
//!
//! The `cairn run` command resolves and executes setup units with a live
//! progress bar and interactive failure recovery.

use std::collections::BTreeMap;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::cli::args::{Cli, RunArgs};
use crate::config::Config;
use crate::error::Result;
use crate::runner::{prompt_recovery, Orchestrator, RecoveryAction};
use crate::unit::{SkipReason, UnitOptions, UnitResult, UnitStatus};
use crate::units::builtin_registry;

use super::dispatcher::{Command, CommandResult};

const PROGRESS_TICKS: u64 = 1000;

/// The run command implementation.
pub struct RunCommand {
    config_path: Option<std::path::PathBuf>,
    verbose: bool,
    quiet: bool,
    args: RunArgs,
}

impl RunCommand {
    pub fn new(cli: &Cli, args: RunArgs) -> Self {
        Self {
            config_path: cli.config.clone(),
            verbose: cli.verbose,
            quiet: cli.quiet,
            args,
        }
    }

    fn progress_bar(&self) -> Result<ProgressBar> {
        if self.quiet {
            return Ok(ProgressBar::hidden());
        }
        let bar = ProgressBar::new(PROGRESS_TICKS);
        let style = ProgressStyle::with_template(
            "{bar:40.cyan/blue} {percent:>3}% {wide_msg}",
        )
        .map_err(anyhow::Error::from)?;
        bar.set_style(style);
        Ok(bar)
    }

    fn print_results(&self, results: &BTreeMap<String, UnitResult>) {
        if self.quiet {
            return;
        }
        println!();
        for (name, result) in results {
            let line = match result.status {
                UnitStatus::Success => {
                    format!("{} {name}: {}", style("✓").green().bold(), result.message)
                }
                UnitStatus::Failed => {
                    format!("{} {name}: {}", style("✗").red().bold(), result.message)
                }
                UnitStatus::Skipped => {
                    let glyph = match result.skip_reason {
                        Some(SkipReason::AlreadySatisfied) => style("○").green(),
                        _ => style("○").yellow(),
                    };
                    format!("{glyph} {name}: {}", result.message)
                }
            };
            println!("{line}");
            if self.verbose {
                if let Some(details) = &result.details {
                    println!("    {}", style(details).dim());
                }
            }
            if result.status != UnitStatus::Success {
                if let Some(hint) = &result.recovery_hint {
                    println!("    {} {hint}", style("try:").yellow());
                }
            }
        }
    }
}

impl Command for RunCommand {
    fn execute(&self) -> Result<CommandResult> {
        let config = Config::load(self.config_path.as_deref())?;
        let registry = builtin_registry();
        let options = UnitOptions {
            verbose: self.verbose,
            dry_run: self.args.dry_run,
        };
        let orchestrator = Orchestrator::with_options(&registry, &config, options);

        let requested: Vec<String> = if self.args.units.is_empty() {
            registry.names()
        } else {
            self.args.units.clone()
        };

        let (valid, invalid) = orchestrator.validate(&requested);
        if !valid {
            eprintln!(
                "{} unknown unit(s): {}",
                style("error:").red().bold(),
                invalid.join(", ")
            );
            eprintln!("Available units: {}", registry.names().join(", "));
            return Ok(CommandResult::failure(2));
        }

        if !self.quiet {
            if self.args.dry_run {
                println!("Running in dry-run mode, no changes will be made");
            }
            println!(
                "{} {}",
                style("Setting up:").bold(),
                requested.join(", ")
            );
        }
        debug!(?requested, dry_run = self.args.dry_run, "starting run");

        let bar = self.progress_bar()?;
        let verbose = self.verbose;
        let observer_bar = bar.clone();
        let mut observer = move |percent: f64, message: &str, detail: Option<&str>| {
            observer_bar.set_position((percent * PROGRESS_TICKS as f64).round() as u64);
            observer_bar.set_message(message.to_string());
            if verbose {
                if let Some(detail) = detail {
                    observer_bar.println(format!("  {detail}"));
                }
            }
        };

        let interactive = !self.args.non_interactive && console::user_attended();
        let decider_bar = bar.clone();
        let mut decider = move |name: &str, failure: &UnitResult| {
            decider_bar
                .suspend(|| prompt_recovery(name, failure))
                .unwrap_or(RecoveryAction::Abort)
        };

        let results = orchestrator.execute(
            &requested,
            Some(&mut observer),
            if interactive { Some(&mut decider) } else { None },
        )?;
        bar.finish_and_clear();

        self.print_results(&results);
        let summary = orchestrator.summarize(&results);
        if !self.quiet {
            println!();
            println!(
                "{} {} succeeded, {} failed, {} skipped ({} total)",
                style("Summary:").bold(),
                summary.successful,
                summary.failed,
                summary.skipped,
                summary.total
            );
        }

        if summary.failed > 0 {
            Ok(CommandResult::failure(1))
        } else {
            Ok(CommandResult::success())
        }
    }
}
