//! Plan command implementation.
//!
//! The `cairn plan` command shows the dependency-resolved execution order
//! without running anything.

use console::style;
use serde::Serialize;

use crate::cli::args::{Cli, PlanArgs};
use crate::config::Config;
use crate::error::Result;
use crate::runner::Orchestrator;
use crate::unit::UnitOptions;
use crate::units::builtin_registry;

use super::dispatcher::{Command, CommandResult};

#[derive(Serialize)]
struct PlanOutput<'a> {
    order: &'a [String],
    auto_optional: Vec<&'a String>,
}

/// The plan command implementation.
pub struct PlanCommand {
    config_path: Option<std::path::PathBuf>,
    quiet: bool,
    args: PlanArgs,
}

impl PlanCommand {
    pub fn new(cli: &Cli, args: PlanArgs) -> Self {
        Self {
            config_path: cli.config.clone(),
            quiet: cli.quiet,
            args,
        }
    }
}

impl Command for PlanCommand {
    fn execute(&self) -> Result<CommandResult> {
        let config = Config::load(self.config_path.as_deref())?;
        let registry = builtin_registry();
        let orchestrator = Orchestrator::with_options(&registry, &config, UnitOptions::default());

        let requested: Vec<String> = if self.args.units.is_empty() {
            registry.names()
        } else {
            self.args.units.clone()
        };

        let plan = orchestrator.resolve(&requested)?;

        if self.args.json {
            let mut auto_optional: Vec<&String> = plan.auto_optional.iter().collect();
            auto_optional.sort();
            let output = PlanOutput {
                order: &plan.order,
                auto_optional,
            };
            let rendered =
                serde_json::to_string_pretty(&output).map_err(anyhow::Error::from)?;
            println!("{rendered}");
            return Ok(CommandResult::success());
        }

        if !self.quiet {
            println!("{}", style("Execution order:").bold());
        }
        for (index, name) in plan.order.iter().enumerate() {
            let marker = if plan.auto_optional.contains(name) {
                format!(" {}", style("(optional, auto-included)").dim())
            } else {
                String::new()
            };
            println!("  {}. {name}{marker}", index + 1);
        }

        Ok(CommandResult::success())
    }
}
