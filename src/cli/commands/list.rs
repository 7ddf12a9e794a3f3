//! List command implementation.
//!
//! The `cairn list` command lists the available setup units with their
//! descriptions and dependency declarations.

use console::style;
use serde::Serialize;

use crate::cli::args::{Cli, ListArgs};
use crate::config::Config;
use crate::error::Result;
use crate::unit::UnitOptions;
use crate::units::builtin_registry;

use super::dispatcher::{Command, CommandResult};

#[derive(Serialize)]
struct UnitListing {
    name: String,
    description: String,
    dependencies: Vec<DependencyListing>,
}

#[derive(Serialize)]
struct DependencyListing {
    unit: String,
    required: bool,
}

/// The list command implementation.
pub struct ListCommand {
    config_path: Option<std::path::PathBuf>,
    args: ListArgs,
}

impl ListCommand {
    pub fn new(cli: &Cli, args: ListArgs) -> Self {
        Self {
            config_path: cli.config.clone(),
            args,
        }
    }

    fn listings(&self) -> Result<Vec<UnitListing>> {
        let config = Config::load(self.config_path.as_deref())?;
        let registry = builtin_registry();

        let mut listings = Vec::new();
        for name in registry.names() {
            if let Some(unit) = registry.instantiate(&name, &config, UnitOptions::default()) {
                listings.push(UnitListing {
                    name: unit.name().to_string(),
                    description: unit.description().to_string(),
                    dependencies: unit
                        .dependencies()
                        .into_iter()
                        .map(|dep| DependencyListing {
                            unit: dep.unit,
                            required: dep.required,
                        })
                        .collect(),
                });
            }
        }
        Ok(listings)
    }
}

impl Command for ListCommand {
    fn execute(&self) -> Result<CommandResult> {
        let listings = self.listings()?;

        if self.args.json {
            let rendered =
                serde_json::to_string_pretty(&listings).map_err(anyhow::Error::from)?;
            println!("{rendered}");
            return Ok(CommandResult::success());
        }

        println!("{}", style("Available units:").bold());
        for listing in &listings {
            println!("  {}", style(&listing.name).cyan().bold());
            println!("    {}", listing.description);
            if !listing.dependencies.is_empty() {
                let deps: Vec<String> = listing
                    .dependencies
                    .iter()
                    .map(|dep| {
                        if dep.required {
                            dep.unit.clone()
                        } else {
                            format!("{} (optional)", dep.unit)
                        }
                    })
                    .collect();
                println!("    {} {}", style("depends on:").dim(), deps.join(", "));
            }
        }

        Ok(CommandResult::success())
    }
}
