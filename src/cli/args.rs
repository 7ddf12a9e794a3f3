//! CLI argument definitions.
//!
//! All arguments are defined with clap's derive macros; the entry point is
//! the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Cairn - interactive machine setup orchestration.
#[derive(Debug, Parser)]
#[command(name = "cairn")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a YAML config file (embedded defaults are used otherwise)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run setup units (default if no command specified)
    Run(RunArgs),

    /// Show the dependency-resolved execution order without running
    Plan(PlanArgs),

    /// List available setup units
    List(ListArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RunArgs {
    /// Units to run (all registered units when omitted)
    pub units: Vec<String>,

    /// Preview operations without executing
    #[arg(long)]
    pub dry_run: bool,

    /// Never prompt; failed units follow the default recovery policy
    #[arg(long)]
    pub non_interactive: bool,
}

/// Arguments for the `plan` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct PlanArgs {
    /// Units to plan for (all registered units when omitted)
    pub units: Vec<String>,

    /// Emit the plan as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListArgs {
    /// Emit the unit list as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_units_and_flags() {
        let cli = Cli::try_parse_from(["cairn", "run", "ssh", "gui", "--dry-run"]).unwrap();
        match cli.command {
            Some(Commands::Run(args)) => {
                assert_eq!(args.units, vec!["ssh", "gui"]);
                assert!(args.dry_run);
                assert!(!args.non_interactive);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_is_allowed() {
        let cli = Cli::try_parse_from(["cairn", "--verbose"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.verbose);
    }

    #[test]
    fn global_config_flag_works_after_subcommand() {
        let cli = Cli::try_parse_from(["cairn", "plan", "--config", "/tmp/c.yml"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/c.yml")));
    }

    #[test]
    fn plan_accepts_json_flag() {
        let cli = Cli::try_parse_from(["cairn", "plan", "gui", "--json"]).unwrap();
        match cli.command {
            Some(Commands::Plan(args)) => {
                assert_eq!(args.units, vec!["gui"]);
                assert!(args.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
