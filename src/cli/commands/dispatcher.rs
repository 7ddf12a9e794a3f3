//! Command dispatching.
//!
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use crate::cli::args::{Cli, Commands, RunArgs};
use crate::error::Result;

use super::completions::CompletionsCommand;
use super::list::ListCommand;
use super::plan::PlanCommand;
use super::run::RunCommand;

/// Trait for command implementations.
pub trait Command {
    /// Execute the command, returning success/failure and an exit code.
    fn execute(&self) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Dispatches CLI subcommands to their implementations.
pub struct CommandDispatcher;

impl CommandDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Dispatch and execute a command.
    ///
    /// A missing subcommand runs the default `run` over every unit, the way
    /// the tool is used on a fresh machine.
    pub fn dispatch(&self, cli: &Cli) -> Result<CommandResult> {
        match &cli.command {
            Some(Commands::Run(args)) => RunCommand::new(cli, args.clone()).execute(),
            Some(Commands::Plan(args)) => PlanCommand::new(cli, args.clone()).execute(),
            Some(Commands::List(args)) => ListCommand::new(cli, args.clone()).execute(),
            Some(Commands::Completions(args)) => CompletionsCommand::new(args.clone()).execute(),
            None => RunCommand::new(cli, RunArgs::default()).execute(),
        }
    }
}

impl Default for CommandDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
