//! Command implementations.

pub mod completions;
pub mod dispatcher;
pub mod list;
pub mod plan;
pub mod run;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
