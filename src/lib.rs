//! Cairn - interactive machine setup orchestration.
//!
//! Cairn turns a list of *setup units* (package manager hardening, SSH,
//! desktop environment, ...) into a dependency-ordered plan and executes it
//! sequentially with idempotence probes, throttled progress reporting, and
//! interactive failure recovery.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Typed configuration with embedded defaults
//! - [`error`] - Error types and result alias
//! - [`runner`] - Dependency resolution and execution orchestration
//! - [`shell`] - Shell command execution
//! - [`unit`] - Unit capability interface, result model, and registry
//! - [`units`] - Built-in setup units
//!
//! # Example
//!
//! ```
//! use cairn::config::Config;
//! use cairn::runner::Orchestrator;
//! use cairn::units::builtin_registry;
//!
//! let registry = builtin_registry();
//! let config = Config::default();
//! let orchestrator = Orchestrator::new(&registry, &config);
//!
//! // Requesting ssh pulls in its apt dependency, in execution order.
//! let plan = orchestrator.resolve(&["ssh".to_string()]).unwrap();
//! assert_eq!(plan.order, vec!["apt".to_string(), "ssh".to_string()]);
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod shell;
pub mod unit;
pub mod units;

pub use error::{CairnError, Result};
