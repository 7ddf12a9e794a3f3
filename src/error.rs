//! Error types for cairn operations.
//!
//! This module defines [`CairnError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Resolution problems (unknown unit, dependency cycle) are fatal to the
//!   call and surface as `CairnError`
//! - Failures *inside* a unit's execution are never errors at this level;
//!   the engine converts them into a `Failed` unit result and routes them
//!   through the recovery protocol
//! - Use `anyhow::Error` (via `CairnError::Other`) for unexpected errors

use thiserror::Error;

/// Core error type for cairn operations.
#[derive(Debug, Error)]
pub enum CairnError {
    /// A requested or declared unit name is not in the registry.
    #[error("Unknown unit '{name}'. Available units: {}", available.join(", "))]
    UnknownUnit {
        name: String,
        available: Vec<String>,
    },

    /// Unit dependency cycle detected during resolution.
    #[error("Circular dependency detected involving: {}", units.join(", "))]
    CircularDependency { units: Vec<String> },

    /// Failed to parse a configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: String, message: String },

    /// Shell command could not be spawned.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for cairn operations.
pub type Result<T> = std::result::Result<T, CairnError>;
