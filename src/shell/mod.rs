//! Shell command execution for setup units.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::error::{CairnError, Result};

/// Result of executing a shell command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output (empty when not captured).
    pub stdout: String,

    /// Standard error (empty when not captured).
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether the command succeeded (exit code 0).
    pub success: bool,
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,

    /// Capture stdout (if false, inherits from parent).
    pub capture_stdout: bool,

    /// Capture stderr (if false, inherits from parent).
    pub capture_stderr: bool,
}

impl CommandOptions {
    /// Capture both output streams.
    pub fn captured() -> Self {
        Self {
            capture_stdout: true,
            capture_stderr: true,
            ..Self::default()
        }
    }
}

fn shell() -> (&'static str, &'static str) {
    if cfg!(windows) {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    }
}

/// Execute a shell command.
///
/// A non-zero exit is a normal `CommandResult`, not an error; only a
/// failure to spawn the shell at all maps to [`CairnError::CommandFailed`].
pub fn execute(command: &str, options: &CommandOptions) -> Result<CommandResult> {
    let start = Instant::now();
    let (shell, flag) = shell();

    let mut cmd = Command::new(shell);
    cmd.arg(flag);
    cmd.arg(command);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    cmd.stdout(if options.capture_stdout {
        Stdio::piped()
    } else {
        Stdio::inherit()
    });
    cmd.stderr(if options.capture_stderr {
        Stdio::piped()
    } else {
        Stdio::inherit()
    });

    let output = cmd.output().map_err(|_| CairnError::CommandFailed {
        command: command.to_string(),
        code: None,
    })?;

    let duration = start.elapsed();
    let stdout = if options.capture_stdout {
        String::from_utf8_lossy(&output.stdout).to_string()
    } else {
        String::new()
    };
    let stderr = if options.capture_stderr {
        String::from_utf8_lossy(&output.stderr).to_string()
    } else {
        String::new()
    };

    Ok(CommandResult {
        exit_code: output.status.code(),
        stdout,
        stderr,
        duration,
        success: output.status.success(),
    })
}

/// Execute a command and report only success/failure.
pub fn execute_check(command: &str) -> bool {
    execute(command, &CommandOptions::captured())
        .map(|r| r.success)
        .unwrap_or(false)
}

/// Execute a command, turning a non-zero exit into an error.
///
/// Captured stderr is attached to the error message for diagnostics.
pub fn execute_checked(command: &str) -> Result<CommandResult> {
    let result = execute(command, &CommandOptions::captured())?;
    if result.success {
        Ok(result)
    } else {
        Err(CairnError::CommandFailed {
            command: if result.stderr.trim().is_empty() {
                command.to_string()
            } else {
                format!("{command} ({})", result.stderr.trim())
            },
            code: result.exit_code,
        })
    }
}
