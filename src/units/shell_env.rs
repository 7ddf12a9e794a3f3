//! Shell environment unit.
//!
//! Installs the configured shell packages and drops an alias snippet into
//! the user's bashrc inside a marker-delimited block, so re-runs update the
//! block instead of appending duplicates.

use std::path::PathBuf;

use tracing::debug;

use crate::config::{Config, ShellConfig};
use crate::error::Result;
use crate::shell::execute_checked;
use crate::unit::{Dependency, ProbeResult, ProgressFn, Unit, UnitOptions, UnitResult};

use super::{ensure_snippet, home_dir, snippet_present};

const SNIPPET_MARKER: &str = "cairn-shell";

/// Render the bashrc alias snippet.
pub fn render_profile_snippet(shell: &ShellConfig) -> String {
    shell
        .aliases
        .iter()
        .map(|alias| format!("alias {alias}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Installs shell packages and configures aliases.
pub struct ShellEnvUnit {
    shell: ShellConfig,
    options: UnitOptions,
    bashrc_path: PathBuf,
}

impl ShellEnvUnit {
    pub fn new(config: &Config, options: UnitOptions) -> Self {
        Self {
            shell: config.shell.clone(),
            options,
            bashrc_path: home_dir().join(".bashrc"),
        }
    }
}

impl Unit for ShellEnvUnit {
    fn name(&self) -> &str {
        "shell"
    }

    fn description(&self) -> &str {
        "Install shell packages and configure aliases"
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![Dependency::required("apt")]
    }

    fn probe(&self) -> ProbeResult {
        if snippet_present(&self.bashrc_path, SNIPPET_MARKER) {
            ProbeResult::satisfied("Shell configuration already present")
        } else {
            ProbeResult::missing("Shell not configured")
        }
    }

    fn execute(&mut self, progress: &mut ProgressFn<'_>) -> Result<UnitResult> {
        progress(0.0, "Starting shell configuration", None);

        if self.shell.packages.is_empty() {
            progress(0.5, "No shell packages configured", None);
        } else {
            let packages = self.shell.packages.join(" ");
            progress(
                0.1,
                "Installing shell packages",
                Some(&format!("Running apt-get install {packages}")),
            );
            let command = format!("sudo apt-get -y install {packages}");
            debug!(command = command.as_str(), "running shell step");
            if !self.options.dry_run {
                execute_checked(&command)?;
            }
            progress(0.5, "Shell packages installed", None);
        }

        progress(
            0.6,
            "Configuring aliases",
            Some(&format!("Updating {}", self.bashrc_path.display())),
        );
        if !self.options.dry_run {
            ensure_snippet(
                &self.bashrc_path,
                SNIPPET_MARKER,
                &render_profile_snippet(&self.shell),
            )?;
        }
        progress(1.0, "Shell configuration complete", None);

        if self.options.dry_run {
            Ok(UnitResult::success("[dry run] Shell configuration complete"))
        } else {
            Ok(UnitResult::success("Shell configuration complete"))
        }
    }
}
