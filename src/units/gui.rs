//! GUI helper unit.
//!
//! Creates a generic `start-gui` helper in `~/.local/bin` that lists the
//! available desktop launch scripts, and makes sure `~/.local/bin` is on
//! the PATH. The desktop unit is an optional dependency: these helpers are
//! useful on their own, so a missing or failed desktop install does not
//! block them.

use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::unit::{Dependency, ProbeResult, ProgressFn, Unit, UnitOptions, UnitResult};

use super::{ensure_snippet, home_dir, write_file};

const PATH_MARKER: &str = "cairn-local-bin";
const PATH_SNIPPET: &str = "export PATH=\"$HOME/.local/bin:$PATH\"";

/// Render the generic `start-gui` helper script.
pub fn render_start_gui_script() -> String {
    let lines = [
        "#!/bin/bash",
        "# GUI helper, managed by cairn",
        "# Lists the available desktop launch scripts",
        "",
        "echo \"\"",
        "echo \"Available desktop launchers:\"",
        "echo \"\"",
        "for script in ~/.local/bin/start-*; do",
        "    if [ -x \"$script\" ] && [ \"$(basename \"$script\")\" != \"start-gui\" ]; then",
        "        echo \"  $(basename \"$script\")\"",
        "    fi",
        "done",
        "echo \"\"",
        "echo \"Usage: start-<desktop-name> to launch a desktop session\"",
        "echo \"\"",
    ];
    lines.join("\n") + "\n"
}

/// Creates GUI launch helpers and PATH wiring.
pub struct GuiUnit {
    options: UnitOptions,
    local_bin: PathBuf,
    bashrc_path: PathBuf,
}

impl GuiUnit {
    pub fn new(_config: &Config, options: UnitOptions) -> Self {
        let home = home_dir();
        Self {
            options,
            local_bin: home.join(".local").join("bin"),
            bashrc_path: home.join(".bashrc"),
        }
    }

    fn start_gui_path(&self) -> PathBuf {
        self.local_bin.join("start-gui")
    }
}

impl Unit for GuiUnit {
    fn name(&self) -> &str {
        "gui"
    }

    fn description(&self) -> &str {
        "Create GUI launch helper scripts"
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![Dependency::optional("desktop")]
    }

    fn probe(&self) -> ProbeResult {
        if self.start_gui_path().exists() {
            ProbeResult::satisfied("GUI helper scripts already present")
        } else {
            ProbeResult::missing("GUI helpers not configured")
        }
    }

    fn execute(&mut self, progress: &mut ProgressFn<'_>) -> Result<UnitResult> {
        progress(0.0, "Starting GUI helper configuration", None);

        progress(
            0.1,
            "Creating local bin directory",
            Some(&format!("Creating {}", self.local_bin.display())),
        );
        if !self.options.dry_run {
            std::fs::create_dir_all(&self.local_bin)?;
        }

        let script_path = self.start_gui_path();
        progress(
            0.4,
            "Creating start-gui script",
            Some(&format!("Writing {}", script_path.display())),
        );
        if !self.options.dry_run {
            write_file(&script_path, &render_start_gui_script(), true)?;
        }

        progress(
            0.7,
            "Adding local bin to PATH",
            Some(&format!("Updating {}", self.bashrc_path.display())),
        );
        if !self.options.dry_run {
            ensure_snippet(&self.bashrc_path, PATH_MARKER, PATH_SNIPPET)?;
        }
        progress(1.0, "GUI helper configuration complete", None);

        if self.options.dry_run {
            Ok(UnitResult::success(
                "[dry run] GUI helper configuration complete",
            ))
        } else {
            Ok(UnitResult::success("GUI helper configuration complete"))
        }
    }
}
