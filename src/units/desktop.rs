//! Desktop environment unit.
//!
//! Installs the configured desktop package set with a download-first
//! strategy, writes a session launch script into `~/.local/bin`, and drops
//! a marker file so re-runs can detect the installation.

use std::path::PathBuf;

use tracing::debug;

use crate::config::{Config, DesktopConfig};
use crate::error::Result;
use crate::shell::execute_checked;
use crate::unit::{Dependency, ProbeResult, ProgressFn, Unit, UnitOptions, UnitResult};

use super::{home_dir, write_file};

const MARKER_PATH: &str = "/etc/cairn/desktop-installed";

/// Derive the launcher script filename for a desktop.
///
/// The display name is slugged (lowercase, runs of non-alphanumerics
/// collapsed to single hyphens) and prefixed with `start-` when the prefix
/// is not already present.
pub fn launcher_script_name(display_name: &str) -> String {
    let mut slug = String::new();
    for c in display_name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if c == '_' {
            slug.push('_');
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    let slug = if slug.is_empty() { "desktop" } else { slug };

    if slug.starts_with("start-") {
        slug.to_string()
    } else {
        format!("start-{slug}")
    }
}

/// Render the session launch script for a desktop.
pub fn render_launcher_script(desktop: &DesktopConfig) -> String {
    format!(
        "#!/bin/bash\n\
         # Launch script for {}\n\
         # Managed by cairn\n\
         \n\
         exec dbus-run-session {}\n",
        desktop.display_name, desktop.session_command
    )
}

/// Installs and configures a desktop environment.
pub struct DesktopUnit {
    desktop: DesktopConfig,
    options: UnitOptions,
    marker_path: PathBuf,
    launcher_dir: PathBuf,
}

impl DesktopUnit {
    pub fn new(config: &Config, options: UnitOptions) -> Self {
        Self {
            desktop: config.desktop.clone(),
            options,
            marker_path: PathBuf::from(MARKER_PATH),
            launcher_dir: home_dir().join(".local").join("bin"),
        }
    }

    fn run_command(&self, command: &str) -> Result<()> {
        debug!(command, "running desktop step");
        if self.options.dry_run {
            return Ok(());
        }
        execute_checked(command).map(|_| ())
    }

    fn all_packages(&self) -> Vec<&str> {
        self.desktop
            .packages_core
            .iter()
            .chain(self.desktop.packages_optional.iter())
            .map(String::as_str)
            .collect()
    }
}

impl Unit for DesktopUnit {
    fn name(&self) -> &str {
        "desktop"
    }

    fn description(&self) -> &str {
        "Install and configure a desktop environment"
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![Dependency::required("apt")]
    }

    fn probe(&self) -> ProbeResult {
        if self.marker_path.exists() {
            ProbeResult::satisfied(format!(
                "Desktop environment already installed ({})",
                self.desktop.display_name
            ))
        } else {
            ProbeResult::missing("No desktop environment installed")
        }
    }

    fn execute(&mut self, progress: &mut ProgressFn<'_>) -> Result<UnitResult> {
        progress(
            0.0,
            "Starting desktop installation",
            Some(&self.desktop.display_name),
        );

        let packages = self.all_packages();
        if packages.is_empty() {
            return Ok(UnitResult::failure(
                format!(
                    "No packages configured for desktop '{}'",
                    self.desktop.display_name
                ),
                None,
            ));
        }
        let package_list = packages.join(" ");

        // Download everything first so a network hiccup never leaves a
        // half-installed desktop.
        progress(
            0.1,
            "Downloading desktop packages",
            Some(&format!("Prefetching {} packages", packages.len())),
        );
        self.run_command(&format!(
            "sudo apt-get -y --download-only install {package_list}"
        ))?;

        progress(
            0.4,
            "Installing desktop packages",
            Some("Installing from cache"),
        );
        self.run_command(&format!(
            "sudo apt-get -y --no-download install {package_list}"
        ))?;
        progress(0.7, "Desktop packages installed", None);

        let script_path = self
            .launcher_dir
            .join(launcher_script_name(&self.desktop.display_name));
        progress(
            0.8,
            "Creating launch script",
            Some(&format!("Writing {}", script_path.display())),
        );
        if !self.options.dry_run {
            write_file(&script_path, &render_launcher_script(&self.desktop), true)?;
        }

        progress(0.95, "Finalizing installation", None);
        if !self.options.dry_run {
            write_file(
                &self.marker_path,
                &format!("{}\n", self.desktop.display_name),
                false,
            )?;
        }
        progress(1.0, "Desktop installation complete", None);

        if self.options.dry_run {
            Ok(UnitResult::success(format!(
                "[dry run] Desktop installation complete: {}",
                self.desktop.display_name
            )))
        } else {
            Ok(UnitResult::success(format!(
                "Desktop installation complete: {}",
                self.desktop.display_name
            )))
        }
    }
}
