//! APT package manager unit.
//!
//! The foundation unit with no dependencies: hardens APT against flaky
//! network connections, cleans caches, repairs dpkg state, and brings the
//! system up to date before anything else installs packages.

use std::path::PathBuf;

use tracing::debug;

use crate::config::{AptConfig, Config};
use crate::error::Result;
use crate::shell::{execute, execute_checked, CommandOptions};
use crate::unit::{ProbeResult, ProgressFn, Unit, UnitOptions, UnitResult};

use super::write_file;

const APT_CONF_PATH: &str = "/etc/apt/apt.conf.d/99-cairn-robust";

/// Render the APT hardening configuration file.
pub fn render_apt_conf(apt: &AptConfig) -> String {
    format!(
        "// cairn robust APT configuration\n\
         // Prevents failures on slow or unreliable connections\n\
         \n\
         Acquire::Retries \"{}\";\n\
         Acquire::http::Timeout \"{}\";\n\
         Acquire::https::Timeout \"{}\";\n\
         Acquire::http::Pipeline-Depth \"0\";\n\
         Dpkg::Use-Pty \"0\";\n",
        apt.retries, apt.http_timeout, apt.https_timeout
    )
}

/// Hardens APT, repairs package state, and upgrades the system.
pub struct AptUnit {
    apt: AptConfig,
    options: UnitOptions,
    conf_path: PathBuf,
}

impl AptUnit {
    pub fn new(config: &Config, options: UnitOptions) -> Self {
        Self {
            apt: config.apt.clone(),
            options,
            conf_path: PathBuf::from(APT_CONF_PATH),
        }
    }

    fn run_command(&self, command: &str) -> Result<()> {
        debug!(command, "running apt step");
        if self.options.dry_run {
            return Ok(());
        }
        execute_checked(command).map(|_| ())
    }

    /// Run a best-effort command; a non-zero exit is tolerated.
    fn run_lenient(&self, command: &str) -> Result<()> {
        debug!(command, "running lenient apt step");
        if self.options.dry_run {
            return Ok(());
        }
        execute(command, &CommandOptions::captured()).map(|_| ())
    }
}

impl Unit for AptUnit {
    fn name(&self) -> &str {
        "apt"
    }

    fn description(&self) -> &str {
        "Harden the APT package manager and update the system"
    }

    fn probe(&self) -> ProbeResult {
        if self.conf_path.exists() {
            ProbeResult::satisfied("APT hardening configuration already present")
        } else {
            ProbeResult::missing("APT hardening not configured")
        }
    }

    fn execute(&mut self, progress: &mut ProgressFn<'_>) -> Result<UnitResult> {
        progress(0.0, "Starting APT configuration", None);

        // Harden APT against slow connections
        progress(
            0.1,
            "Hardening APT configuration",
            Some(&format!("Writing {}", self.conf_path.display())),
        );
        if !self.options.dry_run {
            write_file(&self.conf_path, &render_apt_conf(&self.apt), false)?;
        }
        progress(0.2, "APT hardening complete", None);

        // Clean caches and lists
        progress(
            0.35,
            "Cleaning APT caches",
            Some("Removing cached packages and lists"),
        );
        self.run_lenient("sudo apt clean")?;
        self.run_lenient("sudo rm -rf /var/lib/apt/lists/*")?;
        self.run_lenient("sudo mkdir -p /var/lib/apt/lists/partial")?;
        self.run_lenient("sudo rm -rf /var/cache/apt/archives/partial/*")?;
        self.run_lenient("sudo rm -f /var/cache/apt/archives/*.deb")?;
        progress(0.4, "APT cache cleaned", None);

        // Repair dpkg state
        progress(
            0.45,
            "Repairing dpkg",
            Some("Running dpkg configure and apt fix"),
        );
        self.run_lenient("sudo dpkg --configure -a")?;
        self.run_lenient("sudo apt -f install -y")?;
        progress(0.5, "dpkg repair complete", None);

        // Update and upgrade
        progress(0.55, "Updating package index", Some("Running apt update"));
        self.run_command("sudo apt update")?;
        progress(
            0.7,
            "Upgrading system packages",
            Some("Running apt full-upgrade"),
        );
        self.run_command("sudo apt -y full-upgrade")?;
        progress(0.85, "System update complete", None);

        // Base packages, download-first so installs never stall mid-way
        if self.apt.base_packages.is_empty() {
            progress(1.0, "APT configuration complete", None);
        } else {
            let packages = self.apt.base_packages.join(" ");
            progress(
                0.9,
                "Downloading base packages",
                Some(&format!(
                    "Prefetching {} packages",
                    self.apt.base_packages.len()
                )),
            );
            self.run_command(&format!(
                "sudo apt-get -y --download-only install {packages}"
            ))?;
            progress(
                0.95,
                "Installing base packages",
                Some("Installing from cache"),
            );
            self.run_command(&format!("sudo apt-get -y --no-download install {packages}"))?;
            progress(1.0, "Base package installation complete", None);
        }

        if self.options.dry_run {
            Ok(UnitResult::success(
                "[dry run] APT configuration and system update complete",
            ))
        } else {
            Ok(UnitResult::success(
                "APT configuration and system update complete",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_conf_carries_configured_values() {
        let apt = AptConfig {
            retries: 7,
            http_timeout: 30,
            https_timeout: 45,
            base_packages: Vec::new(),
        };
        let conf = render_apt_conf(&apt);
        assert!(conf.contains("Acquire::Retries \"7\";"));
        assert!(conf.contains("Acquire::http::Timeout \"30\";"));
        assert!(conf.contains("Acquire::https::Timeout \"45\";"));
        assert!(conf.contains("Pipeline-Depth \"0\""));
    }

    #[test]
    fn probe_reflects_conf_file_presence() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut unit = AptUnit::new(&Config::default(), UnitOptions::default());
        unit.conf_path = temp.path().join("99-cairn-robust");

        assert!(!unit.probe().satisfied);
        std::fs::write(&unit.conf_path, "x").unwrap();
        assert!(unit.probe().satisfied);
    }

    #[test]
    fn dry_run_executes_without_touching_the_system() {
        let temp = tempfile::TempDir::new().unwrap();
        let options = UnitOptions {
            dry_run: true,
            ..UnitOptions::default()
        };
        let mut unit = AptUnit::new(&Config::default(), options);
        unit.conf_path = temp.path().join("99-cairn-robust");

        let mut updates: Vec<f64> = Vec::new();
        let mut progress = |p: f64, _m: &str, _d: Option<&str>| updates.push(p);
        let result = unit.execute(&mut progress).unwrap();

        assert!(result.message.starts_with("[dry run]"));
        assert!(!unit.conf_path.exists());
        assert_eq!(updates.last().copied(), Some(1.0));
        assert!(updates.windows(2).all(|w| w[0] <= w[1]));
    }
}
