//! SSH server unit.
//!
//! Installs openssh-server, writes a hardened drop-in configuration, and
//! brings the service up. The idempotence probe checks whether sshd is
//! already listening on a configured port, so a machine with working SSH
//! is never reconfigured.

use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::config::{Config, SshConfig};
use crate::error::Result;
use crate::shell::execute_checked;
use crate::unit::{Dependency, ProbeResult, ProgressFn, Unit, UnitOptions, UnitResult};

use super::write_file;

const SSHD_CONF_PATH: &str = "/etc/ssh/sshd_config.d/99-cairn-ssh.conf";

/// How long to wait for sshd to start listening after a restart.
const PORT_WAIT: Duration = Duration::from_secs(10);
const PORT_POLL: Duration = Duration::from_millis(500);

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Render the sshd drop-in configuration.
///
/// The internal port is omitted when configured as 0.
pub fn render_sshd_config(ssh: &SshConfig) -> String {
    let mut ports = format!("Port {}", ssh.forward_port);
    if ssh.internal_port != 0 {
        ports.push_str(&format!("\nPort {}", ssh.internal_port));
    }

    format!(
        "# cairn SSH configuration\n\
         # Security hardening for remote access\n\
         \n\
         # Listen ports\n\
         {ports}\n\
         \n\
         # Network settings\n\
         ListenAddress {}\n\
         \n\
         # Authentication settings\n\
         PermitRootLogin {}\n\
         PasswordAuthentication {}\n\
         PubkeyAuthentication {}\n\
         \n\
         # Additional hardening\n\
         X11Forwarding no\n\
         MaxAuthTries 3\n",
        ssh.listen_address,
        ssh.permit_root_login,
        yes_no(ssh.password_auth),
        yes_no(ssh.pubkey_auth),
    )
}

fn port_listening(port: u16) -> bool {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    TcpStream::connect_timeout(&addr, Duration::from_millis(200)).is_ok()
}

/// Installs and hardens the SSH server.
pub struct SshUnit {
    ssh: SshConfig,
    options: UnitOptions,
    conf_path: PathBuf,
}

impl SshUnit {
    pub fn new(config: &Config, options: UnitOptions) -> Self {
        Self {
            ssh: config.ssh.clone(),
            options,
            conf_path: PathBuf::from(SSHD_CONF_PATH),
        }
    }

    fn run_command(&self, command: &str) -> Result<()> {
        debug!(command, "running ssh step");
        if self.options.dry_run {
            return Ok(());
        }
        execute_checked(command).map(|_| ())
    }

    fn wait_for_port(&self) -> bool {
        if self.options.dry_run {
            return true;
        }
        let deadline = std::time::Instant::now() + PORT_WAIT;
        loop {
            if port_listening(self.ssh.forward_port) {
                return true;
            }
            if std::time::Instant::now() >= deadline {
                return false;
            }
            thread::sleep(PORT_POLL);
        }
    }
}

impl Unit for SshUnit {
    fn name(&self) -> &str {
        "ssh"
    }

    fn description(&self) -> &str {
        "Install and harden the SSH server"
    }

    fn dependencies(&self) -> Vec<Dependency> {
        vec![Dependency::required("apt")]
    }

    fn probe(&self) -> ProbeResult {
        let mut listening = Vec::new();
        if port_listening(self.ssh.forward_port) {
            listening.push(self.ssh.forward_port.to_string());
        }
        if self.ssh.internal_port != 0 && port_listening(self.ssh.internal_port) {
            listening.push(self.ssh.internal_port.to_string());
        }

        if listening.is_empty() {
            ProbeResult::missing("SSH not configured")
        } else {
            ProbeResult::satisfied(format!(
                "SSH already listening on port(s): {}",
                listening.join(", ")
            ))
        }
    }

    fn execute(&mut self, progress: &mut ProgressFn<'_>) -> Result<UnitResult> {
        progress(0.0, "Starting SSH configuration", None);

        progress(
            0.05,
            "Installing SSH server",
            Some("Running apt-get install openssh-server"),
        );
        self.run_command("sudo apt-get -y install openssh-server")?;
        progress(0.2, "SSH package installed", None);

        progress(
            0.25,
            "Creating SSH configuration",
            Some(&format!("Writing {}", self.conf_path.display())),
        );
        if !self.options.dry_run {
            write_file(&self.conf_path, &render_sshd_config(&self.ssh), false)?;
        }
        progress(0.5, "SSH configuration created", None);

        progress(
            0.55,
            "Enabling SSH service",
            Some("Running systemctl enable ssh"),
        );
        self.run_command("sudo systemctl enable ssh")?;
        progress(0.7, "SSH service enabled", None);

        progress(
            0.75,
            "Restarting SSH service",
            Some("Running systemctl restart ssh"),
        );
        self.run_command("sudo systemctl restart ssh")?;

        progress(
            0.9,
            "Waiting for SSH port",
            Some(&format!("Checking port {}", self.ssh.forward_port)),
        );
        if !self.wait_for_port() {
            return Ok(UnitResult::failure(
                format!(
                    "SSH service started but port {} is not listening",
                    self.ssh.forward_port
                ),
                None,
            )
            .with_details("Check 'sudo systemctl status ssh' for errors"));
        }
        progress(1.0, "SSH service running", None);

        if self.options.dry_run {
            Ok(UnitResult::success("[dry run] SSH configuration complete"))
        } else {
            Ok(UnitResult::success(format!(
                "SSH configured and listening on port {}",
                self.ssh.forward_port
            )))
        }
    }
}
