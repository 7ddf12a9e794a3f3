//! Typed configuration for the built-in setup units.
//!
//! Every field has an embedded default so the tool works with zero
//! configuration; a YAML file can override any section. Unknown fields are
//! rejected at load time rather than probed for at runtime.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CairnError, Result};

/// APT package manager settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AptConfig {
    /// Download retry count written into the hardening config.
    pub retries: u32,
    /// HTTP acquire timeout in seconds.
    pub http_timeout: u32,
    /// HTTPS acquire timeout in seconds.
    pub https_timeout: u32,
    /// Base packages installed after the system upgrade.
    pub base_packages: Vec<String>,
}

impl Default for AptConfig {
    fn default() -> Self {
        Self {
            retries: 10,
            http_timeout: 60,
            https_timeout: 60,
            base_packages: Vec::new(),
        }
    }
}

/// SSH server hardening settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SshConfig {
    /// Primary (forwarded) listen port.
    pub forward_port: u16,
    /// Internal listen port; 0 disables the second port.
    pub internal_port: u16,
    /// Listen address for sshd.
    pub listen_address: String,
    /// `PermitRootLogin` value.
    pub permit_root_login: String,
    /// Allow password authentication.
    pub password_auth: bool,
    /// Allow public key authentication.
    pub pubkey_auth: bool,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            forward_port: 2222,
            internal_port: 22,
            listen_address: "0.0.0.0".to_string(),
            permit_root_login: "no".to_string(),
            password_auth: true,
            pubkey_auth: true,
        }
    }
}

/// Desktop environment installation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DesktopConfig {
    /// Human-readable desktop name.
    pub display_name: String,
    /// Required package set.
    pub packages_core: Vec<String>,
    /// Nice-to-have package set.
    pub packages_optional: Vec<String>,
    /// Command that launches the desktop session.
    pub session_command: String,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            display_name: "KDE Plasma".to_string(),
            packages_core: vec![
                "plasma-desktop".to_string(),
                "sddm".to_string(),
                "konsole".to_string(),
            ],
            packages_optional: vec!["dolphin".to_string()],
            session_command: "startplasma-wayland".to_string(),
        }
    }
}

/// Shell customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellConfig {
    /// Packages installed for the shell environment.
    pub packages: Vec<String>,
    /// Aliases written into the profile snippet.
    pub aliases: Vec<String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            packages: vec!["zsh".to_string(), "tmux".to_string()],
            aliases: vec!["ll='ls -la'".to_string()],
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub apt: AptConfig,
    pub ssh: SshConfig,
    pub desktop: DesktopConfig,
    pub shell: ShellConfig,
}

impl Config {
    /// Load configuration.
    ///
    /// With an explicit path the file must exist and parse; without one the
    /// embedded defaults are returned.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = fs::read_to_string(path)?;
                Self::from_yaml(&content).map_err(|e| match e {
                    CairnError::ConfigParseError { message, .. } => {
                        CairnError::ConfigParseError {
                            path: path.display().to_string(),
                            message,
                        }
                    }
                    other => other,
                })
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| CairnError::ConfigParseError {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }
}
