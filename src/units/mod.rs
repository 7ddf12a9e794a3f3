//! Built-in setup units.
//!
//! Each unit targets one concern of a fresh Debian-family machine: package
//! manager hardening, SSH access, a desktop environment, shell comfort, and
//! GUI launch helpers. Units are registered by name through
//! [`builtin_registry`]; the orchestrator only ever sees the [`Unit`] trait.

pub mod apt;
pub mod desktop;
pub mod gui;
pub mod shell_env;
pub mod ssh;

pub use apt::AptUnit;
pub use desktop::DesktopUnit;
pub use gui::GuiUnit;
pub use shell_env::ShellEnvUnit;
pub use ssh::SshUnit;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::unit::UnitRegistry;

/// Build a registry holding every built-in unit.
pub fn builtin_registry() -> UnitRegistry {
    let mut registry = UnitRegistry::new();
    registry.register("apt", |config, options| {
        Box::new(AptUnit::new(config, options))
    });
    registry.register("ssh", |config, options| {
        Box::new(SshUnit::new(config, options))
    });
    registry.register("desktop", |config, options| {
        Box::new(DesktopUnit::new(config, options))
    });
    registry.register("shell", |config, options| {
        Box::new(ShellEnvUnit::new(config, options))
    });
    registry.register("gui", |config, options| {
        Box::new(GuiUnit::new(config, options))
    });
    registry
}

pub(crate) fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"))
}

/// Write a managed file, creating parent directories as needed.
pub(crate) fn write_file(path: &Path, content: &str, executable: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = if executable { 0o755 } else { 0o644 };
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = executable;

    Ok(())
}

fn snippet_markers(marker: &str) -> (String, String) {
    (
        format!("# >>> {marker} >>>"),
        format!("# <<< {marker} <<<"),
    )
}

/// Idempotently install a marker-delimited snippet in a shell profile.
///
/// An existing block with the same marker is replaced in place; otherwise
/// the block is appended. The file is created if missing.
pub(crate) fn ensure_snippet(path: &Path, marker: &str, snippet: &str) -> Result<()> {
    let (begin, end) = snippet_markers(marker);
    let block = format!("{begin}\n{snippet}\n{end}\n");

    let existing = if path.exists() {
        fs::read_to_string(path)?
    } else {
        String::new()
    };

    let updated = match (existing.find(&begin), existing.find(&end)) {
        (Some(start), Some(stop)) if stop > start => {
            let after = existing[stop..]
                .find('\n')
                .map(|i| stop + i + 1)
                .unwrap_or(existing.len());
            format!("{}{}{}", &existing[..start], block, &existing[after..])
        }
        _ => {
            if existing.is_empty() || existing.ends_with('\n') {
                format!("{existing}{block}")
            } else {
                format!("{existing}\n{block}")
            }
        }
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, updated)?;
    Ok(())
}

/// Whether a marker-delimited snippet is present in the file.
pub(crate) fn snippet_present(path: &Path, marker: &str) -> bool {
    let (begin, _) = snippet_markers(marker);
    fs::read_to_string(path)
        .map(|content| content.contains(&begin))
        .unwrap_or(false)
}
