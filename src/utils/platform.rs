//! Platform identification and home directory lookup
//!
//! The upgrade workflow needs two facts about the machine it runs on: where the
//! user's home directory is (for the version check marker) and which OS and
//! architecture to download a binary for. Both are resolved here once, at the call
//! site, and then passed down explicitly so tests can substitute their own values.

use anyhow::{Result, anyhow};
use std::fmt;
use std::path::PathBuf;

/// Environment variable consulted first for the home directory.
pub const HOME_VAR: &str = "HOME";

/// Fallback environment variable for platforms that name the home directory differently.
pub const FALLBACK_HOME_VAR: &str = "USERPROFILE";

/// Resolve the user's home directory.
///
/// Lookup order:
/// 1. `$HOME`
/// 2. `$USERPROFILE`
/// 3. the platform home directory reported by [`dirs::home_dir`]
///
/// Empty variables are treated as unset.
///
/// # Errors
///
/// Returns an error when none of the sources yields a directory.
pub fn get_home_dir() -> Result<PathBuf> {
    [HOME_VAR, FALLBACK_HOME_VAR]
        .iter()
        .filter_map(|var| std::env::var_os(var))
        .find(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .ok_or_else(|| {
            anyhow!(
                "Could not determine home directory. Set {HOME_VAR} (or {FALLBACK_HOME_VAR} on Windows)"
            )
        })
}

/// Operating system and CPU architecture tokens used in artifact names.
///
/// Defaults to the running process's [`std::env::consts::OS`] and
/// [`std::env::consts::ARCH`] (for example `linux` / `x86_64`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// Operating system token, e.g. `linux`, `macos`, `windows`
    pub os: String,
    /// Architecture token, e.g. `x86_64`, `aarch64`
    pub arch: String,
}

impl Platform {
    /// A platform with explicit tokens.
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// The platform this process is running on.
    #[must_use]
    pub fn current() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// The published artifact name for `tool` on this platform: `tool_<os>_<arch>`.
    #[must_use]
    pub fn artifact_name(&self, tool: &str) -> String {
        format!("{tool}_{}_{}", self.os, self.arch)
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}
