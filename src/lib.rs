//! selfup - self-update for command-line tools
//!
//! A library that lets a CLI tool upgrade its own executable from a simple HTTP
//! artifact repository and tell its users, at most once per interval, that a newer
//! version is out.
//!
//! # Architecture Overview
//!
//! The artifact repository is a directory of static files:
//!
//! ```text
//! https://releases.example.com/mytool/
//! ├── version-stable             "1.2.3"
//! ├── version-beta               "1.3.0-rc.1"
//! ├── 1.2.3/
//! │   ├── mytool_linux_x86_64
//! │   └── mytool_macos_aarch64
//! └── 1.3.0-rc.1/
//!     └── ...
//! ```
//!
//! A tool typically wires selfup in twice: a quick, rate-limited check when it
//! starts, and an explicit `upgrade` subcommand.
//!
//! ```rust,no_run
//! use selfup::config::UpgradeConfig;
//! use selfup::upgrade::{SelfUpdater, VersionChecker};
//! use selfup::utils::get_home_dir;
//!
//! # async fn example(upgrade_requested: bool) -> anyhow::Result<()> {
//! let config = UpgradeConfig::new("https://releases.example.com/mytool");
//! let version = env!("CARGO_PKG_VERSION");
//!
//! if upgrade_requested {
//!     SelfUpdater::new("mytool", version, &config)?.upgrade().await?;
//! } else {
//!     let checker = VersionChecker::new("mytool", &get_home_dir()?, &config)?;
//!     checker.check_and_notify(version, &config.upgrade_command).await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`config`] - Upgrade settings, loadable from TOML
//! - [`core`] - Error types and user-facing error formatting
//! - [`upgrade`] - Version resolution, the check gate, download and replacement
//! - [`utils`] - Home directory lookup, platform naming, progress bars
//!
//! # Logging
//!
//! selfup emits [`tracing`] events but never installs a subscriber; the host tool
//! decides where they go.

pub mod config;
pub mod core;
pub mod upgrade;
pub mod utils;

// test_utils is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
