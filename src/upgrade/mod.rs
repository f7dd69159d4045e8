//! Self-update for command-line tools.
//!
//! This module lets a tool check whether a newer build of itself has been
//! published and replace its own executable with that build. Releases are plain
//! files on an HTTP artifact server:
//!
//! ```text
//! {repo_base}/version-stable                    "1.2.3"
//! {repo_base}/1.2.3/mytool_linux_x86_64         executable bytes
//! {repo_base}/1.2.3/mytool_macos_aarch64        executable bytes
//! ```
//!
//! # Components
//!
//! - [`VersionResolver`]: fetches the version a channel currently points at
//! - [`UpdateGate`]: limits automatic checks to one per interval using a marker file
//! - [`Downloader`]: streams the platform binary to an executable temp file
//! - [`Replacer`]: swaps the executable for the download, rolling back on failure
//! - [`VersionChecker`]: gate + resolver + notice, for running at every startup
//! - [`SelfUpdater`]: resolver + downloader + replacer, for an explicit upgrade command
//!
//! # Upgrade Flow
//!
//! ```text
//! 1. Resolve
//!    ├── Parse the running version
//!    └── GET the channel file, stop if not newer (unless forced)
//!
//! 2. Stage
//!    ├── Remove {exe}~ left by a previous upgrade
//!    └── Download the new binary to a temp file (mode 0755)
//!
//! 3. Swap
//!    ├── Rename {exe} -> {exe}~
//!    ├── Copy temp -> {exe}
//!    └── On copy failure rename {exe}~ -> {exe}
//!
//! 4. Clean up
//!    └── Remove the temp file, keep {exe}~ for manual rollback
//! ```
//!
//! The only outcome that leaves no executable behind is a failed copy followed by
//! a failed rollback rename, reported as
//! [`UpgradeError::UpgradeFailedUnrecoverable`](crate::core::UpgradeError::UpgradeFailedUnrecoverable)
//! together with both paths needed to fix it by hand.
//!
//! # Concurrency
//!
//! Every operation is sequential. Nothing guards against two processes upgrading
//! the same executable at once.
//!
//! # Example
//!
//! ```rust,no_run
//! use selfup::config::UpgradeConfig;
//! use selfup::upgrade::{SelfUpdater, UpgradeStatus};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = UpgradeConfig::new("https://releases.example.com/mytool");
//! let updater = SelfUpdater::new("mytool", env!("CARGO_PKG_VERSION"), &config)?;
//!
//! if let Err(e) = updater.upgrade().await {
//!     if let Some(steps) = e.remediation() {
//!         eprintln!("{steps}");
//!     }
//!     return Err(e.into());
//! }
//! # Ok(())
//! # }
//! ```

/// Rename-based backup of the executable being replaced.
pub mod backup;
/// Platform binary download into a temporary file.
pub mod download;
/// Marker-file gate limiting how often versions are checked.
pub mod gate;
/// Executable replacement with rollback.
pub mod replacer;
/// Channel version resolution over HTTP.
pub mod resolver;
/// Explicit upgrade of the running executable.
pub mod self_updater;
/// Semantic version parsing and precedence.
pub mod version;
/// Rate-limited update notification.
pub mod version_check;


pub use download::Downloader;
pub use gate::UpdateGate;
pub use replacer::{ReplaceOutcome, Replacer};
pub use resolver::{ChannelDescriptor, VersionResolver, http_client};
pub use self_updater::{SelfUpdater, UpgradeStatus};
pub use version::Version;
pub use version_check::VersionChecker;
