//! Test utilities for selfup
//!
//! This module provides helpers for tests that exercise the upgrade workflow end
//! to end without touching the real executable or the network:
//! - [`ArtifactServer`]: a local HTTP server publishing channel files and binaries
//! - [`FakeInstall`]: a temporary "installed" executable, home and temp directory
//! - [`init_test_logging`]: tracing output for debugging failing tests
//!
//! # Example
//!
//! ```rust,no_run
//! use selfup::test_utils::{ArtifactServer, FakeInstall};
//! use selfup::upgrade::SelfUpdater;
//! use selfup::utils::Platform;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let server = ArtifactServer::start().await;
//! server.serve_channel("stable", "1.2.3").await;
//! server.serve_binary("1.2.3", "mytool", &Platform::current(), b"new").await;
//!
//! let install = FakeInstall::new("mytool", b"old")?;
//! let updater = SelfUpdater::new("mytool", "1.2.2", &install.configure(server.config()))?
//!     .executable_path(install.executable.clone());
//! updater.upgrade().await?;
//! assert_eq!(install.read_executable()?, b"new");
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::UpgradeConfig;
use crate::utils::platform::Platform;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call installs a subscriber. Uses `level` when given, otherwise
/// `RUST_LOG`; does nothing when neither is set.
///
/// ```bash
/// RUST_LOG=selfup=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// A local artifact repository backed by [`wiremock`].
pub struct ArtifactServer {
    server: MockServer,
}

impl ArtifactServer {
    /// Start a server with nothing published.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL of the repository.
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Publish `version` on `channel` under the default `version-` prefix.
    pub async fn serve_channel(&self, channel: &str, version: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/version-{channel}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!("{version}\n")))
            .mount(&self.server)
            .await;
    }

    /// Publish the `tool` binary for `platform` at `version`.
    pub async fn serve_binary(&self, version: &str, tool: &str, platform: &Platform, body: &[u8]) {
        Mock::given(method("GET"))
            .and(path(Self::binary_path(version, tool, platform)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .mount(&self.server)
            .await;
    }

    /// Answer `status` for the `tool` binary for `platform` at `version`.
    pub async fn fail_binary(&self, version: &str, tool: &str, platform: &Platform, status: u16) {
        Mock::given(method("GET"))
            .and(path(Self::binary_path(version, tool, platform)))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Number of requests received for `request_path`.
    pub async fn requests_to(&self, request_path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == request_path)
            .count()
    }

    /// Request path of a published binary.
    pub fn binary_path(version: &str, tool: &str, platform: &Platform) -> String {
        format!("/{version}/{}", platform.artifact_name(tool))
    }

    /// A configuration pointing at this server, with progress output off.
    pub fn config(&self) -> UpgradeConfig {
        let mut config = UpgradeConfig::new(self.uri());
        config.show_progress = false;
        config
    }
}

/// A throwaway installation of a tool.
///
/// ```text
/// <tmp>/
/// ├── bin/<tool>    the "installed" executable
/// ├── home/         home directory holding the version-check marker
/// └── downloads/    temporary directory for downloaded binaries
/// ```
pub struct FakeInstall {
    _root: TempDir,
    /// The installed executable
    pub executable: PathBuf,
    /// Home directory
    pub home: PathBuf,
    /// Directory downloads are staged in
    pub downloads: PathBuf,
}

impl FakeInstall {
    /// Install `tool` with `contents` as its executable.
    pub fn new(tool: &str, contents: &[u8]) -> Result<Self> {
        let root = TempDir::new().context("Failed to create temp directory")?;
        let bin = root.path().join("bin");
        let home = root.path().join("home");
        let downloads = root.path().join("downloads");
        for dir in [&bin, &home, &downloads] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let executable = bin.join(tool);
        std::fs::write(&executable, contents)
            .with_context(|| format!("Failed to write {}", executable.display()))?;

        Ok(Self {
            _root: root,
            executable,
            home,
            downloads,
        })
    }

    /// Point `config` at this installation's download directory.
    pub fn configure(&self, mut config: UpgradeConfig) -> UpgradeConfig {
        config.temp_dir = Some(self.downloads.clone());
        config
    }

    /// Current contents of the executable.
    pub fn read_executable(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.executable)
            .with_context(|| format!("Failed to read {}", self.executable.display()))
    }

    /// Where an upgrade keeps the previous executable.
    pub fn backup_path(&self) -> PathBuf {
        let mut backup = self.executable.clone().into_os_string();
        backup.push("~");
        PathBuf::from(backup)
    }

    /// Files left in the download directory.
    pub fn staged_files(&self) -> Result<Vec<PathBuf>> {
        list_dir(&self.downloads)
    }
}

fn list_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        entries.push(entry?.path());
    }
    Ok(entries)
}
