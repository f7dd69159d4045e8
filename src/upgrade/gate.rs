//! Time gate for automatic update checks.
//!
//! The gate keeps an empty marker file at `{home}/.{tool}-version-check`. Only its
//! modification time matters: when the marker is older than the configured
//! interval, [`UpdateGate::should_check`] truncates it (refreshing the mtime) and
//! reports that a network check is due. The marker is reset *before* the caller
//! hits the network, so quick successive invocations do not check twice.
//!
//! The marker is a staleness timestamp, not a lock. Two processes racing past the
//! gate will both check.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs::{self, OpenOptions};
use tracing::{debug, trace};

use crate::core::{Result, UpgradeError};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Decides whether enough time has passed since the last version check.
#[derive(Debug, Clone)]
pub struct UpdateGate {
    marker_path: PathBuf,
}

impl UpdateGate {
    /// A gate for `tool` whose marker lives in `home_dir`.
    pub fn new(home_dir: &Path, tool: &str) -> Self {
        Self {
            marker_path: home_dir.join(format!(".{tool}-version-check")),
        }
    }

    /// Path of the marker file.
    pub fn marker_path(&self) -> &Path {
        &self.marker_path
    }

    /// Decide against the current time. See [`should_check_at`](Self::should_check_at).
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::CacheIoError`] if the marker cannot be created,
    /// inspected, or reset.
    pub async fn should_check(&self, interval_hours: f64) -> Result<bool> {
        self.should_check_at(interval_hours, SystemTime::now()).await
    }

    /// Decide whether a check is due at `now`.
    ///
    /// Creates the marker if it does not exist. Returns `false` and leaves the
    /// marker alone while `now - mtime` is under `interval_hours`. Otherwise
    /// empties the marker, stamps it with `now`, and returns `true`. A marker
    /// stamped in the future counts as just checked.
    ///
    /// A freshly created marker has an mtime of roughly `now`, so the first call
    /// only checks when `interval_hours` is zero.
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::CacheIoError`] if the marker cannot be created,
    /// inspected, or reset.
    pub async fn should_check_at(&self, interval_hours: f64, now: SystemTime) -> Result<bool> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.marker_path)
            .await
            .map_err(|source| self.io_error("open", source))?;

        let modified = file
            .metadata()
            .await
            .and_then(|metadata| metadata.modified())
            .map_err(|source| self.io_error("stat", source))?;

        let elapsed = now.duration_since(modified).unwrap_or(Duration::ZERO);
        let elapsed_hours = elapsed.as_secs_f64() / SECONDS_PER_HOUR;
        trace!(
            "Version check marker {} is {:.2}h old",
            self.marker_path.display(),
            elapsed_hours
        );

        if elapsed_hours < interval_hours {
            debug!("Skipping version check, last check {:.2}h ago", elapsed_hours);
            return Ok(false);
        }

        file.set_len(0).await.map_err(|source| self.io_error("truncate", source))?;

        let file = file.into_std().await;
        file.set_modified(now).map_err(|source| self.io_error("update mtime of", source))?;

        debug!("Version check due, marker {} reset", self.marker_path.display());
        Ok(true)
    }

    /// Backdate the marker so the next call to [`should_check`](Self::should_check) checks.
    ///
    /// Creates the marker if needed and stamps it with the Unix epoch.
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::CacheIoError`] if the marker cannot be created or stamped.
    pub async fn expire(&self) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.marker_path)
            .await
            .map_err(|source| self.io_error("open", source))?;

        file.into_std()
            .await
            .set_modified(SystemTime::UNIX_EPOCH)
            .map_err(|source| self.io_error("update mtime of", source))?;

        debug!("Expired version check marker {}", self.marker_path.display());
        Ok(())
    }

    fn io_error(&self, operation: &'static str, source: std::io::Error) -> UpgradeError {
        UpgradeError::CacheIoError {
            operation,
            path: self.marker_path.clone(),
            source,
        }
    }
}
