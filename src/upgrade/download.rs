//! Platform binary download.
//!
//! Binaries are published once per platform under the version they belong to:
//!
//! ```text
//! GET {repo_base}/{version}/{tool}_{os}_{arch}   ->   200 <raw executable>
//! ```
//!
//! The body is streamed into a fresh temporary file marked executable. The file
//! is kept only when the whole body arrived; every failure path removes it.
//!
//! There is no deadline on the download as a whole. Instead each chunk must arrive
//! within the stall timeout of the previous one.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::core::{Result, UpgradeError};
use crate::upgrade::version::Version;
use crate::utils::platform::Platform;
use crate::utils::progress;

/// Longest wait for the next chunk of a download unless configured otherwise.
pub const DEFAULT_STALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloads platform-specific release binaries.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: reqwest::Client,
    platform: Platform,
    temp_dir: Option<PathBuf>,
    show_progress: bool,
    stall_timeout: Duration,
}

impl Downloader {
    /// A downloader for the running platform, writing to the system temp directory.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            platform: Platform::current(),
            temp_dir: None,
            show_progress: false,
            stall_timeout: DEFAULT_STALL_TIMEOUT,
        }
    }

    /// Abort when the server sends nothing for `timeout`, before or between chunks.
    #[must_use]
    pub fn with_stall_timeout(mut self, timeout: Duration) -> Self {
        self.stall_timeout = timeout;
        self
    }

    /// Download binaries for `platform` instead of the running one.
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Create temporary files in `dir` instead of the system temp directory.
    #[must_use]
    pub fn with_temp_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.temp_dir = dir;
        self
    }

    /// Draw a progress bar while downloading.
    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// The platform binaries are downloaded for.
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// The binary URL for `tool` at `version`.
    #[must_use]
    pub fn binary_url(&self, repo_base: &str, version: &Version, tool: &str) -> String {
        format!(
            "{}/{}/{}",
            repo_base.trim_end_matches('/'),
            version,
            self.platform.artifact_name(tool)
        )
    }

    /// Download `tool` at `version` into a new executable temporary file.
    ///
    /// Returns the path of the file, which the caller now owns.
    ///
    /// # Errors
    ///
    /// - [`UpgradeError::NetworkError`] if the request or the body stream fails
    /// - [`UpgradeError::UnexpectedStatus`] if the server does not answer `200 OK`
    /// - [`UpgradeError::DownloadStalled`] if the server goes quiet for longer
    ///   than the stall timeout
    /// - [`UpgradeError::WriteError`] if the temporary file cannot be created,
    ///   made executable, or written
    ///
    /// The temporary file is removed before any of these is returned.
    pub async fn download(&self, repo_base: &str, version: &Version, tool: &str) -> Result<PathBuf> {
        let (file, temp_path) = self.create_temp_file(tool)?;
        let url = self.binary_url(repo_base, version, tool);
        info!("Downloading {} {} for {} from {}", tool, version, self.platform, url);

        // `temp_path` deletes the file on drop, so every `?` below cleans up.
        self.fetch_into(&url, tool, file, &temp_path).await?;

        let path = temp_path.keep().map_err(|e| UpgradeError::WriteError {
            path: e.path.to_path_buf(),
            source: e.error,
        })?;

        debug!("Downloaded {} to {}", url, path.display());
        Ok(path)
    }

    fn create_temp_file(&self, tool: &str) -> Result<(File, TempPath)> {
        let prefix = format!("{tool}_upgrade");
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);

        let temp_dir = self.temp_dir.clone().unwrap_or_else(std::env::temp_dir);
        let named = builder.tempfile_in(&temp_dir).map_err(|source| UpgradeError::WriteError {
            path: temp_dir.join(&prefix),
            source,
        })?;

        let (file, temp_path) = named.into_parts();
        make_executable(&file, &temp_path)?;
        Ok((file, temp_path))
    }

    async fn fetch_into(&self, url: &str, tool: &str, file: File, path: &Path) -> Result<()> {
        let network_error = |source| UpgradeError::NetworkError {
            url: url.to_string(),
            source,
        };
        let write_error = |source| UpgradeError::WriteError {
            path: path.to_path_buf(),
            source,
        };

        let stalled = || UpgradeError::DownloadStalled {
            url: url.to_string(),
            idle: self.stall_timeout,
        };

        let mut response = tokio::time::timeout(self.stall_timeout, self.client.get(url).send())
            .await
            .map_err(|_| stalled())?
            .map_err(network_error)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(UpgradeError::UnexpectedStatus {
                url: url.to_string(),
                status,
            });
        }

        let bar = progress::download_bar(response.content_length(), self.show_progress, tool);
        let mut out = tokio::fs::File::from_std(file);

        while let Some(chunk) = tokio::time::timeout(self.stall_timeout, response.chunk())
            .await
            .map_err(|_| stalled())?
            .map_err(network_error)?
        {
            out.write_all(&chunk).await.map_err(write_error)?;
            bar.inc(chunk.len() as u64);
        }

        out.flush().await.map_err(write_error)?;
        out.sync_all().await.map_err(write_error)?;
        bar.finish_and_clear();
        Ok(())
    }
}

/// Mark the downloaded file `rwxr-xr-x`.
#[cfg(unix)]
fn make_executable(file: &File, path: &Path) -> Result<()> {
    use std::fs::Permissions;
    use std::io;
    use std::os::unix::fs::PermissionsExt;

    match file.set_permissions(Permissions::from_mode(0o755)) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::Unsupported => {
            debug!("Executable bit not supported for {}: {}", path.display(), e);
            Ok(())
        }
        Err(source) => Err(UpgradeError::WriteError {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Executable permission bits do not exist here.
#[cfg(not(unix))]
fn make_executable(_file: &File, path: &Path) -> Result<()> {
    debug!("Executable bit not supported for {}", path.display());
    Ok(())
}
