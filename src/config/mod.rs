//! Configuration for the upgrade workflow.
//!
//! A tool embedding selfup describes where its releases live and how often to look
//! for new ones with an [`UpgradeConfig`]. The configuration can be built in code
//! or loaded from a TOML file:
//!
//! ```toml
//! repo_base = "https://releases.example.com/mytool"
//! file_prefix = "version-"
//! channel = "stable"
//! check_interval_hours = 24.0
//! upgrade_command = "mytool upgrade"
//! timeout_secs = 30
//! show_progress = true
//! ```
//!
//! Only `repo_base` is required; every other field has a default.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::upgrade::ChannelDescriptor;

/// Settings controlling where and how often selfup looks for upgrades.
///
/// # Examples
///
/// ```rust,no_run
/// use selfup::config::UpgradeConfig;
///
/// let config = UpgradeConfig::new("https://releases.example.com/mytool");
/// assert_eq!(config.channel, "stable");
/// assert_eq!(config.check_interval_hours, 24.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeConfig {
    /// Base URL of the artifact repository, without a trailing slash.
    pub repo_base: String,

    /// Prefix of the file naming the available version; the channel name is appended to it.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Release channel to follow.
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Minimum number of hours between two automatic version checks.
    ///
    /// `0` checks on every call.
    #[serde(default = "default_check_interval_hours")]
    pub check_interval_hours: f64,

    /// Command shown to users when an upgrade is available.
    #[serde(default = "default_upgrade_command")]
    pub upgrade_command: String,

    /// Network timeout, in seconds.
    ///
    /// Bounds connecting, the whole version request, and each silence during a
    /// download. A download as a whole may take longer.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Whether to draw a progress bar while downloading.
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,

    /// Directory for the downloaded binary before it is installed.
    ///
    /// Defaults to the system temporary directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
}

fn default_file_prefix() -> String {
    "version-".to_string()
}

fn default_channel() -> String {
    "stable".to_string()
}

fn default_check_interval_hours() -> f64 {
    24.0
}

fn default_upgrade_command() -> String {
    "upgrade".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_show_progress() -> bool {
    true
}

impl UpgradeConfig {
    /// A configuration for `repo_base` with every other setting at its default.
    pub fn new(repo_base: impl Into<String>) -> Self {
        Self {
            repo_base: repo_base.into(),
            file_prefix: default_file_prefix(),
            channel: default_channel(),
            check_interval_hours: default_check_interval_hours(),
            upgrade_command: default_upgrade_command(),
            timeout_secs: default_timeout_secs(),
            show_progress: default_show_progress(),
            temp_dir: None,
        }
    }

    /// Load and validate a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, does not
    /// match the schema, or fails [`validate`](Self::validate).
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read upgrade config from {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse upgrade config from {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid upgrade config in {}", path.display()))?;
        Ok(config)
    }

    /// Check the settings for values the workflow cannot use.
    ///
    /// # Errors
    ///
    /// Returns an error when `repo_base` is blank or the check interval is
    /// negative or not a finite number.
    pub fn validate(&self) -> Result<()> {
        if self.repo_base.trim().is_empty() {
            bail!("repo_base must not be empty");
        }
        if !self.check_interval_hours.is_finite() || self.check_interval_hours < 0.0 {
            bail!(
                "check_interval_hours must be a non-negative number, got {}",
                self.check_interval_hours
            );
        }
        Ok(())
    }

    /// The channel endpoint described by this configuration.
    #[must_use]
    pub fn channel(&self) -> ChannelDescriptor {
        ChannelDescriptor::new(&self.repo_base, &self.file_prefix, &self.channel)
    }

    /// The per-request HTTP timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = UpgradeConfig::new("https://example.com/tool");
        assert_eq!(config.file_prefix, "version-");
        assert_eq!(config.channel, "stable");
        assert_eq!(config.check_interval_hours, 24.0);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.show_progress);
        assert!(config.temp_dir.is_none());
    }

    #[test]
    fn test_channel_url() {
        let config = UpgradeConfig::new("https://example.com/tool/");
        assert_eq!(config.channel().url(), "https://example.com/tool/version-stable");
    }

    #[tokio::test]
    async fn test_load_minimal_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("upgrade.toml");
        fs::write(&path, "repo_base = \"https://example.com/tool\"\nchannel = \"beta\"\n").await?;

        let config = UpgradeConfig::load_from(&path).await?;
        assert_eq!(config.repo_base, "https://example.com/tool");
        assert_eq!(config.channel, "beta");
        assert_eq!(config.check_interval_hours, 24.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_rejects_negative_interval() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("upgrade.toml");
        fs::write(&path, "repo_base = \"https://example.com/tool\"\ncheck_interval_hours = -1.0\n")
            .await?;

        let error = UpgradeConfig::load_from(&path).await.unwrap_err();
        assert!(format!("{error:#}").contains("check_interval_hours"));
        Ok(())
    }

    #[tokio::test]
    async fn test_load_missing_repo_base() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("upgrade.toml");
        fs::write(&path, "channel = \"beta\"\n").await?;

        let error = UpgradeConfig::load_from(&path).await.unwrap_err();
        assert!(error.to_string().contains("Failed to parse upgrade config"));
        Ok(())
    }

    #[test]
    fn test_validate_blank_repo_base() {
        let config = UpgradeConfig::new("   ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip_omits_unset_temp_dir() -> Result<()> {
        let config = UpgradeConfig::new("https://example.com/tool");
        let text = toml::to_string(&config)?;
        assert!(!text.contains("temp_dir"));
        assert_eq!(toml::from_str::<UpgradeConfig>(&text)?, config);
        Ok(())
    }
}
