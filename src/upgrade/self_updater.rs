use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::UpgradeConfig;
use crate::core::Result;
use crate::upgrade::download::Downloader;
use crate::upgrade::replacer::Replacer;
use crate::upgrade::resolver::{ChannelDescriptor, VersionResolver, http_client};
use crate::upgrade::version::{self, Version};
use crate::utils::platform::Platform;

/// What [`SelfUpdater::upgrade`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeStatus {
    /// The running version is already at or past the channel's version. Nothing
    /// was downloaded or changed on disk.
    UpToDate {
        /// The running version
        current: Version,
    },
    /// The executable was replaced.
    Upgraded {
        /// The version that was running
        from: Version,
        /// The version now installed
        to: Version,
        /// Where the previous binary was kept
        backup: PathBuf,
    },
}

/// Upgrades a tool's own executable from its release channel.
///
/// `SelfUpdater` resolves the channel's version, compares it with the running
/// version, and when newer (or when forced) downloads the platform binary and swaps
/// it in with a [`Replacer`]. The previous binary is left next to the executable
/// with a `~` suffix.
///
/// # Examples
///
/// ## Check for Updates
/// ```rust,no_run
/// use selfup::config::UpgradeConfig;
/// use selfup::upgrade::SelfUpdater;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = UpgradeConfig::new("https://releases.example.com/mytool");
/// let updater = SelfUpdater::new("mytool", env!("CARGO_PKG_VERSION"), &config)?;
///
/// if let Some(available) = updater.check_for_update().await? {
///     println!("Update available: {} -> {}", updater.current_version(), available);
/// }
/// # Ok(())
/// # }
/// ```
///
/// ## Upgrade
/// ```rust,no_run
/// use selfup::config::UpgradeConfig;
/// use selfup::upgrade::{SelfUpdater, UpgradeStatus};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = UpgradeConfig::new("https://releases.example.com/mytool");
/// let updater = SelfUpdater::new("mytool", env!("CARGO_PKG_VERSION"), &config)?;
///
/// match updater.upgrade().await? {
///     UpgradeStatus::Upgraded { backup, .. } => println!("Previous binary kept at {}", backup.display()),
///     UpgradeStatus::UpToDate { .. } => {}
/// }
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Every failure is an [`UpgradeError`](crate::core::UpgradeError) naming the paths
/// involved; [`remediation`](crate::core::UpgradeError::remediation) spells out the
/// manual steps when an upgrade stopped halfway.
#[derive(Debug, Clone)]
pub struct SelfUpdater {
    tool: String,
    current_version: String,
    channel: ChannelDescriptor,
    force: bool,
    resolver: VersionResolver,
    downloader: Downloader,
    /// Executable to replace; the running one when `None`.
    executable_path: Option<PathBuf>,
}

impl SelfUpdater {
    /// Create an updater for `tool`, currently running `current_version`.
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::HttpClient`](crate::core::UpgradeError::HttpClient)
    /// if the HTTP client cannot be built.
    pub fn new(tool: &str, current_version: &str, config: &UpgradeConfig) -> Result<Self> {
        let client = http_client(config.timeout())?;
        let downloader = Downloader::new(client.clone())
            .with_temp_dir(config.temp_dir.clone())
            .with_progress(config.show_progress)
            .with_stall_timeout(config.timeout());

        Ok(Self {
            tool: tool.to_string(),
            current_version: current_version.to_string(),
            channel: config.channel(),
            force: false,
            resolver: VersionResolver::new(client, config.timeout()),
            downloader,
            executable_path: None,
        })
    }

    /// Reinstall even when the running version is current.
    #[must_use]
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Download binaries built for `platform`.
    #[must_use]
    pub fn platform(mut self, platform: Platform) -> Self {
        self.downloader = self.downloader.with_platform(platform);
        self
    }

    /// Replace the executable at `path` instead of the running one.
    #[must_use]
    pub fn executable_path(mut self, path: PathBuf) -> Self {
        self.executable_path = Some(path);
        self
    }

    /// The version the updater considers to be running.
    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    /// Return the channel's version if it is newer than the running one.
    ///
    /// Ignores the update gate and prints nothing.
    ///
    /// # Errors
    ///
    /// Returns version parsing and resolver errors.
    pub async fn check_for_update(&self) -> Result<Option<Version>> {
        let current = version::parse(&self.current_version)?;
        let available = self.resolver.fetch_available_version(&self.channel).await?;

        if version::is_newer(&current, &available) {
            Ok(Some(available))
        } else {
            Ok(None)
        }
    }

    /// Replace the executable with the channel's version.
    ///
    /// Unless forced, returns [`UpgradeStatus::UpToDate`] without downloading
    /// anything when the running version is at least the channel's. Otherwise:
    ///
    /// 1. Removes the backup left by a previous upgrade
    /// 2. Downloads the new binary to a temporary file
    /// 3. Renames the executable to the backup path
    /// 4. Copies the new binary into place, renaming the backup back if that fails
    ///
    /// # Errors
    ///
    /// Any [`UpgradeError`](crate::core::UpgradeError). A download failure leaves
    /// the installation untouched; see [`Replacer::install`] for the failures after
    /// the executable has been moved.
    pub async fn upgrade(&self) -> Result<UpgradeStatus> {
        let current = version::parse(&self.current_version)?;
        let available = self.resolver.fetch_available_version(&self.channel).await?;

        if !self.force && version::is_up_to_date(&current, &available) {
            debug!("{} {} is not older than {}", self.tool, current, available);
            println!("{} is up-to-date.", self.tool);
            return Ok(UpgradeStatus::UpToDate {
                current,
            });
        }

        let replacer = match &self.executable_path {
            Some(path) => Replacer::new(path.clone()),
            None => Replacer::for_current_exe()?,
        };
        replacer.prepare().await?;

        println!("upgrading {} to {}", replacer.executable_path().display(), available);
        let staged = self.downloader.download(self.channel.base(), &available, &self.tool).await?;
        let outcome = replacer.install(&staged).await?;

        info!("Upgraded {} from {} to {}", self.tool, current, available);
        Ok(UpgradeStatus::Upgraded {
            from: current,
            to: available,
            backup: outcome.backup,
        })
    }
}
