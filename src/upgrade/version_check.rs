use colored::Colorize;
use std::path::Path;
use tracing::{debug, info};

use crate::config::UpgradeConfig;
use crate::core::Result;
use crate::upgrade::gate::UpdateGate;
use crate::upgrade::resolver::{ChannelDescriptor, VersionResolver, http_client};
use crate::upgrade::version;

/// Rate-limited check for newer releases, suitable for running on every invocation.
///
/// `VersionChecker` consults an [`UpdateGate`] before touching the network, so
/// a tool can call [`check_and_notify`](Self::check_and_notify) at startup and
/// hit the artifact server at most once per configured interval.
///
/// # Examples
///
/// ```rust,no_run
/// use selfup::config::UpgradeConfig;
/// use selfup::upgrade::VersionChecker;
/// use selfup::utils::get_home_dir;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = UpgradeConfig::new("https://releases.example.com/mytool");
/// let checker = VersionChecker::new("mytool", &get_home_dir()?, &config)?;
///
/// if checker.check_and_notify(env!("CARGO_PKG_VERSION"), "mytool upgrade").await? {
///     // A notice was printed to stderr.
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct VersionChecker {
    tool: String,
    gate: UpdateGate,
    resolver: VersionResolver,
    channel: ChannelDescriptor,
    interval_hours: f64,
}

impl VersionChecker {
    /// Create a checker for `tool` with its marker file in `home_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::HttpClient`](crate::core::UpgradeError::HttpClient)
    /// if the HTTP client cannot be built.
    pub fn new(tool: &str, home_dir: &Path, config: &UpgradeConfig) -> Result<Self> {
        let client = http_client(config.timeout())?;
        Ok(Self::from_parts(
            tool,
            UpdateGate::new(home_dir, tool),
            VersionResolver::new(client, config.timeout()),
            config.channel(),
            config.check_interval_hours,
        ))
    }

    /// Assemble a checker from already-built components.
    pub fn from_parts(
        tool: &str,
        gate: UpdateGate,
        resolver: VersionResolver,
        channel: ChannelDescriptor,
        interval_hours: f64,
    ) -> Self {
        Self {
            tool: tool.to_string(),
            gate,
            resolver,
            channel,
            interval_hours,
        }
    }

    /// The gate deciding when checks happen.
    pub fn gate(&self) -> &UpdateGate {
        &self.gate
    }

    /// Check for a newer release if the interval has elapsed, and tell the user.
    ///
    /// Returns `false` without any network access while the gate is closed.
    /// Otherwise fetches the channel's version and, if it is newer than
    /// `current_version`, prints a one-line notice naming `upgrade_command` to
    /// stderr and returns `true`.
    ///
    /// # Errors
    ///
    /// Gate I/O errors, an unparsable `current_version`, and every resolver error
    /// are returned as-is. The gate has already been reset by then, so a failing
    /// check is not retried before the next interval.
    pub async fn check_and_notify(&self, current_version: &str, upgrade_command: &str) -> Result<bool> {
        if !self.gate.should_check(self.interval_hours).await? {
            return Ok(false);
        }

        let current = version::parse(current_version)?;
        let available = self.resolver.fetch_available_version(&self.channel).await?;

        if version::is_newer(&current, &available) {
            info!("{} {} is available (running {})", self.tool, available, current);
            Self::display_update_notification(&self.tool, upgrade_command);
            Ok(true)
        } else {
            debug!("{} {} is current", self.tool, current);
            Ok(false)
        }
    }

    /// Print the update notice to stderr.
    pub fn display_update_notification(tool: &str, upgrade_command: &str) {
        eprintln!("{}", Self::format_notification(tool, upgrade_command));
    }

    fn format_notification(tool: &str, upgrade_command: &str) -> String {
        format!(
            "A new version of [{}] is available, run: {}",
            tool.bright_cyan(),
            upgrade_command.bold()
        )
    }

    /// Make the next [`check_and_notify`](Self::check_and_notify) go to the network.
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::CacheIoError`](crate::core::UpgradeError::CacheIoError)
    /// if the marker cannot be written.
    pub async fn clear_cache(&self) -> Result<()> {
        self.gate.expire().await
    }
}
