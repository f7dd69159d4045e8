//! Remote version resolution.
//!
//! A release channel is a plain-text file on the artifact server whose body is
//! the version currently recommended for that channel:
//!
//! ```text
//! GET {repo_base}/{file_prefix}{channel}   ->   200 "1.2.3\n"
//! ```

use std::time::Duration;
use tracing::debug;

use crate::core::{Result, UpgradeError};
use crate::upgrade::version::{self, Version};

/// Build the HTTP client shared by the resolver and the downloader.
///
/// Only connection setup is bounded here. The version request carries its own
/// total deadline (see [`VersionResolver::new`]) and downloads bound the gap
/// between chunks instead, so a slow but steady download is never cut off.
///
/// # Errors
///
/// Returns [`UpgradeError::HttpClient`] if the TLS backend cannot be initialized.
pub fn http_client(connect_timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .user_agent(concat!("selfup/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|source| UpgradeError::HttpClient {
            source,
        })
}

/// Identifies the endpoint that names a channel's available version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDescriptor {
    /// Base URL of the artifact repository
    pub repo_base: String,
    /// Prefix of the version file
    pub file_prefix: String,
    /// Channel name, appended directly to the prefix
    pub channel: String,
}

impl ChannelDescriptor {
    /// Describe a channel endpoint.
    pub fn new(
        repo_base: impl Into<String>,
        file_prefix: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            repo_base: repo_base.into(),
            file_prefix: file_prefix.into(),
            channel: channel.into(),
        }
    }

    /// The repository base with any trailing `/` removed.
    #[must_use]
    pub fn base(&self) -> &str {
        self.repo_base.trim_end_matches('/')
    }

    /// The version file URL: `{repo_base}/{file_prefix}{channel}`.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}/{}{}", self.base(), self.file_prefix, self.channel)
    }
}

/// Fetches the available version of a channel.
#[derive(Debug, Clone)]
pub struct VersionResolver {
    client: reqwest::Client,
    timeout: Duration,
}

impl VersionResolver {
    /// A resolver issuing requests through `client`, each allowed `timeout` from
    /// sending the request to reading the whole body.
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
        }
    }

    /// Fetch and parse the version currently published on `channel`.
    ///
    /// Makes exactly one request and never retries.
    ///
    /// # Errors
    ///
    /// - [`UpgradeError::NetworkError`] if the request or body read fails
    /// - [`UpgradeError::UnexpectedStatus`] if the server does not answer `200 OK`
    /// - [`UpgradeError::InvalidVersionFormat`] if the body is not a version
    pub async fn fetch_available_version(&self, channel: &ChannelDescriptor) -> Result<Version> {
        let url = channel.url();
        debug!("Fetching available version from {}", url);

        let network_error = |source| UpgradeError::NetworkError {
            url: url.clone(),
            source,
        };

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(UpgradeError::UnexpectedStatus {
                url,
                status,
            });
        }

        let body = response.text().await.map_err(network_error)?;
        let available = version::parse(&body)?;

        debug!("Channel '{}' is at {}", channel.channel, available);
        Ok(available)
    }
}
