//! Error handling for selfup
//!
//! Every failure in the upgrade workflow is a variant of [`UpgradeError`]. Variants
//! carry the paths and URLs involved so a caller can tell the user exactly what to
//! do by hand when an upgrade stops halfway.
//!
//! # Severity
//!
//! Only [`UpgradeError::UpgradeFailedUnrecoverable`] leaves the installation without
//! an executable at its original path. Every other variant leaves the system either
//! untouched or fully upgraded:
//!
//! - [`UpgradeError::TempCleanupError`] is reported after the new binary is in place
//! - [`UpgradeError::UpgradeFailedRecovered`] is reported after the original binary
//!   has been renamed back from its backup
//!
//! # Displaying errors
//!
//! [`user_friendly_error`] turns any [`anyhow::Error`] into an [`ErrorContext`] with
//! details and a remediation suggestion, which a CLI can print in color:
//!
//! ```rust,no_run
//! use selfup::core::user_friendly_error;
//!
//! fn report(error: anyhow::Error) {
//!     user_friendly_error(error).display();
//! }
//! ```

use colored::Colorize;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The error type for every selfup operation.
#[derive(Error, Debug)]
pub enum UpgradeError {
    /// A version string does not follow semantic versioning.
    #[error("Invalid version format: '{version}'")]
    InvalidVersionFormat {
        /// The offending input, as received
        version: String,
        /// The parser error
        #[source]
        source: semver::Error,
    },

    /// The HTTP transport failed (connection, timeout, or body read).
    #[error("Network error while requesting {url}")]
    NetworkError {
        /// The URL being requested
        url: String,
        /// The underlying transport error
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with something other than `200 OK`.
    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus {
        /// The URL being requested
        url: String,
        /// The status the server returned
        status: reqwest::StatusCode,
    },

    /// The server stopped sending the binary mid-download.
    #[error("Download from {url} stalled: no data for {idle:?}")]
    DownloadStalled {
        /// The URL being downloaded
        url: String,
        /// How long the body went without a chunk
        idle: std::time::Duration,
    },

    /// The version-check marker file could not be created, inspected, or reset.
    #[error("Cannot {operation} version check marker {}", path.display())]
    CacheIoError {
        /// What was being attempted ("open", "stat", "truncate", ...)
        operation: &'static str,
        /// The marker file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The downloaded binary could not be written to its temporary file.
    #[error("Failed to write downloaded binary to {}", path.display())]
    WriteError {
        /// The temporary file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The platform could not report the path of the running executable.
    #[error("Unable to locate the running executable")]
    SelfLocateError {
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A stale backup from an earlier attempt could not be removed.
    #[error("Unable to remove stale backup {}", backup.display())]
    BackupCleanupError {
        /// The backup path
        backup: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The executable could not be moved aside to its backup path.
    #[error("Unable to move {} to {}; the new binary is at {}", executable.display(), backup.display(), temp.display())]
    RenameToBackupError {
        /// The executable being replaced
        executable: PathBuf,
        /// Where the executable was supposed to go
        backup: PathBuf,
        /// The downloaded binary, left in place
        temp: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The upgrade succeeded but the downloaded temporary file was left behind.
    #[error("Upgrade applied but temporary file {} could not be removed", temp.display())]
    TempCleanupError {
        /// The leftover temporary file
        temp: PathBuf,
        /// The executable, already upgraded
        executable: PathBuf,
        /// The backup of the previous version
        backup: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Copying the new binary failed and the original was restored from backup.
    #[error("Upgrade of {} failed; the original was restored and the new binary is at {}", executable.display(), temp.display())]
    UpgradeFailedRecovered {
        /// The executable, back in its original state
        executable: PathBuf,
        /// The downloaded binary, left in place
        temp: PathBuf,
        /// The copy error
        #[source]
        source: io::Error,
    },

    /// Copying failed and the backup could not be renamed back either.
    ///
    /// The executable is missing from its original path.
    #[error("Upgrade of {} failed and the backup could not be restored (copy failed: {copy_error})", executable.display())]
    UpgradeFailedUnrecoverable {
        /// The now-missing executable path
        executable: PathBuf,
        /// The backup holding the previous version
        backup: PathBuf,
        /// The downloaded binary
        temp: PathBuf,
        /// Why the copy failed
        copy_error: io::Error,
        /// Why the recovery rename failed
        #[source]
        source: io::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client")]
    HttpClient {
        /// The builder error
        #[source]
        source: reqwest::Error,
    },
}

impl UpgradeError {
    /// `true` when the executable is missing and a person must restore it.
    pub fn requires_operator(&self) -> bool {
        matches!(self, Self::UpgradeFailedUnrecoverable { .. })
    }

    /// `true` when the new binary is in place despite the error.
    pub fn upgrade_applied(&self) -> bool {
        matches!(self, Self::TempCleanupError { .. })
    }

    /// Manual steps that resolve the error, naming the paths involved.
    pub fn remediation(&self) -> Option<String> {
        match self {
            Self::RenameToBackupError {
                executable,
                temp,
                ..
            }
            | Self::UpgradeFailedRecovered {
                executable,
                temp,
                ..
            } => Some(format!(
                "To upgrade manually, move {} to {}",
                temp.display(),
                executable.display()
            )),
            Self::UpgradeFailedUnrecoverable {
                executable,
                backup,
                temp,
                ..
            } => Some(format!(
                "Restore the previous version with `mv {} {}`, or install the new one with `mv {} {}`",
                backup.display(),
                executable.display(),
                temp.display(),
                executable.display()
            )),
            Self::TempCleanupError {
                temp,
                ..
            } => Some(format!("Remove {}", temp.display())),
            Self::BackupCleanupError {
                backup,
                ..
            } => Some(format!("Remove {} and run the upgrade again", backup.display())),
            Self::CacheIoError {
                path,
                ..
            } => Some(format!("Check that {} is writable", path.display())),
            Self::NetworkError {
                ..
            }
            | Self::UnexpectedStatus {
                ..
            }
            | Self::DownloadStalled {
                ..
            } => Some("Check your network connection and the artifact server".to_string()),
            _ => None,
        }
    }
}

/// An error prepared for display to an end user.
#[derive(Debug)]
pub struct ErrorContext {
    /// The headline message
    pub message: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details, usually the error's source chain
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Attach a suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach details.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.message);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

/// Convert any error into an [`ErrorContext`].
///
/// If an [`UpgradeError`] appears anywhere in the chain, its remediation becomes the
/// suggestion. The remaining chain is joined into the details.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let mut context = ErrorContext::new(error.to_string());

    let causes: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
    if !causes.is_empty() {
        context = context.with_details(causes.join(": "));
    }

    let upgrade_error =
        error.chain().find_map(|cause| cause.downcast_ref::<UpgradeError>());
    if let Some(suggestion) = upgrade_error.and_then(UpgradeError::remediation) {
        context = context.with_suggestion(suggestion);
    }

    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    fn io_err(kind: io::ErrorKind) -> io::Error {
        io::Error::new(kind, "boom")
    }

    #[test]
    fn test_only_unrecoverable_requires_operator() {
        let unrecoverable = UpgradeError::UpgradeFailedUnrecoverable {
            executable: PathBuf::from("/opt/bin/tool"),
            backup: PathBuf::from("/opt/bin/tool~"),
            temp: PathBuf::from("/tmp/tool_upgrade123"),
            copy_error: io_err(io::ErrorKind::StorageFull),
            source: io_err(io::ErrorKind::PermissionDenied),
        };
        assert!(unrecoverable.requires_operator());
        assert!(!unrecoverable.upgrade_applied());

        let recovered = UpgradeError::UpgradeFailedRecovered {
            executable: PathBuf::from("/opt/bin/tool"),
            temp: PathBuf::from("/tmp/tool_upgrade123"),
            source: io_err(io::ErrorKind::StorageFull),
        };
        assert!(!recovered.requires_operator());
    }

    #[test]
    fn test_unrecoverable_remediation_names_every_path() {
        let error = UpgradeError::UpgradeFailedUnrecoverable {
            executable: PathBuf::from("/opt/bin/tool"),
            backup: PathBuf::from("/opt/bin/tool~"),
            temp: PathBuf::from("/tmp/tool_upgrade123"),
            copy_error: io_err(io::ErrorKind::StorageFull),
            source: io_err(io::ErrorKind::PermissionDenied),
        };

        let remediation = error.remediation().unwrap();
        assert!(remediation.contains("mv /opt/bin/tool~ /opt/bin/tool"));
        assert!(remediation.contains("mv /tmp/tool_upgrade123 /opt/bin/tool"));
    }

    #[test]
    fn test_temp_cleanup_counts_as_applied() {
        let error = UpgradeError::TempCleanupError {
            temp: PathBuf::from("/tmp/tool_upgrade123"),
            executable: PathBuf::from("/opt/bin/tool"),
            backup: PathBuf::from("/opt/bin/tool~"),
            source: io_err(io::ErrorKind::PermissionDenied),
        };
        assert!(error.upgrade_applied());
        assert_eq!(error.remediation().as_deref(), Some("Remove /tmp/tool_upgrade123"));
    }

    #[test]
    fn test_user_friendly_error_finds_wrapped_upgrade_error() {
        let result: Result<(), UpgradeError> = Err(UpgradeError::RenameToBackupError {
            executable: PathBuf::from("/opt/bin/tool"),
            backup: PathBuf::from("/opt/bin/tool~"),
            temp: PathBuf::from("/tmp/tool_upgrade123"),
            source: io_err(io::ErrorKind::PermissionDenied),
        });

        let error = result.context("unable to upgrade tool").unwrap_err();
        let ctx = user_friendly_error(error);

        assert_eq!(ctx.message, "unable to upgrade tool");
        assert!(ctx.details.as_deref().unwrap().contains("Unable to move /opt/bin/tool"));
        assert_eq!(
            ctx.suggestion.as_deref(),
            Some("To upgrade manually, move /tmp/tool_upgrade123 to /opt/bin/tool")
        );
    }

    #[test]
    fn test_error_context_display() {
        let ctx = ErrorContext::new("something failed")
            .with_details("because")
            .with_suggestion("try again");
        assert_eq!(ctx.to_string(), "something failed\nDetails: because\nSuggestion: try again");
    }
}
