//! In-place replacement of the running executable.
//!
//! The replacement never leaves the executable slot empty unless both the copy of
//! the new binary and the rollback rename fail:
//!
//! ```text
//! ORIGINAL --rename exe -> exe~--> BACKED_UP --copy tmp -> exe--> UPGRADED
//!                                      |
//!                                      +--copy failed, rename exe~ -> exe--> ORIGINAL
//!                                      |
//!                                      +--copy failed, rename failed------> MISSING
//! ```
//!
//! The new binary is *copied* into place because the download directory may be on
//! a different device than the install directory.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::core::{Result, UpgradeError};
use crate::upgrade::backup::BackupManager;

/// Where things ended up after a successful replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceOutcome {
    /// The executable, now holding the new binary
    pub executable: PathBuf,
    /// The previous binary, kept for manual rollback
    pub backup: PathBuf,
}

/// Replaces an executable with a staged binary, rolling back on failure.
#[derive(Debug, Clone)]
pub struct Replacer {
    backup: BackupManager,
    #[cfg(test)]
    faults: Faults,
}

/// Steps of [`Replacer::install`] forced to fail in tests.
#[cfg(test)]
#[derive(Debug, Clone, Copy, Default)]
struct Faults {
    copy: bool,
    restore: bool,
    remove_staged: bool,
}

#[cfg(test)]
fn simulated(step: &str) -> io::Error {
    io::Error::other(format!("simulated {step} failure"))
}

impl Replacer {
    /// Replace the executable at `executable`.
    pub fn new(executable: PathBuf) -> Self {
        Self {
            backup: BackupManager::new(executable),
            #[cfg(test)]
            faults: Faults::default(),
        }
    }

    #[cfg(test)]
    fn with_faults(mut self, faults: Faults) -> Self {
        self.faults = faults;
        self
    }

    /// Replace the executable of the running process.
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::SelfLocateError`] when the platform cannot report it.
    pub fn for_current_exe() -> Result<Self> {
        let executable = std::env::current_exe().map_err(|source| UpgradeError::SelfLocateError {
            source,
        })?;
        Ok(Self::new(executable))
    }

    /// The executable being replaced.
    pub fn executable_path(&self) -> &Path {
        self.backup.original_path()
    }

    /// Where the executable is moved during replacement.
    pub fn backup_path(&self) -> &Path {
        self.backup.backup_path()
    }

    /// Discard any backup left over from an earlier attempt.
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::BackupCleanupError`] if the stale backup cannot be removed.
    pub async fn prepare(&self) -> Result<()> {
        self.backup.remove_stale_backup().await
    }

    /// Install `staged` in place of the executable.
    ///
    /// On success `staged` is deleted and the previous binary remains at
    /// [`backup_path`](Self::backup_path).
    ///
    /// # Errors
    ///
    /// - [`UpgradeError::RenameToBackupError`]: nothing changed; `staged` is kept
    /// - [`UpgradeError::TempCleanupError`]: the new binary **is** installed, only
    ///   `staged` could not be deleted
    /// - [`UpgradeError::UpgradeFailedRecovered`]: the copy failed and the original
    ///   was put back; `staged` is kept
    /// - [`UpgradeError::UpgradeFailedUnrecoverable`]: the copy and the rollback both
    ///   failed; the executable is missing and must be restored by hand
    pub async fn install(&self, staged: &Path) -> Result<ReplaceOutcome> {
        let executable = self.executable_path().to_path_buf();
        let backup = self.backup_path().to_path_buf();

        if let Err(source) = self.backup.move_to_backup().await {
            return Err(UpgradeError::RenameToBackupError {
                executable,
                backup,
                temp: staged.to_path_buf(),
                source,
            });
        }

        match self.copy_staged(staged, &executable).await {
            Ok(bytes) => {
                debug!("Copied {} bytes from {} to {}", bytes, staged.display(), executable.display());
            }
            Err(copy_error) => {
                warn!("Failed to copy {} to {}: {}", staged.display(), executable.display(), copy_error);

                return match self.restore().await {
                    Ok(()) => Err(UpgradeError::UpgradeFailedRecovered {
                        executable,
                        temp: staged.to_path_buf(),
                        source: copy_error,
                    }),
                    Err(restore_error) => {
                        error!(
                            "Unable to restore {} from {}: {}",
                            executable.display(),
                            backup.display(),
                            restore_error
                        );
                        Err(UpgradeError::UpgradeFailedUnrecoverable {
                            executable,
                            backup,
                            temp: staged.to_path_buf(),
                            copy_error,
                            source: restore_error,
                        })
                    }
                };
            }
        }

        if let Err(source) = self.remove_staged(staged).await {
            return Err(UpgradeError::TempCleanupError {
                temp: staged.to_path_buf(),
                executable,
                backup,
                source,
            });
        }

        info!("Installed new binary at {}", executable.display());
        Ok(ReplaceOutcome {
            executable,
            backup,
        })
    }

    async fn copy_staged(&self, staged: &Path, executable: &Path) -> io::Result<u64> {
        #[cfg(test)]
        if self.faults.copy {
            return Err(simulated("copy"));
        }
        fs::copy(staged, executable).await
    }

    async fn restore(&self) -> io::Result<()> {
        #[cfg(test)]
        if self.faults.restore {
            return Err(simulated("restore"));
        }
        self.backup.restore_backup().await
    }

    async fn remove_staged(&self, staged: &Path) -> io::Result<()> {
        #[cfg(test)]
        if self.faults.remove_staged {
            return Err(simulated("remove"));
        }
        fs::remove_file(staged).await
    }
}
