use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::core::{Result, UpgradeError};

/// Manages the `~` backup of an executable during an upgrade.
///
/// The backup is made by *renaming* the executable, not copying it, so moving it
/// aside and putting it back are both single atomic filesystem operations. The
/// backup sits next to the executable and therefore on the same volume.
///
/// ```text
/// /usr/local/bin/mytool    ->   /usr/local/bin/mytool~
/// ```
///
/// After a successful upgrade the backup is left in place for manual rollback; the
/// next upgrade attempt discards it with [`remove_stale_backup`](Self::remove_stale_backup).
///
/// # Examples
///
/// ```rust,no_run
/// use selfup::upgrade::backup::BackupManager;
/// use std::path::PathBuf;
///
/// let manager = BackupManager::new(PathBuf::from("/usr/local/bin/mytool"));
/// assert_eq!(manager.backup_path(), std::path::Path::new("/usr/local/bin/mytool~"));
/// ```
#[derive(Debug, Clone)]
pub struct BackupManager {
    /// Path to the executable being upgraded.
    original_path: PathBuf,
    /// `original_path` with `~` appended.
    backup_path: PathBuf,
}

impl BackupManager {
    /// Manage backups of `executable_path`.
    pub fn new(executable_path: PathBuf) -> Self {
        let mut backup: OsString = executable_path.clone().into_os_string();
        backup.push("~");

        Self {
            original_path: executable_path,
            backup_path: PathBuf::from(backup),
        }
    }

    /// Discard a backup left behind by an earlier upgrade.
    ///
    /// Both files and directories are removed. A missing backup is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::BackupCleanupError`] if the backup exists and cannot
    /// be removed.
    pub async fn remove_stale_backup(&self) -> Result<()> {
        let removal = match fs::symlink_metadata(&self.backup_path).await {
            Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(&self.backup_path).await,
            Ok(_) => fs::remove_file(&self.backup_path).await,
            Err(e) => Err(e),
        };

        match removal {
            Ok(()) => {
                debug!("Removed stale backup at {}", self.backup_path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(UpgradeError::BackupCleanupError {
                backup: self.backup_path.clone(),
                source,
            }),
        }
    }

    /// Rename the executable to its backup path.
    pub async fn move_to_backup(&self) -> io::Result<()> {
        info!(
            "Moving {} to {}",
            self.original_path.display(),
            self.backup_path.display()
        );
        fs::rename(&self.original_path, &self.backup_path).await
    }

    /// Rename the backup back over the executable path.
    ///
    /// Replaces whatever is at the executable path, including a partially copied
    /// binary.
    pub async fn restore_backup(&self) -> io::Result<()> {
        warn!(
            "Restoring {} from {}",
            self.original_path.display(),
            self.backup_path.display()
        );
        fs::rename(&self.backup_path, &self.original_path).await
    }

    /// Path of the executable.
    pub fn original_path(&self) -> &Path {
        &self.original_path
    }

    /// Path of the backup.
    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_backup_path_appends_tilde() {
        let manager = BackupManager::new(PathBuf::from("/opt/bin/mytool"));
        assert_eq!(manager.backup_path(), Path::new("/opt/bin/mytool~"));

        let windows_style = BackupManager::new(PathBuf::from("mytool.exe"));
        assert_eq!(windows_style.backup_path(), Path::new("mytool.exe~"));
    }

    #[tokio::test]
    async fn test_move_and_restore() {
        let temp_dir = TempDir::new().unwrap();
        let exe = temp_dir.path().join("mytool");
        fs::write(&exe, b"original").await.unwrap();
        let manager = BackupManager::new(exe.clone());

        manager.move_to_backup().await.unwrap();
        assert!(!exe.exists());
        assert!(manager.backup_path().exists());

        fs::write(&exe, b"partial").await.unwrap();
        manager.restore_backup().await.unwrap();
        assert_eq!(fs::read(&exe).await.unwrap(), b"original");
        assert!(!manager.backup_path().exists());
    }

    #[tokio::test]
    async fn test_remove_stale_backup_file() {
        let temp_dir = TempDir::new().unwrap();
        let manager = BackupManager::new(temp_dir.path().join("mytool"));
        fs::write(manager.backup_path(), b"old").await.unwrap();

        manager.remove_stale_backup().await.unwrap();
        assert!(!manager.backup_path().exists());
    }

    #[tokio::test]
    async fn test_remove_stale_backup_directory() {
        let temp_dir = TempDir::new().unwrap();
        let manager = BackupManager::new(temp_dir.path().join("mytool"));
        fs::create_dir_all(manager.backup_path().join("nested")).await.unwrap();
        fs::write(manager.backup_path().join("nested/file"), b"x").await.unwrap();

        manager.remove_stale_backup().await.unwrap();
        assert!(!manager.backup_path().exists());
    }

    #[tokio::test]
    async fn test_remove_missing_backup_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let manager = BackupManager::new(temp_dir.path().join("mytool"));

        manager.remove_stale_backup().await.unwrap();
    }

    #[tokio::test]
    async fn test_move_missing_executable_fails() {
        let temp_dir = TempDir::new().unwrap();
        let manager = BackupManager::new(temp_dir.path().join("missing"));

        let error = manager.move_to_backup().await.unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::NotFound);
    }
}
