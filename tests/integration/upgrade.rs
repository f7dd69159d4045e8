use anyhow::{Context, Result};
use selfup::core::{UpgradeError, user_friendly_error};
use selfup::test_utils::{ArtifactServer, FakeInstall, init_test_logging};
use selfup::upgrade::{SelfUpdater, UpgradeStatus, Version};
use selfup::utils::Platform;

const TOOL: &str = "mytool";

fn updater(server: &ArtifactServer, install: &FakeInstall, current: &str) -> Result<SelfUpdater> {
    Ok(SelfUpdater::new(TOOL, current, &install.configure(server.config()))?
        .platform(Platform::current())
        .executable_path(install.executable.clone()))
}

/// Upgrade, then upgrade again: the second run is a no-op that keeps the backup.
#[tokio::test]
async fn test_upgrade_then_noop() -> Result<()> {
    init_test_logging(None);
    let server = ArtifactServer::start().await;
    server.serve_channel("stable", "1.2.3").await;
    server.serve_binary("1.2.3", TOOL, &Platform::current(), b"#!/bin/sh\necho 1.2.3\n").await;
    let install = FakeInstall::new(TOOL, b"#!/bin/sh\necho 1.2.2\n")?;

    let first = updater(&server, &install, "1.2.2")?.upgrade().await?;
    assert!(matches!(
        first,
        UpgradeStatus::Upgraded { ref to, .. } if *to == Version::new(1, 2, 3)
    ));
    assert_eq!(install.read_executable()?, b"#!/bin/sh\necho 1.2.3\n");

    let second = updater(&server, &install, "1.2.3")?.upgrade().await?;
    assert_eq!(
        second,
        UpgradeStatus::UpToDate {
            current: Version::new(1, 2, 3)
        }
    );
    assert_eq!(std::fs::read(install.backup_path())?, b"#!/bin/sh\necho 1.2.2\n");

    let binary = ArtifactServer::binary_path("1.2.3", TOOL, &Platform::current());
    assert_eq!(server.requests_to(&binary).await, 1);
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn test_upgraded_executable_is_runnable() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let server = ArtifactServer::start().await;
    server.serve_channel("stable", "2.0.0").await;
    server.serve_binary("2.0.0", TOOL, &Platform::current(), b"#!/bin/sh\necho 2.0.0\n").await;
    let install = FakeInstall::new(TOOL, b"old")?;

    updater(&server, &install, "1.0.0")?.upgrade().await?;

    let mode = std::fs::metadata(&install.executable)?.permissions().mode();
    assert_eq!(mode & 0o111, 0o111, "mode was {mode:o}");
    Ok(())
}

#[tokio::test]
async fn test_missing_channel_reports_status_and_url() -> Result<()> {
    let server = ArtifactServer::start().await;
    let install = FakeInstall::new(TOOL, b"old")?;

    let error = updater(&server, &install, "1.0.0")?.upgrade().await.unwrap_err();

    match &error {
        UpgradeError::UnexpectedStatus {
            url,
            status,
        } => {
            assert_eq!(url, &format!("{}/version-stable", server.uri()));
            assert_eq!(status.as_u16(), 404);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!error.requires_operator());
    assert_eq!(install.read_executable()?, b"old");
    Ok(())
}

#[tokio::test]
async fn test_missing_executable_reports_manual_install() -> Result<()> {
    let server = ArtifactServer::start().await;
    server.serve_channel("stable", "1.2.3").await;
    server.serve_binary("1.2.3", TOOL, &Platform::current(), b"new").await;
    let install = FakeInstall::new(TOOL, b"old")?;
    std::fs::remove_file(&install.executable)?;

    let error = updater(&server, &install, "1.2.2")?.upgrade().await.unwrap_err();

    let UpgradeError::RenameToBackupError {
        temp,
        ..
    } = &error
    else {
        panic!("unexpected error: {error}");
    };
    // The download is kept so it can be installed by hand.
    assert_eq!(std::fs::read(temp)?, b"new");
    assert_eq!(install.staged_files()?, vec![temp.clone()]);

    let remediation = error.remediation().context("missing remediation")?;
    assert!(remediation.contains(&temp.display().to_string()));
    assert!(remediation.contains(&install.executable.display().to_string()));
    Ok(())
}

#[tokio::test]
async fn test_user_friendly_error_carries_remediation() -> Result<()> {
    let server = ArtifactServer::start().await;
    let install = FakeInstall::new(TOOL, b"old")?;

    let error = updater(&server, &install, "1.0.0")?.upgrade().await.unwrap_err();
    let context = user_friendly_error(anyhow::Error::new(error).context("upgrade failed"));

    assert_eq!(context.message, "upgrade failed");
    assert!(context.details.as_deref().unwrap_or_default().contains("Unexpected status 404"));
    assert!(context.suggestion.is_some());
    Ok(())
}
