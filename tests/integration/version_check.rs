use anyhow::Result;
use selfup::test_utils::{ArtifactServer, FakeInstall};
use selfup::upgrade::VersionChecker;
use std::time::{Duration, SystemTime};

const TOOL: &str = "mytool";

fn checker(server: &ArtifactServer, install: &FakeInstall, interval_hours: f64) -> Result<VersionChecker> {
    let mut config = server.config();
    config.check_interval_hours = interval_hours;
    Ok(VersionChecker::new(TOOL, &install.home, &config)?)
}

fn backdate(path: &std::path::Path, age: Duration) -> Result<()> {
    let file = std::fs::OpenOptions::new().write(true).open(path)?;
    file.set_modified(SystemTime::now() - age)?;
    Ok(())
}

/// A fresh install checks nothing until the interval has elapsed, then checks once.
#[tokio::test]
async fn test_check_runs_once_per_interval() -> Result<()> {
    let server = ArtifactServer::start().await;
    server.serve_channel("stable", "1.1.0").await;
    let install = FakeInstall::new(TOOL, b"")?;
    let checker = checker(&server, &install, 24.0)?;

    assert!(!checker.check_and_notify("1.0.0", "mytool upgrade").await?);
    assert_eq!(server.requests_to("/version-stable").await, 0);

    let marker = install.home.join(".mytool-version-check");
    assert_eq!(checker.gate().marker_path(), marker);
    backdate(&marker, Duration::from_secs(25 * 3600))?;

    assert!(checker.check_and_notify("1.0.0", "mytool upgrade").await?);
    assert!(!checker.check_and_notify("1.0.0", "mytool upgrade").await?);
    assert_eq!(server.requests_to("/version-stable").await, 1);
    Ok(())
}

/// A failed check still counts against the interval.
#[tokio::test]
async fn test_failed_check_is_not_retried_immediately() -> Result<()> {
    let server = ArtifactServer::start().await;
    let install = FakeInstall::new(TOOL, b"")?;
    let checker = checker(&server, &install, 1.0)?;
    checker.clear_cache().await?;

    assert!(checker.check_and_notify("1.0.0", "mytool upgrade").await.is_err());
    assert!(!checker.check_and_notify("1.0.0", "mytool upgrade").await?);
    assert_eq!(server.requests_to("/version-stable").await, 1);
    Ok(())
}

#[tokio::test]
async fn test_prerelease_is_newer_than_previous_release() -> Result<()> {
    let server = ArtifactServer::start().await;
    server.serve_channel("stable", "2.0.0-rc.1").await;
    let install = FakeInstall::new(TOOL, b"")?;
    let checker = checker(&server, &install, 0.0)?;

    assert!(checker.check_and_notify("1.9.0", "mytool upgrade").await?);
    assert!(!checker.check_and_notify("2.0.0", "mytool upgrade").await?);
    Ok(())
}
