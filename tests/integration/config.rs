use anyhow::Result;
use selfup::config::UpgradeConfig;
use selfup::test_utils::{ArtifactServer, FakeInstall};
use selfup::upgrade::{SelfUpdater, UpgradeStatus};
use selfup::utils::Platform;
use tempfile::TempDir;

const TOOL: &str = "mytool";

/// Settings loaded from TOML drive the channel and download location.
#[tokio::test]
async fn test_upgrade_from_loaded_config() -> Result<()> {
    let server = ArtifactServer::start().await;
    server.serve_channel("beta", "3.0.0-beta.2").await;
    server.serve_binary("3.0.0-beta.2", TOOL, &Platform::current(), b"beta build").await;
    let install = FakeInstall::new(TOOL, b"stable build")?;

    let config_dir = TempDir::new()?;
    let path = config_dir.path().join("upgrade.toml");
    let toml = format!(
        "repo_base = \"{}/\"\nchannel = \"beta\"\ntimeout_secs = 5\nshow_progress = false\ntemp_dir = '{}'\n",
        server.uri(),
        install.downloads.display()
    );
    tokio::fs::write(&path, toml).await?;

    let config = UpgradeConfig::load_from(&path).await?;
    assert_eq!(config.temp_dir.as_deref(), Some(install.downloads.as_path()));

    let status = SelfUpdater::new(TOOL, "2.5.0", &config)?
        .executable_path(install.executable.clone())
        .upgrade()
        .await?;

    assert!(matches!(status, UpgradeStatus::Upgraded { .. }));
    assert_eq!(install.read_executable()?, b"beta build");
    assert!(install.staged_files()?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_invalid_config_is_rejected_with_path() -> Result<()> {
    let config_dir = TempDir::new()?;
    let path = config_dir.path().join("upgrade.toml");
    tokio::fs::write(&path, "repo_base = \"https://example.com\"\ncheck_interval_hours = -1.0\n")
        .await?;

    let error = UpgradeConfig::load_from(&path).await.unwrap_err();
    let message = format!("{error:#}");
    assert!(message.contains(&path.display().to_string()), "{message}");
    assert!(message.contains("check_interval_hours"), "{message}");
    Ok(())
}
