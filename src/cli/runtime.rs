use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::CliConfig;

pub fn init_logging(level: &str, debug: bool, json: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    let registry = tracing_subscriber::registry().with(filter);
    // stdout carries command output; logs go to stderr.
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

pub struct LoadedConfig {
    pub config: CliConfig,
    pub path: PathBuf,
    pub overrides: Vec<String>,
}

pub async fn load_config(config_path: Option<&PathBuf>) -> Result<LoadedConfig> {
    let config_path = match config_path {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };

    let mut config = if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .await
            .context("Failed to read config file")?;
        let config: CliConfig =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;
        info!("Loaded configuration from: {}", config_path.display());
        config
    } else {
        warn!(
            "Config file not found, using defaults: {}",
            config_path.display()
        );
        CliConfig::default()
    };

    let overrides = config
        .apply_env_overrides()
        .context("Failed to apply environment overrides")?;
    for key in &overrides {
        info!(%key, "configuration overridden from environment");
    }

    Ok(LoadedConfig {
        config,
        path: config_path,
        overrides,
    })
}

// Priority: ./config/steptrail.yaml > <config dir>/steptrail/config.yaml
fn default_config_path() -> Result<PathBuf> {
    let local_config = PathBuf::from("config/steptrail.yaml");
    if local_config.exists() {
        return Ok(local_config);
    }
    let mut path = dirs::config_dir().context("Failed to get config directory")?;
    path.push("steptrail");
    path.push("config.yaml");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn explicit_config_file_is_parsed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("steptrail.yaml");
        std::fs::write(&path, "replay:\n  max_retries: 7\n  delay_between_actions_ms: 250\n")
            .unwrap();

        let loaded = load_config(Some(&path)).await.unwrap();

        assert_eq!(loaded.path, path);
        assert_eq!(loaded.config.replay.max_retries, 7);
        assert_eq!(loaded.config.replay.delay_between_actions_ms, 250);
    }

    #[tokio::test]
    async fn missing_config_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.yaml");

        let loaded = load_config(Some(&path)).await.unwrap();

        assert_eq!(loaded.config.agent.max_failures, 3);
        assert_eq!(loaded.config.replay.max_retries, 3);
    }

    #[tokio::test]
    async fn malformed_config_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "agent: [not, a, mapping]\n").unwrap();

        let err = load_config(Some(&path)).await.err().unwrap();

        assert_eq!(err.to_string(), "Failed to parse config file");
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let err = init_logging("loud", false, false).unwrap_err();
        assert_eq!(err.to_string(), "Invalid log level");
    }
}
