use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::CliConfig;

pub struct CliContext {
    config: Arc<CliConfig>,
    config_path: PathBuf,
    overrides: Vec<String>,
}

impl CliContext {
    pub fn new(config: CliConfig, config_path: PathBuf, overrides: Vec<String>) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
            overrides,
        }
    }

    pub fn config(&self) -> &CliConfig {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Environment keys that replaced values from the config file.
    pub fn overrides(&self) -> &[String] {
        &self.overrides
    }
}
