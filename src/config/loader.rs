use std::{collections::HashMap, env, fs, path::PathBuf};

use super::{ConfigError, ContainerConfig, PartialContainerConfig, ENV_BASE_PATH, ENV_LOG_LEVEL};

/// Configuration loader responsible for loading config from files and environment
pub struct ConfigLoader {
    path: PathBuf,
}

impl ConfigLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load configuration; a missing file yields the defaults
    pub fn load_config(&self) -> Result<ContainerConfig, ConfigError> {
        let partial = self.load_partial_config()?;
        let env_map = self.collect_env_vars();

        Ok(ContainerConfig::from_partial_and_env(partial, env_map))
    }

    fn load_partial_config(&self) -> Result<PartialContainerConfig, ConfigError> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "Config file not found, using defaults");
            return Ok(PartialContainerConfig::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    fn collect_env_vars(&self) -> HashMap<String, String> {
        [ENV_BASE_PATH, ENV_LOG_LEVEL]
            .iter()
            .filter_map(|name| env::var(name).ok().map(|value| (name.to_string(), value)))
            .collect()
    }
}
