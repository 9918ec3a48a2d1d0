pub mod loader;

use serde::Deserialize;
use std::{collections::HashMap, path::PathBuf, str::FromStr};
use thiserror::Error;
use tracing::Level;

use crate::container::DEFAULT_BASE_PATH;
use crate::logging::{LogFormat, LoggingConfig};

pub use loader::ConfigLoader;

// Environment overrides
pub const ENV_BASE_PATH: &str = "IOC_BASE_PATH";
pub const ENV_LOG_LEVEL: &str = "IOC_LOG_LEVEL";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid log level '{0}'")]
    LogLevel(String),

    #[error("invalid log format '{0}', expected 'pretty' or 'compact'")]
    LogFormat(String),
}

/// Root container configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerConfig {
    /// Base path for relative module identifiers (may start with `~`)
    pub base_path: String,
    pub logging: LoggingSection,
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSection {
    pub level: String,
    pub format: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_BASE_PATH.to_string(),
            logging: LoggingSection::default(),
        }
    }
}

/// Partial configuration as read from a file
#[derive(Deserialize, Debug, Default)]
pub struct PartialContainerConfig {
    base_path: Option<String>,
    logging: Option<PartialLoggingSection>,
}

#[derive(Deserialize, Debug, Default)]
struct PartialLoggingSection {
    level: Option<String>,
    format: Option<String>,
}

impl ContainerConfig {
    /// Parse a TOML document, filling unset fields with defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let partial: PartialContainerConfig = toml::from_str(content)?;
        Ok(Self::from_partial_and_env(partial, HashMap::new()))
    }

    /// Merge file values with environment overrides (environment wins)
    pub fn from_partial_and_env(partial: PartialContainerConfig, env_map: HashMap<String, String>) -> Self {
        let defaults = Self::default();
        let logging = partial.logging.unwrap_or_default();

        let base_path = env_map
            .get(ENV_BASE_PATH)
            .cloned()
            .or(partial.base_path)
            .unwrap_or(defaults.base_path);
        let level = env_map
            .get(ENV_LOG_LEVEL)
            .cloned()
            .or(logging.level)
            .unwrap_or(defaults.logging.level);
        let format = logging.format.unwrap_or(defaults.logging.format);

        Self {
            base_path,
            logging: LoggingSection { level, format },
        }
    }

    /// Base path with `~` expanded
    pub fn base_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.base_path).as_ref())
    }

    /// Logging settings for [`crate::logging::init_logging`]
    pub fn logging_config(&self) -> Result<LoggingConfig, ConfigError> {
        let level = Level::from_str(&self.logging.level)
            .map_err(|_| ConfigError::LogLevel(self.logging.level.clone()))?;
        let format = match self.logging.format.to_ascii_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "compact" => LogFormat::Compact,
            _ => return Err(ConfigError::LogFormat(self.logging.format.clone())),
        };

        Ok(LoggingConfig {
            level,
            format,
            ..LoggingConfig::default()
        })
    }
}
