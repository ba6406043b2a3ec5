use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::storage::StorageBackend;
use crate::utils::{self, Profile};
use crate::workspace::Tab;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend holding the collections
    pub storage: StorageBackend,
    /// Database file or slot directory. Unset means the profile's data dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_path: Option<String>,
    /// Filter directive for log output, e.g. "info" or "todo_pro=debug"
    pub log_level: String,
    /// Tab listed when no collection is named
    pub default_tab: String,
    pub config_version: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageBackend::default(),
            data_path: None,
            log_level: default_log_level(),
            default_tab: Tab::default().key().to_string(),
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
    #[error("Invalid value for `{field}`: {value}")]
    InvalidValue { field: &'static str, value: String },
}

impl Config {
    /// Load configuration for `profile`, writing the defaults if the file is
    /// missing
    pub fn load_with_profile(profile: Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from an explicit file, creating it with defaults
    /// if it does not exist yet
    pub fn load_from_path(config_path: &Path) -> Result<Self, ConfigError> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path)
                .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            let config: Config = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            let mut config = Config::default();
            config.save_to(config_path)?;
            tracing::info!(path = %config_path.display(), "wrote default config");
            Ok(config)
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.default_tab()?;
        Ok(())
    }

    /// Save configuration to `config_path`
    pub fn save_to(&mut self, config_path: &Path) -> Result<(), ConfigError> {
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(config_path, toml_string).map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile).ok_or_else(|| {
            ConfigError::ConfigDirError("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("config.toml"))
    }

    /// Where the configured backend keeps its data, with `~` expanded.
    ///
    /// Defaults to `todo-pro.db` (sqlite) or `collections/` (files) under
    /// the profile's data directory.
    pub fn get_data_path(&self, profile: Profile) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.data_path {
            return Ok(utils::expand_path(path));
        }
        let data_dir = utils::get_data_dir(profile).ok_or_else(|| {
            ConfigError::ConfigDirError("Could not determine data directory".to_string())
        })?;
        Ok(match self.storage {
            StorageBackend::Sqlite => data_dir.join("todo-pro.db"),
            StorageBackend::Files | StorageBackend::Memory => data_dir.join("collections"),
        })
    }

    pub fn default_tab(&self) -> Result<Tab, ConfigError> {
        self.default_tab
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                field: "default_tab",
                value: self.default_tab.clone(),
            })
    }
}
