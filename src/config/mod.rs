//! Configuration module for bucketview
//!
//! Manages the store location, paging and display settings. Configuration
//! is stored in the user's config directory as `bucketview/config.toml`.

use crate::browse::{NotificationConfig, SessionConfig};
use crate::db::DEFAULT_PAGE_SIZE;
use config::{Config, ConfigError, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

const fn default_visible_levels() -> usize {
    3
}

const fn default_notification_capacity() -> usize {
    32
}

const fn default_notification_visibility_secs() -> i64 {
    10
}

const fn default_notification_animation_secs() -> i64 {
    2
}

/// Application configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ViewerConfig {
    /// Store to open when `--db` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,

    /// Entries fetched per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Levels shown at once
    #[serde(default = "default_visible_levels")]
    pub visible_levels: usize,

    #[serde(default = "default_notification_capacity")]
    pub notification_capacity: usize,

    #[serde(default = "default_notification_visibility_secs")]
    pub notification_visibility_secs: i64,

    #[serde(default = "default_notification_animation_secs")]
    pub notification_animation_secs: i64,

    /// Suppress informational output by default
    #[serde(default)]
    pub quiet: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            database: None,
            page_size: default_page_size(),
            visible_levels: default_visible_levels(),
            notification_capacity: default_notification_capacity(),
            notification_visibility_secs: default_notification_visibility_secs(),
            notification_animation_secs: default_notification_animation_secs(),
            quiet: false,
        }
    }
}

impl ViewerConfig {
    /// Get the path to the config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the system config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            ConfigError::Message("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("bucketview").join("config.toml"))
    }

    /// Load configuration from file, creating default if it doesn't exist
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file cannot be read, parsed, or created.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let default_config = Self::default();
            default_config.save_to(&config_path)?;
            return Ok(default_config);
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit file
    ///
    /// Missing keys take their default values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .build()?;

        settings.try_deserialize()
    }

    /// Save configuration to the default location
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config directory cannot be created, the configuration
    /// cannot be serialized to TOML, or the file cannot be written.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the directory cannot be created, the configuration
    /// cannot be serialized to TOML, or the file cannot be written.
    pub fn save_to(&self, config_path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Message(format!("Failed to serialize config: {e}")))?;

        fs::write(config_path, toml_string)
            .map_err(|e| ConfigError::Message(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Store location: the configured one, else `bucketview/store` in the data directory
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if no store is configured and the system data
    /// directory cannot be determined.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.database {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir().ok_or_else(|| {
            ConfigError::Message("Could not determine data directory".to_string())
        })?;
        Ok(data_dir.join("bucketview").join("store"))
    }

    /// Session settings derived from this configuration
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            visible_levels: self.visible_levels.max(1),
            notifications: NotificationConfig {
                capacity: self.notification_capacity,
                visibility: chrono::Duration::seconds(self.notification_visibility_secs),
                animation: chrono::Duration::seconds(self.notification_animation_secs),
            },
        }
    }
}
