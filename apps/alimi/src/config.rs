//! Configuration for alimi.

use reminder_core::StorageKeys;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name used for the platform config and data directories.
pub const APP_NAME: &str = "alimi";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Notification settings.
    #[serde(default)]
    pub notifications: NotificationConfig,
    /// Display settings.
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    /// Load configuration from default path.
    ///
    /// A missing file gives the defaults. A file that does not parse is an
    /// error, so the caller can report it once logging is up.
    pub fn load() -> anyhow::Result<Self> {
        let Some(content) = Self::config_path().and_then(|p| std::fs::read_to_string(p).ok()) else {
            return Ok(Self::default());
        };
        Ok(Self::parse(&content)?)
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save configuration to default path.
    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(path) = Self::config_path() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(self)?;
            std::fs::write(path, content)?;
        }
        Ok(())
    }

    /// Get configuration file path.
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", APP_NAME).map(|d| d.config_dir().join("config.toml"))
    }

    /// Directory holding the JSON documents and the log file.
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.storage.data_dir.clone().or_else(|| {
            directories::ProjectDirs::from("", "", APP_NAME).map(|d| d.data_dir().to_path_buf())
        })
    }

    /// Log file path.
    pub fn log_path(&self) -> Option<PathBuf> {
        self.data_dir().map(|d| d.join("alimi.log"))
    }

    /// Store keys for the configured variant.
    pub fn storage_keys(&self) -> StorageKeys {
        match self.storage.variant {
            Variant::Alimi => StorageKeys::alimi(),
            Variant::Medication => StorageKeys::medication(),
        }
    }
}

/// Which app's collections to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Alimi,
    Medication,
}

/// Storage settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Collection keys to use.
    #[serde(default)]
    pub variant: Variant,
    /// Override for the data directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Notification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Title override for reminders.
    #[serde(default)]
    pub title: Option<String>,
    /// Event loop tick, which is also how often due reminders are delivered.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Show reminders as desktop popups.
    #[serde(default = "default_true")]
    pub desktop: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: None,
            poll_interval_ms: default_poll_interval(),
            desktop: true,
        }
    }
}

fn default_poll_interval() -> u64 {
    250
}

fn default_true() -> bool {
    true
}

/// Display settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// List tasks not scheduled for the selected date in the today view.
    #[serde(default)]
    pub show_inactive: bool,
}
