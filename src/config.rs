//! Configuration management for CallPilot
//!
//! Provides settings storage with schema versioning and migrations.
//! Configuration is stored in `~/.callpilot/config.json`. It is read once when
//! the host builds the service; the service never writes runtime state back.

use crate::actuator::RaiseStrategy;
use crate::audio::StreamChannel;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Current config schema version
const CURRENT_VERSION: u32 = 1;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown config version: {0}")]
    UnknownVersion(u32),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Schema version for migrations; files without one are treated as version 0
    #[serde(default)]
    pub version: u32,
    /// In-call UI identifiers
    pub call_ui: CallUiConfig,
    /// Volume normalization settings
    pub volume: VolumeConfig,
    /// Diagnostic logging settings
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            call_ui: CallUiConfig::default(),
            volume: VolumeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Identifiers of the telephony in-call UI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CallUiConfig {
    /// Package name whose accessibility events trigger hands-free activation
    pub package_name: String,
    /// Fully qualified view id of the speaker/hands-free toggle
    pub hands_free_view_id: String,
}

impl Default for CallUiConfig {
    fn default() -> Self {
        Self {
            package_name: "com.android.incallui".to_string(),
            hands_free_view_id: "com.android.incallui:id/audioButton".to_string(),
        }
    }
}

/// Volume normalization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    /// Channels to raise, in processing order
    pub channels: Vec<StreamChannel>,
    /// How a channel below its maximum is raised
    pub strategy: RaiseStrategy,
    /// Re-run normalization whenever a hardware volume key is pressed
    pub normalize_on_volume_keys: bool,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            channels: StreamChannel::ALL.to_vec(),
            strategy: RaiseStrategy::default(),
            normalize_on_volume_keys: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive (overridden by `RUST_LOG`)
    pub level: String,
    /// Also append logs to `~/.callpilot/logs/callpilot.log`
    pub log_to_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: true,
        }
    }
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&get_config_path())
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&get_config_path())
    }

    /// Load configuration from `path`
    ///
    /// A missing file yields the defaults. Older schema versions are migrated
    /// and written back once the migrated values validate.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;

        let original_version = config.version;
        let config = migrate_config(config)?;
        config.validate()?;

        if config.version != original_version {
            tracing::info!(
                "Migrated config from version {} to {}",
                original_version,
                config.version
            );
            config.save_to(path)?;
        }

        tracing::info!("Config loaded from {:?}", path);
        Ok(config)
    }

    /// Save configuration to `path`, creating parent directories as needed
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;

        tracing::info!("Config saved to {:?}", path);
        Ok(())
    }

    /// Check the values the service depends on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.call_ui.package_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "call_ui.package_name must not be empty".to_string(),
            ));
        }
        if self.call_ui.hands_free_view_id.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "call_ui.hands_free_view_id must not be empty".to_string(),
            ));
        }
        if self.volume.channels.is_empty() {
            return Err(ConfigError::Invalid(
                "volume.channels must list at least one channel".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for channel in &self.volume.channels {
            if !seen.insert(channel) {
                return Err(ConfigError::Invalid(format!(
                    "volume.channels lists {} more than once",
                    channel
                )));
            }
        }

        Ok(())
    }
}

/// Get the path to the config file (~/.callpilot/config.json)
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.json")
}

/// Get the path to the log directory (~/.callpilot/logs)
pub fn get_log_dir() -> PathBuf {
    get_config_dir().join("logs")
}

/// Get the path to the config directory (~/.callpilot)
fn get_config_dir() -> PathBuf {
    home_dir_or_fallback().join(".callpilot")
}

/// Get the home directory, falling back to /tmp if unavailable
fn home_dir_or_fallback() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        tracing::error!("Could not determine home directory, using /tmp");
        PathBuf::from("/tmp")
    })
}

/// Migrate configuration from older schema versions
fn migrate_config(mut config: Config) -> Result<Config, ConfigError> {
    while config.version < CURRENT_VERSION {
        config = apply_migration(config)?;
    }

    if config.version > CURRENT_VERSION {
        return Err(ConfigError::UnknownVersion(config.version));
    }

    Ok(config)
}

/// Apply a single migration step
fn apply_migration(config: Config) -> Result<Config, ConfigError> {
    match config.version {
        // Version 0 -> 1: unversioned files written before the schema existed
        0 => {
            let mut migrated = config;
            migrated.version = 1;
            Ok(migrated)
        }
        v => Err(ConfigError::UnknownVersion(v)),
    }
}
