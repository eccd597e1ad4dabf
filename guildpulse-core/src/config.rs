//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/guildpulse/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/guildpulse/` (~/.config/guildpulse/)
//! - Data: `$XDG_DATA_HOME/guildpulse/` (~/.local/share/guildpulse/)
//! - State/Logs: `$XDG_STATE_HOME/guildpulse/` (~/.local/state/guildpulse/)

use crate::analytics::CUSTOM_STATUS_ACTIVITY;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Analytics configuration
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Database location override
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Leaderboard sizes and activity filtering
#[derive(Debug, Deserialize)]
pub struct AnalyticsConfig {
    /// Activity name excluded from activity totals
    #[serde(default = "default_sentinel_activity")]
    pub sentinel_activity: String,

    /// Rows on the member leaderboard
    #[serde(default = "default_top_n")]
    pub leaderboard_size: usize,

    /// Rows in the top activities list
    #[serde(default = "default_top_n")]
    pub top_activities: usize,

    /// Rows in the top voice channels list
    #[serde(default = "default_top_n")]
    pub top_channels: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            sentinel_activity: default_sentinel_activity(),
            leaderboard_size: default_top_n(),
            top_activities: default_top_n(),
            top_channels: default_top_n(),
        }
    }
}

impl AnalyticsConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("analytics.leaderboard_size", self.leaderboard_size),
            ("analytics.top_activities", self.top_activities),
            ("analytics.top_channels", self.top_channels),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("{} must be at least 1", key)));
            }
        }
        Ok(())
    }
}

fn default_sentinel_activity() -> String {
    CUSTOM_STATUS_ACTIVITY.to_string()
}

fn default_top_n() -> usize {
    5
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

/// Database configuration
#[derive(Debug, Deserialize, Default)]
pub struct DatabaseConfig {
    /// Override path for the SQLite database
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.analytics.validate()?;
        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/guildpulse/config.toml` (~/.config/guildpulse/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("guildpulse").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/guildpulse/` (~/.local/share/guildpulse/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("guildpulse")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/guildpulse/` (~/.local/state/guildpulse/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("guildpulse")
    }

    /// Returns the default database file path
    ///
    /// `$XDG_DATA_HOME/guildpulse/data.db` (~/.local/share/guildpulse/data.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("data.db")
    }

    /// Returns the configured database path, falling back to the default
    pub fn resolved_database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(Self::database_path)
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/guildpulse/guildpulse.log`
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("guildpulse.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.analytics.sentinel_activity, "Custom Status");
        assert_eq!(config.analytics.leaderboard_size, 5);
        assert_eq!(config.logging.level, "info");
        assert!(config.database.path.is_none());
        assert!(config.analytics.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[analytics]
sentinel_activity = "Idle"
leaderboard_size = 10

[logging]
level = "debug"

[database]
path = "/tmp/guildpulse-test.db"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.analytics.sentinel_activity, "Idle");
        assert_eq!(config.analytics.leaderboard_size, 10);
        assert_eq!(config.analytics.top_channels, 5);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(
            config.resolved_database_path(),
            PathBuf::from("/tmp/guildpulse-test.db")
        );
    }

    #[test]
    fn test_zero_top_n_rejected() {
        let config = AnalyticsConfig {
            top_activities: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("analytics.top_activities"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[analytics]\ntop_channels = 3\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.analytics.top_channels, 3);

        std::fs::write(&path, "[analytics]\nleaderboard_size = 0\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_paths() {
        assert!(Config::config_path().ends_with("guildpulse/config.toml"));
        assert!(Config::database_path().ends_with("guildpulse/data.db"));
        assert!(Config::log_path().ends_with("guildpulse.log"));
    }
}
