//! Configuration file support for Luna.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/luna/config.toml`.

use crate::{
    CycleSettings, Error, Result, WeekStart, DEFAULT_CYCLE_LENGTH, DEFAULT_PERIOD_LENGTH,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub user: UserConfig,

    #[serde(default)]
    pub cycle: CycleConfig,

    #[serde(default)]
    pub calendar: CalendarConfig,

    #[serde(default)]
    pub history: HistoryConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Which user the CLI acts for when none is given
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_user")]
    pub default_user: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            default_user: default_user(),
        }
    }
}

/// Lengths assumed for users who have not configured their own
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CycleConfig {
    #[serde(default = "default_cycle_length")]
    pub default_cycle_length: u32,

    #[serde(default = "default_period_length")]
    pub default_period_length: u32,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            default_cycle_length: default_cycle_length(),
            default_period_length: default_period_length(),
        }
    }
}

/// Month grid layout
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct CalendarConfig {
    #[serde(default)]
    pub week_start: WeekStart,
}

/// History display
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_recent_count")]
    pub recent_count: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            recent_count: default_recent_count(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("luna")
}

fn default_user() -> String {
    "default".into()
}

fn default_cycle_length() -> u32 {
    DEFAULT_CYCLE_LENGTH
}

fn default_period_length() -> u32 {
    DEFAULT_PERIOD_LENGTH
}

fn default_recent_count() -> usize {
    6
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("luna").join("config.toml")
    }

    /// Check that the configured default lengths form valid settings
    pub fn validate(&self) -> Result<()> {
        let mut defaults = CycleSettings::new(&self.user.default_user);
        defaults.average_cycle_length = self.cycle.default_cycle_length;
        defaults.average_period_length = self.cycle.default_period_length;
        defaults
            .validate()
            .map_err(|e| Error::Config(format!("[cycle] defaults: {}", e)))?;

        if self.history.recent_count == 0 {
            return Err(Error::Config("[history] recent_count must be positive".into()));
        }
        Ok(())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.user.default_user, "default");
        assert_eq!(config.cycle.default_cycle_length, 28);
        assert_eq!(config.cycle.default_period_length, 5);
        assert_eq!(config.calendar.week_start, WeekStart::Sunday);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.calendar.week_start = WeekStart::Monday;
        config.save_to(&path).unwrap();

        let parsed = Config::load_from(&path).unwrap();
        assert_eq!(parsed.calendar.week_start, WeekStart::Monday);
        assert_eq!(parsed.data.data_dir, config.data.data_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[cycle]
default_cycle_length = 32

[calendar]
week_start = "monday"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.cycle.default_cycle_length, 32);
        assert_eq!(config.cycle.default_period_length, 5); // default
        assert_eq!(config.calendar.week_start, WeekStart::Monday);
        assert_eq!(config.history.recent_count, 6);
    }

    #[test]
    fn test_invalid_default_lengths_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[cycle]\ndefault_period_length = 30\n").unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
