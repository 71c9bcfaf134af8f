//! Engine configuration.
//!
//! Policy knobs for the badge engine, loaded from `config.toml` under the
//! platform data directory. Absent or corrupt files fall back to defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which instant anchors date-eligibility badge conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateEligibility {
    /// Anchor on the stats record's creation time (default)
    #[default]
    AccountCreation,
    /// Anchor on the first recorded activity
    FirstActivity,
}

/// Engine policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Experience granted for each completed route
    pub route_completion_xp: u32,
    /// Anchor policy for date-eligibility conditions
    pub date_eligibility: DateEligibility,
    /// Fixed UTC offset, in minutes, at which activity days roll over
    pub streak_utc_offset_minutes: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            route_completion_xp: 10,
            date_eligibility: DateEligibility::AccountCreation,
            streak_utc_offset_minutes: 0,
        }
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "wayquest", "WayQuest")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load engine configuration from file.
///
/// A missing file yields defaults; a corrupt file logs a warning and also
/// yields defaults, matching the fail-soft posture of the stats store.
pub fn load_config() -> Result<EngineConfig, ConfigError> {
    load_config_from(&get_config_path())
}

/// Load engine configuration from an explicit path.
pub fn load_config_from(path: &std::path::Path) -> Result<EngineConfig, ConfigError> {
    if !path.exists() {
        return Ok(EngineConfig::default());
    }

    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    match toml::from_str(&content) {
        Ok(config) => Ok(config),
        Err(e) => {
            tracing::warn!("Corrupt engine config, falling back to defaults: {}", e);
            Ok(EngineConfig::default())
        }
    }
}

/// Save engine configuration to file.
pub fn save_config(config: &EngineConfig) -> Result<(), ConfigError> {
    save_config_to(config, &get_config_path())
}

/// Save engine configuration to an explicit path.
pub fn save_config_to(config: &EngineConfig, path: &std::path::Path) -> Result<(), ConfigError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.route_completion_xp, 10);
        assert_eq!(config.date_eligibility, DateEligibility::AccountCreation);
        assert_eq!(config.streak_utc_offset_minutes, 0);
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = EngineConfig {
            route_completion_xp: 25,
            date_eligibility: DateEligibility::FirstActivity,
            streak_utc_offset_minutes: 480,
        };
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.route_completion_xp, 25);
        assert_eq!(loaded.date_eligibility, DateEligibility::FirstActivity);
        assert_eq!(loaded.streak_utc_offset_minutes, 480);
    }

    #[test]
    fn test_corrupt_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "route_completion_xp = \"not a number\"").unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.route_completion_xp, 10);
    }
}
