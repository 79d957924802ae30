use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, warn};
use serde::Deserialize;

use crate::error::ConfigError;

/// Player configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Frames decoded and written per loop iteration
    pub block_frames: usize,
    /// Sleep between input polls while paused
    pub pause_poll_ms: u64,
    /// Minimum interval between status redraws while playing
    pub ui_refresh_ms: u64,
    pub bar_width: usize,
    pub preferred_device: Option<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            block_frames: 4096,
            pause_poll_ms: 50,
            ui_refresh_ms: 100,
            bar_width: 50,
            preferred_device: None,
        }
    }
}

impl PlayerConfig {
    pub fn pause_poll(&self) -> Duration {
        Duration::from_millis(self.pause_poll_ms)
    }

    pub fn ui_refresh(&self) -> Duration {
        Duration::from_millis(self.ui_refresh_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_frames == 0 {
            return Err(ConfigError::InvalidValue {
                field: "block_frames",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.block_frames > 1 << 20 {
            return Err(ConfigError::InvalidValue {
                field: "block_frames",
                reason: format!("{} is larger than 1048576", self.block_frames),
            });
        }
        if self.bar_width == 0 {
            return Err(ConfigError::InvalidValue {
                field: "bar_width",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Loads the configuration file
pub struct ConfigManager {
    config: PlayerConfig,
    /// `None` when no location could be resolved
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing file yields defaults. A file that cannot be read or parsed
    /// is reported and also yields defaults, as does having no home directory
    /// to look in. Only an invalid value is an error.
    pub fn new(path: Option<&Path>) -> Result<Self, ConfigError> {
        let location = match path {
            Some(path) => Ok(path.to_path_buf()),
            None => Self::default_config_path(),
        };
        Self::load_from(location)
    }

    fn load_from(location: Result<PathBuf, ConfigError>) -> Result<Self, ConfigError> {
        let config_path = match location {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("{}; using the default configuration", e);
                None
            }
        };

        let config = match &config_path {
            Some(path) => match Self::load_config(path) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Ignoring config file {}: {}", path.display(), e);
                    PlayerConfig::default()
                }
            },
            None => PlayerConfig::default(),
        };
        config.validate()?;

        debug!("Configuration: {:?}", config);
        Ok(Self { config, config_path })
    }

    pub fn get_config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Apply command line overrides and re-validate
    pub fn override_with<F>(&mut self, updater: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut PlayerConfig),
    {
        updater(&mut self.config);
        self.config.validate()
    }

    pub fn into_config(self) -> PlayerConfig {
        self.config
    }

    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::home_dir()
            .ok_or(ConfigError::ConfigDirNotFound)?
            .join(".config")
            .join("smp");
        Ok(config_dir.join("config.toml"))
    }

    fn load_config(path: &Path) -> Result<PlayerConfig, ConfigError> {
        if !path.exists() {
            return Ok(PlayerConfig::default());
        }

        let config_content = std::fs::read_to_string(path).map_err(ConfigError::IoError)?;

        let config: PlayerConfig =
            toml::from_str(&config_content).map_err(ConfigError::DeserializationError)?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_player_config_default() {
        let config = PlayerConfig::default();

        assert_eq!(config.block_frames, 4096);
        assert_eq!(config.pause_poll(), Duration::from_millis(50));
        assert_eq!(config.ui_refresh(), Duration::from_millis(100));
        assert_eq!(config.bar_width, 50);
        assert_eq!(config.preferred_device, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "block_frames = 1024\npreferred_device = \"USB DAC\"\n").unwrap();

        let manager = ConfigManager::new(Some(&config_path)).unwrap();
        let config = manager.get_config();
        assert_eq!(config.block_frames, 1024);
        assert_eq!(config.preferred_device.as_deref(), Some("USB DAC"));
        assert_eq!(config.pause_poll_ms, 50);
        assert_eq!(manager.config_path(), Some(config_path.as_path()));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let temp_dir = TempDir::new().unwrap();
        let nonexistent_path = temp_dir.path().join("nonexistent.toml");

        let manager = ConfigManager::new(Some(&nonexistent_path)).unwrap();
        assert_eq!(manager.get_config(), &PlayerConfig::default());
    }

    #[test]
    fn test_missing_home_directory_falls_back_to_defaults() {
        let manager = ConfigManager::load_from(Err(ConfigError::ConfigDirNotFound)).unwrap();
        assert_eq!(manager.get_config(), &PlayerConfig::default());
        assert_eq!(manager.config_path(), None);

        let mut manager = manager;
        manager.override_with(|config| config.block_frames = 512).unwrap();
        assert_eq!(manager.into_config().block_frames, 512);
    }

    #[test]
    fn test_load_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invalid.toml");
        fs::write(&config_path, "invalid toml content [[[").unwrap();

        match ConfigManager::load_config(&config_path) {
            Err(ConfigError::DeserializationError(_)) => {}
            other => panic!("Expected DeserializationError, got {:?}", other),
        }

        // The manager falls back to defaults instead
        let manager = ConfigManager::new(Some(&config_path)).unwrap();
        assert_eq!(manager.get_config(), &PlayerConfig::default());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "block_frames = 0\n").unwrap();

        match ConfigManager::new(Some(&config_path)) {
            Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, "block_frames"),
            other => panic!("Expected InvalidValue, got {:?}", other.map(|m| m.into_config())),
        }
    }

    #[test]
    fn test_overrides_are_validated() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = ConfigManager::new(Some(&temp_dir.path().join("none.toml"))).unwrap();

        manager.override_with(|config| config.block_frames = 512).unwrap();
        assert_eq!(manager.get_config().block_frames, 512);

        assert!(manager.override_with(|config| config.bar_width = 0).is_err());
    }

    #[test]
    fn test_default_path_location() {
        if let Ok(path) = ConfigManager::default_config_path() {
            assert!(path.ends_with(".config/smp/config.toml"));
        }
    }
}
