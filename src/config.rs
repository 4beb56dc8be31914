//! Application configuration management.
//!
//! This module handles the persistent configuration for wavedeck: seek step,
//! playback position poll rate, autoplay behavior, and initial volume.
//! Configuration is stored in the user's config directory (typically
//! ~/.config/wavedeck/config.toml) and every field has a default so a missing
//! or partial file still loads.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use crate::constants::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_SEEK_STEP_SECS};

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_seek_step_secs")]
    pub seek_step_secs: f32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_autoplay")]
    pub autoplay: bool,
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_seek_step_secs() -> f32 {
    DEFAULT_SEEK_STEP_SECS
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_autoplay() -> bool {
    true
}

fn default_volume() -> f32 {
    1.0
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            seek_step_secs: default_seek_step_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            autoplay: default_autoplay(),
            volume: default_volume(),
        }
    }

    pub fn config_dir() -> Result<PathBuf, Box<dyn Error>> {
        // Check for XDG_CONFIG_HOME first (useful for testing)
        let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config).join("wavedeck")
        } else {
            dirs::config_dir()
                .ok_or("Unable to find config directory")?
                .join("wavedeck")
        };
        Ok(config_dir)
    }

    pub fn config_path() -> Result<PathBuf, Box<dyn Error>> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn load() -> Result<Self, Box<dyn Error>> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            // Return default config instead of error
            return Ok(Default::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        let config_path = Self::config_path()?;
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(&config_path, toml_string)?;

        Ok(())
    }

    pub fn exists() -> Result<bool, Box<dyn Error>> {
        Ok(Self::config_path()?.exists())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        match key {
            "seek_step_secs" => {
                self.seek_step_secs = value
                    .parse::<f32>()
                    .map_err(|_| "Value must be a number of seconds")?;
            }
            "poll_interval_ms" => {
                self.poll_interval_ms = value
                    .parse::<u64>()
                    .map_err(|_| "Value must be a whole number of milliseconds")?;
            }
            "autoplay" => {
                self.autoplay = value
                    .parse::<bool>()
                    .map_err(|_| "Value must be 'true' or 'false'")?;
            }
            "volume" => {
                self.volume = value
                    .parse::<f32>()
                    .map_err(|_| "Value must be a number between 0.0 and 2.0")?;
            }
            _ => return Err(format!("Unknown configuration key: {key}").into()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Use a mutex to ensure tests that modify environment variables don't run concurrently
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_config_new() {
        let config = Config::new();
        assert_eq!(config.seek_step_secs, DEFAULT_SEEK_STEP_SECS);
        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert!(config.autoplay);
        assert_eq!(config.volume, 1.0);
    }

    #[test]
    fn test_config_default() {
        let config: Config = Default::default();
        assert_eq!(config.seek_step_secs, DEFAULT_SEEK_STEP_SECS);
        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }

    #[test]
    fn test_set_value() {
        let mut config = Config::new();

        config.set_value("seek_step_secs", "2.5").unwrap();
        assert_eq!(config.seek_step_secs, 2.5);

        config.set_value("poll_interval_ms", "250").unwrap();
        assert_eq!(config.poll_interval_ms, 250);

        config.set_value("autoplay", "false").unwrap();
        assert!(!config.autoplay);

        config.set_value("volume", "0.5").unwrap();
        assert_eq!(config.volume, 0.5);

        // Test invalid boolean
        let result = config.set_value("autoplay", "invalid");
        assert!(result.is_err());

        // Test unknown key
        let result = config.set_value("unknown_key", "value");
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str("volume = 0.8\n").unwrap();
        assert_eq!(config.volume, 0.8);
        assert_eq!(config.seek_step_secs, DEFAULT_SEEK_STEP_SECS);
        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert!(config.autoplay);
    }

    #[test]
    fn test_config_save_and_load() {
        let _guard = ENV_MUTEX.lock().unwrap();

        let temp_dir = TempDir::new().unwrap();
        let original_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
        }

        let mut config = Config::new();
        config.seek_step_secs = 10.0;
        config.save().unwrap();

        let config_path = Config::config_path().unwrap();
        assert!(config_path.exists());

        // The path should be under temp_dir/wavedeck/config.toml
        let expected_dir = temp_dir.path().join("wavedeck");
        assert!(config_path.starts_with(&expected_dir));

        let loaded = Config::load().unwrap();
        assert_eq!(loaded.seek_step_secs, 10.0);
        assert_eq!(loaded.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);

        // Clean up - restore original value if it existed
        unsafe {
            if let Some(original) = original_xdg {
                std::env::set_var("XDG_CONFIG_HOME", original);
            } else {
                std::env::remove_var("XDG_CONFIG_HOME");
            }
        }
    }

    #[test]
    fn test_config_exists() {
        let _guard = ENV_MUTEX.lock().unwrap();

        let temp_dir = TempDir::new().unwrap();
        let original_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
        }

        let expected_path = temp_dir.path().join("wavedeck").join("config.toml");
        assert!(!expected_path.exists());
        assert!(!Config::exists().unwrap());

        let config = Config::new();
        config.save().unwrap();

        assert!(expected_path.exists());
        assert!(Config::exists().unwrap());

        // Clean up - restore original value if it existed
        unsafe {
            if let Some(original) = original_xdg {
                std::env::set_var("XDG_CONFIG_HOME", original);
            } else {
                std::env::remove_var("XDG_CONFIG_HOME");
            }
        }
    }
}
