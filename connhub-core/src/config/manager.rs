//! Locates, loads and saves the settings file.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::settings::CoreSettings;
use crate::error::{ConfigError, ConfigResult};

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "CONNHUB_CONFIG_DIR";

/// Environment variable overriding `api_base_url`
pub const API_URL_ENV: &str = "CONNHUB_API_URL";

/// Environment variable overriding `api_token`
pub const API_TOKEN_ENV: &str = "CONNHUB_API_TOKEN";

/// Settings file name inside the configuration directory
pub const SETTINGS_FILE: &str = "config.toml";

/// Manages the configuration directory
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a manager for the default directory
    ///
    /// Uses `$CONNHUB_CONFIG_DIR` if set, otherwise `<config dir>/connhub`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoConfigDir` if no directory can be determined.
    pub fn new() -> ConfigResult<Self> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::with_config_dir(PathBuf::from(dir)));
        }
        let dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join("connhub");
        Ok(Self::with_config_dir(dir))
    }

    /// Creates a manager for an explicit directory
    #[must_use]
    pub const fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// The configuration directory
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Path of the settings file
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }

    /// Loads settings, falling back to defaults if the file is missing
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_settings(&self) -> ConfigResult<CoreSettings> {
        let path = self.settings_path();
        if !path.exists() {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            return Ok(CoreSettings::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), "Loaded settings");
        CoreSettings::from_toml(&content)
    }

    /// Loads settings and applies `CONNHUB_API_URL` / `CONNHUB_API_TOKEN`
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or the result is invalid.
    pub fn load_settings_with_env(&self) -> ConfigResult<CoreSettings> {
        let mut settings = self.load_settings()?;
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.is_empty() {
                settings.api_base_url = url;
            }
        }
        if let Ok(token) = std::env::var(API_TOKEN_ENV) {
            if !token.is_empty() {
                settings = settings.with_api_token(token);
            }
        }
        settings.validate()?;
        Ok(settings)
    }

    /// Writes settings, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or cannot be written.
    pub fn save_settings(&self, settings: &CoreSettings) -> ConfigResult<()> {
        settings.validate()?;
        std::fs::create_dir_all(&self.config_dir).map_err(|e| ConfigError::Read {
            path: self.config_dir.display().to_string(),
            reason: e.to_string(),
        })?;
        let content = settings.to_toml()?;
        let path = self.settings_path();
        std::fs::write(&path, content).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}
