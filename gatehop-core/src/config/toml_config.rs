//! TOML configuration file I/O
//!
//! Handles loading and saving gatehop configuration to/from TOML files
//! in the user's configuration directory.

use crate::config::{ConnectionSettings, DirectorySettings};
use crate::error::{ConfigError, GatehopError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete TOML configuration structure
///
/// Contains the settings for both halves of the tool. Both tables are
/// optional in the file; defaults match the reference constants.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Connection and verification settings
    #[serde(rename = "connection", default)]
    pub connection: ConnectionSettings,

    /// Relay directory fetch settings
    #[serde(rename = "directory", default)]
    pub directory: DirectorySettings,
}

impl TomlConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, GatehopError> {
        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => GatehopError::Config(ConfigError::LoadFailed {
                path: path.to_string_lossy().to_string(),
            }),
            _ => GatehopError::Config(ConfigError::IoError {
                message: format!("Failed to read config file: {}", e),
            }),
        })?;

        let config: TomlConfig = toml::from_str(&contents).map_err(|e| {
            GatehopError::Config(ConfigError::ValidationError {
                message: format!("Failed to parse config file: {}", e),
            })
        })?;

        config.connection.validate().map_err(|e| {
            GatehopError::Config(ConfigError::ValidationError { message: e })
        })?;
        config.directory.validate().map_err(|e| {
            GatehopError::Config(ConfigError::ValidationError { message: e })
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<(), GatehopError> {
        let contents = toml::to_string_pretty(self).map_err(|e| {
            GatehopError::Config(ConfigError::ValidationError {
                message: format!("Failed to serialize config: {}", e),
            })
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                GatehopError::Config(ConfigError::IoError {
                    message: format!("Failed to create config directory: {}", e),
                })
            })?;
        }

        std::fs::write(path, contents).map_err(|e| {
            GatehopError::Config(ConfigError::IoError {
                message: format!("Failed to write config file: {}", e),
            })
        })?;

        Ok(())
    }

    /// Load configuration from the default path, falling back to defaults
    /// when no file exists
    pub fn load_or_default() -> Result<Self, GatehopError> {
        let path = get_config_path()?;
        if path.is_file() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Default configuration file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Get the default configuration directory
///
/// Returns ~/.config/gatehop, or GATEHOP_CONFIG_DIR if set (used by tests).
pub fn get_config_dir() -> Result<PathBuf, GatehopError> {
    if let Ok(config_dir) = std::env::var("GATEHOP_CONFIG_DIR") {
        return Ok(PathBuf::from(config_dir));
    }

    let home = std::env::var("HOME").map_err(|_| {
        GatehopError::Config(ConfigError::IoError {
            message: "HOME environment variable not set".to_string(),
        })
    })?;

    Ok(PathBuf::from(home).join(".config").join("gatehop"))
}

/// Get the default configuration file path
pub fn get_config_path() -> Result<PathBuf, GatehopError> {
    let config_dir = get_config_dir()?;
    Ok(config_dir.join(CONFIG_FILE_NAME))
}
