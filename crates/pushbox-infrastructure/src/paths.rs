//! Path resolution for pushbox configuration files.

use std::path::PathBuf;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "PUSHBOX_CONFIG";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// The platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Path management for pushbox.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/pushbox/           # Config directory (platform default)
/// └── config.toml              # Application configuration
/// ```
pub struct PushboxPaths;

impl PushboxPaths {
    /// Returns the pushbox configuration directory (e.g. `~/.config/pushbox/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("pushbox"))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to the main configuration file.
    ///
    /// `PUSHBOX_CONFIG` takes precedence over the platform default.
    pub fn config_file() -> Result<PathBuf, PathError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
            _ => Ok(Self::config_dir()?.join("config.toml")),
        }
    }
}
