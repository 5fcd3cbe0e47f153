//! Configuration service implementation.
//!
//! Loads [`InboxConfig`] from `config.toml` and caches it.

use crate::paths::PushboxPaths;
use pushbox_core::{InboxConfig, InboxError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Configuration service that loads and caches the inbox configuration.
///
/// A missing or empty file yields the default configuration; a file that exists
/// but does not parse is an error.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<InboxConfig>>>,
}

impl ConfigService {
    /// Creates a service reading from the default location (see [`PushboxPaths::config_file`]).
    pub fn new_default() -> Result<Self> {
        let path = PushboxPaths::config_file().map_err(|e| InboxError::config(e.to_string()))?;
        Ok(Self::with_path(path))
    }

    /// Creates a service reading from an explicit path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the configuration, loading from file if not cached.
    pub fn get_config(&self) -> Result<InboxConfig> {
        {
            let cached = self
                .config
                .read()
                .map_err(|_| InboxError::internal("config cache lock poisoned"))?;
            if let Some(config) = cached.as_ref() {
                return Ok(config.clone());
            }
        }

        let loaded = Self::load_from(&self.path)?;

        let mut cached = self
            .config
            .write()
            .map_err(|_| InboxError::internal("config cache lock poisoned"))?;
        *cached = Some(loaded.clone());
        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        if let Ok(mut cached) = self.config.write() {
            *cached = None;
        }
    }

    /// Writes `config` to the file, creating the directory if needed, and caches it.
    pub fn save(&self, config: &InboxConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.path, content)?;

        let mut cached = self
            .config
            .write()
            .map_err(|_| InboxError::internal("config cache lock poisoned"))?;
        *cached = Some(config.clone());
        tracing::info!("[Config] Saved configuration to {:?}", self.path);
        Ok(())
    }

    fn load_from(path: &Path) -> Result<InboxConfig> {
        if !path.exists() {
            tracing::debug!("[Config] No config file at {:?}, using defaults", path);
            return Ok(InboxConfig::default());
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(InboxConfig::default());
        }

        let config: InboxConfig = toml::from_str(&content)?;
        tracing::debug!("[Config] Loaded configuration from {:?}", path);
        Ok(config)
    }
}
