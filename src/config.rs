//! Photo wall configuration
//!
//! Read from a JSON file in the user's config directory when present:
//! - Linux: ~/.config/photo-wall/config.json
//! - macOS: ~/Library/Application Support/photo-wall/config.json
//! - Windows: %APPDATA%\photo-wall\config.json
//!
//! Environment variables override the file, so a key never has to be
//! written to disk.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::fetch::pipeline::{DEFAULT_PROVIDER_URL, PLACEHOLDER_ACCESS_KEY};
use crate::fetch::ImageSize;

pub const ACCESS_KEY_ENV: &str = "UNSPLASH_ACCESS_KEY";
pub const QUERY_ENV: &str = "PHOTO_WALL_QUERY";
pub const SURFACES_ENV: &str = "PHOTO_WALL_SURFACES";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{name} must be a number, got {value:?}")]
    InvalidEnv { name: &'static str, value: String },
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PhotoWallConfig {
    /// Base URL of the photo provider API
    pub provider_url: String,
    /// Provider access key ("client id")
    pub access_key: String,
    /// Search term for random photos
    pub query: String,
    /// Number of tiles on the wall (= photos requested per cycle)
    pub surface_count: usize,
    /// Size variant to download
    pub image_size: ImageSize,
}

impl Default for PhotoWallConfig {
    fn default() -> Self {
        Self {
            provider_url: DEFAULT_PROVIDER_URL.to_string(),
            access_key: PLACEHOLDER_ACCESS_KEY.to_string(),
            query: "nature".to_string(),
            surface_count: 6,
            image_size: ImageSize::Regular,
        }
    }
}

impl PhotoWallConfig {
    /// Load from the default location, then apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::get_config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Get the path where the config file is looked up
    fn get_config_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir().or_else(dirs::home_dir)?;
        path.push("photo-wall");
        path.push("config.json");
        Some(path)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = serde_json::from_str(&contents).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        info!("📁 Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in `load`)
    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ACCESS_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.access_key = key;
        }

        if let Some(query) = lookup(QUERY_ENV).filter(|q| !q.trim().is_empty()) {
            self.query = query;
        }

        if let Some(value) = lookup(SURFACES_ENV) {
            self.surface_count = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: SURFACES_ENV,
                value,
            })?;
        }

        Ok(())
    }
}
