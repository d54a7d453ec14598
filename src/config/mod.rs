//! Configuration module for the navigation engine
//!
//! Holds the tunables that shape zooming, cursor picking and channel
//! validation. The configuration is a small TOML file:
//!
//! ```toml
//! default_scale = 1.0
//! max_scale = 100.0
//! channel_count = 32
//! cursor_snap_tolerance_px = 5
//! viewport_width_px = 1024
//! ```
//!
//! # Config Location
//!
//! The default file lives in the platform configuration directory:
//! - **Linux**: `~/.config/logicnav/navigator.toml`
//! - **macOS**: `~/Library/Application Support/logicnav/navigator.toml`
//! - **Windows**: `%APPDATA%\logicnav\navigator.toml`
//!
//! Missing fields take their defaults, so a partial file is valid.

use crate::error::{NavError, Result, ResultExt};
use crate::types::MAX_CHANNELS;
use crate::zoom::{DEFAULT_MAX_SCALE, DEFAULT_SCALE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "logicnav";

/// Config filename
pub const CONFIG_FILE: &str = "navigator.toml";

/// Default viewport width used until the rendering layer reports one
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1024;

/// Default cursor pick radius in pixels
pub const DEFAULT_SNAP_TOLERANCE_PX: u32 = 5;

/// Get the path to the default config file
pub fn config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID).join(CONFIG_FILE))
}

/// Navigation engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    /// Pixels per sample of the original zoom level
    pub default_scale: f64,

    /// Maximum zoom in pixels per sample
    pub max_scale: f64,

    /// Number of channels annotations may target
    pub channel_count: usize,

    /// Pick radius for grabbing a cursor with the pointer
    pub cursor_snap_tolerance_px: u32,

    /// Viewport width used before the rendering layer reports its size
    pub viewport_width_px: u32,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            default_scale: DEFAULT_SCALE,
            max_scale: DEFAULT_MAX_SCALE,
            channel_count: MAX_CHANNELS,
            cursor_snap_tolerance_px: DEFAULT_SNAP_TOLERANCE_PX,
            viewport_width_px: DEFAULT_VIEWPORT_WIDTH,
        }
    }
}

impl NavigatorConfig {
    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(NavError::from)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config = Self::from_toml(&content)?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| NavError::Serialization(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config from the default location, falling back to defaults
    pub fn load_or_default() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save the config as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(NavError::from)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| NavError::Serialization(e.to_string()))
            .context("Failed to serialize config")?;

        std::fs::write(path, content)
            .map_err(NavError::from)
            .with_context(|| format!("Failed to write config file {:?}", path))
    }

    /// Check the value ranges
    pub fn validate(&self) -> Result<()> {
        if !(self.default_scale > 0.0) {
            return Err(NavError::Config(format!(
                "default_scale must be positive, got {}",
                self.default_scale
            )));
        }
        if !(self.max_scale >= self.default_scale) {
            return Err(NavError::Config(format!(
                "max_scale ({}) must not be below default_scale ({})",
                self.max_scale, self.default_scale
            )));
        }
        if self.channel_count == 0 || self.channel_count > MAX_CHANNELS {
            return Err(NavError::Config(format!(
                "channel_count must be between 1 and {}, got {}",
                MAX_CHANNELS, self.channel_count
            )));
        }
        if self.viewport_width_px == 0 {
            return Err(NavError::Config(
                "viewport_width_px must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(NavigatorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = NavigatorConfig::from_toml("max_scale = 64.0\nchannel_count = 8\n").unwrap();
        assert_eq!(config.max_scale, 64.0);
        assert_eq!(config.channel_count, 8);
        assert_eq!(config.default_scale, DEFAULT_SCALE);
        assert_eq!(config.viewport_width_px, DEFAULT_VIEWPORT_WIDTH);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(NavigatorConfig::from_toml("default_scale = 0.0").is_err());
        assert!(NavigatorConfig::from_toml("default_scale = 2.0\nmax_scale = 1.0").is_err());
        assert!(NavigatorConfig::from_toml("channel_count = 33").is_err());
        assert!(NavigatorConfig::from_toml("channel_count = 0").is_err());
        assert!(NavigatorConfig::from_toml("viewport_width_px = 0").is_err());
    }

    #[test]
    fn test_malformed_toml() {
        let err = NavigatorConfig::from_toml("max_scale = [").unwrap_err();
        assert!(matches!(err, NavError::Serialization(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let config = NavigatorConfig {
            max_scale: 42.0,
            cursor_snap_tolerance_px: 8,
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = NavigatorConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = NavigatorConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read config file"));
        match err {
            NavError::WithContext { source, .. } => match *source {
                NavError::Io(io) => assert_eq!(io.kind(), std::io::ErrorKind::NotFound),
                other => panic!("expected an IO error, got {:?}", other),
            },
            other => panic!("expected context, got {:?}", other),
        }
    }

    #[test]
    fn test_save_into_file_path_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = NavigatorConfig::default()
            .save(blocker.join(CONFIG_FILE))
            .unwrap_err();
        assert!(err.to_string().contains("Failed to create config directory"));
        assert!(matches!(
            err,
            NavError::WithContext { ref source, .. } if matches!(**source, NavError::Io(_))
        ));
    }
}
