//! Pipeline configuration
//!
//! Aggregates the parameters of every pipeline stage and reads/writes them as
//! JSON or TOML, chosen by file extension. Every field has a default, so a
//! config file only needs to name what it changes.

use std::path::{Path, PathBuf};

use afrbkit_toolpath::{CollectConfig, HeadingConfig, ResampleConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{SettingsError, SettingsResult};

/// Directory name under the platform config directory
pub const CONFIG_DIR_NAME: &str = "afrbkit";

/// File name of the default config
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// On-disk format, selected by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(ConfigFormat::Json),
            Some("toml") => Ok(ConfigFormat::Toml),
            other => Err(SettingsError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Corner-adaptive resampling and batching
    pub resample: ResampleConfig,
    /// Sparse collection budget
    pub collect: CollectConfig,
    /// Heading analysis
    pub heading: HeadingConfig,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            ConfigFormat::Json => serde_json::from_str(&content)?,
            ConfigFormat::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match ConfigFormat::from_path(path)? {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        self.resample.validate()?;
        self.collect.validate()?;
        self.heading.validate()?;
        Ok(())
    }

    /// Platform config path, e.g. `~/.config/afrbkit/config.toml`
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Load an explicit config, or the default one if it exists
    ///
    /// An explicit path must load. A missing default file falls back to
    /// built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> SettingsResult<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }

        let default_path = Self::default_config_path();
        if default_path.is_file() {
            Self::load_from_file(&default_path)
        } else {
            debug!("No config at {}, using defaults", default_path.display());
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Config::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.resample.corner_density, 6);
        assert_eq!(config.collect.max_points, 5000);
        assert_eq!(config.heading.windows, vec![1, 3, 5, 9]);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a/config.json")).unwrap(),
            ConfigFormat::Json
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.toml")).unwrap(),
            ConfigFormat::Toml
        );
        assert!(matches!(
            ConfigFormat::from_path(Path::new("config.yaml")),
            Err(SettingsError::UnsupportedFormat(ext)) if ext == "yaml"
        ));
        assert!(ConfigFormat::from_path(Path::new("config")).is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[resample]\ncorner_density = 10\n").unwrap();
        assert_eq!(config.resample.corner_density, 10);
        assert_eq!(config.resample.straight_sample_dist, 0.5);
        assert_eq!(config.collect, CollectConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::new();
        config.resample.straight_sample_dist = -1.0;
        assert!(matches!(config.validate(), Err(SettingsError::Config(_))));

        let mut config = Config::new();
        config.heading.max_frames = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_path_shape() {
        let path = Config::default_config_path();
        assert!(path.ends_with("afrbkit/config.toml"));
    }
}
