//! AFRBKit Settings Crate
//!
//! Loads, validates and saves the pipeline configuration.

pub mod config;
pub mod error;

pub use config::{Config, ConfigFormat, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
pub use error::{SettingsError, SettingsResult};
