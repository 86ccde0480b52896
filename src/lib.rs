//! # AFRBKit
//!
//! Toolpath reconstruction for wire-arc / rod additive manufacturing:
//! streams G-code files and rebuilds the XY(Z) path a rotating 4th-axis
//! wheel has to follow.
//!
//! ## Architecture
//!
//! AFRBKit is organized as a workspace with multiple crates:
//!
//! 1. **afrbkit-core** - Position samples, bounds and error types
//! 2. **afrbkit-toolpath** - Tokenizer, motion tracking, resampling, batching,
//!    collection, heading analysis and export
//! 3. **afrbkit-settings** - Pipeline configuration (JSON / TOML)
//! 4. **afrbkit** - Command-line binary and logging bootstrap
//!
//! ## Pipeline
//!
//! text lines → tokenizer → motion tracker → raw samples, or
//! planar points → corner-adaptive resampler → spline batches → sparse path

pub use afrbkit_core::{Bounds, ConfigError, Error, PositionSample, Result, ToolpathError};
pub use afrbkit_settings::{Config, SettingsError};
pub use afrbkit_toolpath as toolpath;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Sets up structured logging with:
/// - `RUST_LOG` environment variable support (default `info`)
/// - Output on stderr, leaving stdout for data
/// - Human-readable lines, or JSON lines when `json` is set
pub fn init_logging(json: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}
