//! # AFRBKit Core
//!
//! Core types and error handling for AFRBKit.
//! Provides the toolpath data model shared by the parsing, settings and
//! command-line crates.

pub mod data;
pub mod error;

pub use data::{Bounds, PositionSample};
pub use error::{ConfigError, Error, Result, ToolpathError};
