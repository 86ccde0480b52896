//! Spline-oriented resampling
//!
//! - Corner-adaptive resampling of planar point streams
//! - Overlapping batch assembly

pub mod batcher;
pub mod resampler;

pub use batcher::{SplineBatches, StreamBatcher, MIN_BATCH_SIZE, SEAM_OVERLAP};
pub use resampler::{resample_points, turn_angle, CornerResampler, ResampleConfig, Resampled};
