//! # AFRBKit Toolpath
//!
//! Streaming G-code motion reconstruction for AFRBKit.
//! Includes the tokenizer, motion-state tracker, corner-adaptive resampler,
//! spline batcher, point collector, heading analysis and file export.
//!
//! Every stage is a lazy iterator over `Result` items: a file is read one
//! line at a time and nothing is buffered beyond the current batch unless a
//! caller asks for the raw toolpath.

pub mod analysis;
pub mod collector;
pub mod export;
pub mod gcode;
pub mod sampling;
pub mod utils;

pub use analysis::{
    compute_headings, evaluate_windows, frame_deltas, heading_stats, HeadingConfig, HeadingStats,
    WindowReport,
};
pub use collector::{
    batch_points_for_spline, cap_points, linspace_indices, spline_batches, CollectConfig,
    PointCollector, RawToolpath, SparseToolpath,
};
pub use export::{
    convert_wheel_centers, default_csv_path, save_extrusion_csv, wheel_centers_to_gcode,
    write_extrusion_csv, DEFAULT_CENTERS_OUTPUT,
};
pub use gcode::{
    planar_points, position_samples, tokenize, AxisWords, GcodeLines, LineKind, MotionState,
    MotionTracker, TokenizedLine, TrackedMove, TrackedMoves,
};
pub use sampling::{
    resample_points, CornerResampler, ResampleConfig, Resampled, SplineBatches, StreamBatcher,
};
pub use utils::{FileValidation, GcodeFileReader};
