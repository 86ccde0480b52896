//! Toolpath analysis

pub mod heading;

pub use heading::{
    compute_headings, evaluate_windows, frame_deltas, heading_stats, HeadingConfig, HeadingStats,
    WindowReport,
};
