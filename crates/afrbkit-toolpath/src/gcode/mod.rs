//! G-Code tokenizer and motion-state tracking
//!
//! This module provides:
//! - Comment stripping and line classification
//! - Axis word extraction
//! - Positioning / extrusion mode tracking
//! - Line sources for streaming files or strings

pub mod stream;
pub mod tokenizer;
pub mod tracker;

pub use stream::GcodeLines;
pub use tokenizer::{tokenize, AxisWords, LineKind, TokenizedLine};
pub use tracker::{
    planar_points, position_samples, MotionState, MotionTracker, TrackedMove, TrackedMoves,
};
