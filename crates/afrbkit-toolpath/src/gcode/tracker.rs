//! Motion-state tracking
//!
//! Threads positioning and extrusion modes through a tokenized line stream
//! and reconstructs the absolute tool position after every motion line.
//!
//! Known deviation from G-code semantics: G91 is recorded but X/Y/Z words
//! always overwrite the current position as absolute values. Relative XYZ
//! moves are not integrated.

use afrbkit_core::{PositionSample, ToolpathError};
use glam::DVec2;
use tracing::{debug, trace};

use super::tokenizer::{tokenize, LineKind, TokenizedLine};

/// Modal and positional state for one traversal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionState {
    /// G90 (true) / G91 (false)
    pub mode_absolute: bool,
    /// M82 (true) / M83 (false)
    pub e_absolute: bool,
    pub cur_x: f64,
    pub cur_y: f64,
    pub cur_z: f64,
    pub cur_e: f64,
    /// Sticky: only lines carrying E change it
    pub extruding: bool,
}

impl Default for MotionState {
    fn default() -> Self {
        Self {
            mode_absolute: true,
            e_absolute: true,
            cur_x: 0.0,
            cur_y: 0.0,
            cur_z: 0.0,
            cur_e: 0.0,
            extruding: false,
        }
    }
}

impl MotionState {
    pub fn sample(&self) -> PositionSample {
        PositionSample::new(self.cur_x, self.cur_y, self.cur_z, self.extruding)
    }
}

/// A sample together with whether its line moved in the XY plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedMove {
    pub sample: PositionSample,
    /// The triggering line named X or Y (Z-only moves are not planar)
    pub planar: bool,
}

/// Per-traversal motion tracker
///
/// Owns all mutable state of a parse. Feed it lines strictly in document
/// order; one tracker per file or stream.
#[derive(Debug, Clone, Default)]
pub struct MotionTracker {
    state: MotionState,
    samples_emitted: u64,
    arcs_skipped: u64,
}

impl MotionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &MotionState {
        &self.state
    }

    pub fn samples_emitted(&self) -> u64 {
        self.samples_emitted
    }

    /// Arc moves seen and left uninterpolated
    pub fn arcs_skipped(&self) -> u64 {
        self.arcs_skipped
    }

    /// Tokenize and feed one raw line
    pub fn feed_line(&mut self, line: &str) -> Option<TrackedMove> {
        let tokens = tokenize(line)?;
        self.feed(&tokens)
    }

    /// Feed one tokenized line, returning a move if it emits a sample
    pub fn feed(&mut self, line: &TokenizedLine) -> Option<TrackedMove> {
        let words = &line.words;
        match line.kind {
            LineKind::Absolute => self.state.mode_absolute = true,
            LineKind::Relative => self.state.mode_absolute = false,
            LineKind::ExtrudeAbsolute => self.state.e_absolute = true,
            LineKind::ExtrudeRelative => self.state.e_absolute = false,
            LineKind::SetPosition => {
                if let Some(e) = words.e {
                    self.state.cur_e = e;
                }
                if let Some(z) = words.z {
                    self.state.cur_z = z;
                }
            }
            LineKind::Arc => {
                self.arcs_skipped += 1;
                trace!("Arc move not interpolated: {:?}", words);
            }
            LineKind::Motion => return self.apply_motion(line),
            LineKind::Other => {}
        }
        None
    }

    fn apply_motion(&mut self, line: &TokenizedLine) -> Option<TrackedMove> {
        let words = &line.words;
        let state = &mut self.state;
        let prev_e = state.cur_e;

        if let Some(x) = words.x {
            state.cur_x = x;
        }
        if let Some(y) = words.y {
            state.cur_y = y;
        }
        if let Some(z) = words.z {
            state.cur_z = z;
        }

        if let Some(e) = words.e {
            if state.e_absolute {
                state.cur_e = e;
                state.extruding = state.cur_e > prev_e;
            } else {
                state.cur_e += e;
                state.extruding = e > 0.0;
            }
        }

        if !words.has_xyz() {
            return None;
        }

        let sample = state.sample();
        self.samples_emitted += 1;
        trace!(
            "X={} Y={} Z={} E={} extruding={} e_absolute={}",
            sample.x,
            sample.y,
            sample.z,
            state.cur_e,
            sample.extruding,
            state.e_absolute
        );
        Some(TrackedMove {
            sample,
            planar: words.has_xy(),
        })
    }
}

/// Lazy stream of tracked moves over a line source
pub struct TrackedMoves<I> {
    lines: I,
    tracker: MotionTracker,
    done: bool,
}

impl<I> TrackedMoves<I>
where
    I: Iterator<Item = Result<String, ToolpathError>>,
{
    pub fn new(lines: I) -> Self {
        Self {
            lines,
            tracker: MotionTracker::new(),
            done: false,
        }
    }

    pub fn tracker(&self) -> &MotionTracker {
        &self.tracker
    }
}

impl<I> Iterator for TrackedMoves<I>
where
    I: Iterator<Item = Result<String, ToolpathError>>,
{
    type Item = Result<TrackedMove, ToolpathError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.lines.next() {
                Some(Ok(line)) => {
                    if let Some(tracked) = self.tracker.feed_line(&line) {
                        return Some(Ok(tracked));
                    }
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    debug!(
                        "Motion tracking complete: {} samples, {} arcs skipped",
                        self.tracker.samples_emitted(),
                        self.tracker.arcs_skipped()
                    );
                    return None;
                }
            }
        }
    }
}

/// Every position sample, in document order
pub fn position_samples<I>(lines: I) -> impl Iterator<Item = Result<PositionSample, ToolpathError>>
where
    I: Iterator<Item = Result<String, ToolpathError>>,
{
    TrackedMoves::new(lines).map(|tracked| tracked.map(|m| m.sample))
}

/// XY points for lines that named X or Y, in document order
pub fn planar_points<I>(lines: I) -> impl Iterator<Item = Result<DVec2, ToolpathError>>
where
    I: Iterator<Item = Result<String, ToolpathError>>,
{
    TrackedMoves::new(lines).filter_map(|tracked| match tracked {
        Ok(m) if m.planar => Some(Ok(DVec2::from(m.sample.xy()))),
        Ok(_) => None,
        Err(e) => Some(Err(e)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcode::stream::GcodeLines;

    fn samples(text: &str) -> Vec<PositionSample> {
        position_samples(GcodeLines::from_text(text))
            .map(|s| s.unwrap())
            .collect()
    }

    #[test]
    fn test_initial_state() {
        let state = MotionState::default();
        assert!(state.mode_absolute);
        assert!(state.e_absolute);
        assert_eq!(state.sample(), PositionSample::new(0.0, 0.0, 0.0, false));
    }

    #[test]
    fn test_axis_stickiness() {
        let s = samples("G1 X5\nG1 Y3");
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].xy(), (5.0, 0.0));
        assert_eq!(s[1].xy(), (5.0, 3.0));
        assert_eq!(s[1].z, 0.0);
    }

    #[test]
    fn test_absolute_extrusion_flags() {
        let s = samples("G1 X1 E1\nG1 X2 E2");
        let flags: Vec<bool> = s.iter().map(|p| p.extruding).collect();
        assert_eq!(flags, vec![true, true]);
    }

    #[test]
    fn test_absolute_extrusion_retract_clears_flag() {
        let s = samples("G1 X1 E2\nG1 X2 E1.5\nG1 X3 E1.5");
        let flags: Vec<bool> = s.iter().map(|p| p.extruding).collect();
        assert_eq!(flags, vec![true, false, false]);
    }

    #[test]
    fn test_relative_extrusion_flags() {
        let s = samples("M83\nG1 X1 E1\nG1 X1 E-1");
        let flags: Vec<bool> = s.iter().map(|p| p.extruding).collect();
        assert_eq!(flags, vec![true, false]);
    }

    #[test]
    fn test_extruding_is_sticky_without_e() {
        let s = samples("G1 X1 E1\nG0 X5\nG1 X6 E0.5\nG1 X7");
        let flags: Vec<bool> = s.iter().map(|p| p.extruding).collect();
        assert_eq!(flags, vec![true, true, false, false]);
    }

    #[test]
    fn test_pure_e_line_never_emits() {
        assert!(samples("G1 E5").is_empty());

        let mut tracker = MotionTracker::new();
        assert!(tracker.feed_line("G1 E5").is_none());
        assert_eq!(tracker.state().cur_e, 5.0);
        assert!(tracker.state().extruding);
    }

    #[test]
    fn test_pure_e_line_still_sets_extruding_for_next_move() {
        let s = samples("G1 E5\nG1 X1");
        assert_eq!(s.len(), 1);
        assert!(s[0].extruding);
    }

    #[test]
    fn test_g92_snaps_e_and_z_without_sample() {
        let mut tracker = MotionTracker::new();
        tracker.feed_line("G1 X1 Z0.3 E10");
        assert!(tracker.feed_line("G92 E0 Z5").is_none());
        assert_eq!(tracker.state().cur_e, 0.0);
        assert_eq!(tracker.state().cur_z, 5.0);

        let next = tracker.feed_line("G1 X2 E0.5").unwrap();
        assert!(next.sample.extruding);
        assert_eq!(next.sample.z, 5.0);
    }

    #[test]
    fn test_g92_ignores_xy() {
        let mut tracker = MotionTracker::new();
        tracker.feed_line("G1 X4 Y4");
        tracker.feed_line("G92 X0 Y0");
        assert_eq!(tracker.state().cur_x, 4.0);
        assert_eq!(tracker.state().cur_y, 4.0);
    }

    // Documents the absolute-overwrite behaviour under G91; this is not
    // standard G-code semantics.
    #[test]
    fn test_relative_positioning_not_integrated() {
        let mut tracker = MotionTracker::new();
        tracker.feed_line("G1 X10 Y10");
        tracker.feed_line("G91");
        assert!(!tracker.state().mode_absolute);
        let m = tracker.feed_line("G1 X1 Y1").unwrap();
        assert_eq!(m.sample.xy(), (1.0, 1.0));
    }

    #[test]
    fn test_arcs_counted_not_sampled() {
        let mut tracker = MotionTracker::new();
        assert!(tracker.feed_line("G2 X1 Y1 I0.5 J0").is_none());
        assert_eq!(tracker.arcs_skipped(), 1);
        assert_eq!(tracker.state().cur_x, 0.0);
    }

    #[test]
    fn test_planar_flag_and_projection() {
        let mut tracker = MotionTracker::new();
        assert!(!tracker.feed_line("G0 Z1").unwrap().planar);
        assert!(tracker.feed_line("G1 Y2").unwrap().planar);

        let pts: Vec<DVec2> = planar_points(GcodeLines::from_text("G1 X1\nG1 Z2\nG1 Y3"))
            .map(|p| p.unwrap())
            .collect();
        assert_eq!(pts, vec![DVec2::new(1.0, 0.0), DVec2::new(1.0, 3.0)]);
    }

    #[test]
    fn test_end_to_end_three_points() {
        let s = samples("G1 X0 Y0\nG1 X1 Y0\nG1 X2 Y0");
        let xy: Vec<(f64, f64)> = s.iter().map(|p| p.xy()).collect();
        assert_eq!(xy, vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
    }

    #[test]
    fn test_indented_and_commented_lines() {
        let s = samples("    G1 X0 Y0 ; start\n  (move)\n    G1 X1 Y0\n");
        assert_eq!(s.len(), 2);
    }
}
