//! Corner-adaptive resampling
//!
//! Prepares an ordered XY point stream for spline fitting. Straight runs are
//! decimated to at most `straight_sample_dist` spacing; wherever the path turns
//! by at least `angle_threshold_deg` both legs around the corner are
//! oversampled with `corner_density` points each.

use std::collections::VecDeque;

use afrbkit_core::{ConfigError, ToolpathError};
use glam::DVec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Resampling and batching parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResampleConfig {
    /// Minimum turn, in degrees, treated as a corner
    pub angle_threshold_deg: f64,
    /// Points injected on each leg adjacent to a corner
    pub corner_density: usize,
    /// Maximum spacing (mm) between points on straight runs
    pub straight_sample_dist: f64,
    /// Target number of points per streamed batch
    pub batch_size: usize,
}

impl ResampleConfig {
    pub const DEFAULT_ANGLE_THRESHOLD_DEG: f64 = 30.0;
    pub const DEFAULT_CORNER_DENSITY: usize = 6;
    pub const DEFAULT_STRAIGHT_SAMPLE_DIST: f64 = 0.5;
    pub const DEFAULT_BATCH_SIZE: usize = 1000;

    /// Corner threshold in radians
    #[inline]
    pub fn angle_threshold(&self) -> f64 {
        self.angle_threshold_deg.to_radians()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.angle_threshold_deg.is_finite() || self.angle_threshold_deg < 0.0 {
            return Err(ConfigError::invalid(
                "angle_threshold_deg",
                "must be a finite angle >= 0",
            ));
        }
        if self.corner_density == 0 {
            return Err(ConfigError::invalid("corner_density", "must be >= 1"));
        }
        if !(self.straight_sample_dist.is_finite() && self.straight_sample_dist > 0.0) {
            return Err(ConfigError::invalid("straight_sample_dist", "must be > 0"));
        }
        if self.batch_size < super::batcher::MIN_BATCH_SIZE {
            return Err(ConfigError::invalid(
                "batch_size",
                format!("must be >= {}", super::batcher::MIN_BATCH_SIZE),
            ));
        }
        Ok(())
    }
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            angle_threshold_deg: Self::DEFAULT_ANGLE_THRESHOLD_DEG,
            corner_density: Self::DEFAULT_CORNER_DENSITY,
            straight_sample_dist: Self::DEFAULT_STRAIGHT_SAMPLE_DIST,
            batch_size: Self::DEFAULT_BATCH_SIZE,
        }
    }
}

/// Unsigned angle in radians between two direction vectors
///
/// A zero-length vector has no direction and yields 0.
pub fn turn_angle(a: DVec2, b: DVec2) -> f64 {
    let na = a.length();
    let nb = b.length();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    let c = (a.dot(b) / (na * nb)).clamp(-1.0, 1.0);
    c.acos()
}

/// `n` evenly spaced points from `a` (excluded) to `b` (included)
fn subdivide(a: DVec2, b: DVec2, n: usize) -> impl Iterator<Item = DVec2> {
    (1..=n).map(move |k| if k == n { b } else { a.lerp(b, k as f64 / n as f64) })
}

/// Push-based resampling state machine
///
/// Keeps a three-point window (`prev2`, `prev1`, current); the turn at
/// `prev1` decides between corner densification and distance decimation.
#[derive(Debug, Clone)]
pub struct CornerResampler {
    angle_threshold: f64,
    corner_density: usize,
    straight_sample_dist: f64,
    prev2: Option<DVec2>,
    prev1: Option<DVec2>,
    corners: u64,
}

impl CornerResampler {
    pub fn new(config: &ResampleConfig) -> Self {
        Self {
            angle_threshold: config.angle_threshold(),
            corner_density: config.corner_density,
            straight_sample_dist: config.straight_sample_dist,
            prev2: None,
            prev1: None,
            corners: 0,
        }
    }

    /// Number of corners detected so far
    pub fn corners(&self) -> u64 {
        self.corners
    }

    /// Consume one input point, appending any output points to `out`
    pub fn push<E: Extend<DVec2>>(&mut self, p: DVec2, out: &mut E) {
        match (self.prev2, self.prev1) {
            (_, None) => {
                self.prev1 = Some(p);
                out.extend(std::iter::once(p));
            }
            (None, Some(p1)) => {
                self.prev2 = Some(p1);
                self.prev1 = Some(p);
                self.decimate(p1, p, out);
            }
            (Some(p2), Some(p1)) => {
                if turn_angle(p1 - p2, p - p1) >= self.angle_threshold {
                    self.corners += 1;
                    out.extend(subdivide(p2, p1, self.corner_density));
                    out.extend(subdivide(p1, p, self.corner_density));
                } else {
                    self.decimate(p1, p, out);
                }
                self.prev2 = Some(p1);
                self.prev1 = Some(p);
            }
        }
    }

    fn decimate<E: Extend<DVec2>>(&self, a: DVec2, b: DVec2, out: &mut E) {
        let dist = a.distance(b);
        if !dist.is_finite() {
            warn!("Skipping segment with non-finite length ({} -> {})", a, b);
            return;
        }
        if dist <= 0.0 {
            return;
        }
        // Non-positive spacing only reaches here through an unvalidated config.
        let n = if self.straight_sample_dist > 0.0 {
            ((dist / self.straight_sample_dist).ceil() as usize).max(1)
        } else {
            1
        };
        out.extend(subdivide(a, b, n));
    }
}

/// Lazy resampling adapter over a fallible point stream
pub struct Resampled<I> {
    points: I,
    resampler: CornerResampler,
    pending: VecDeque<DVec2>,
    emitted: u64,
    done: bool,
}

impl<I> Resampled<I>
where
    I: Iterator<Item = Result<DVec2, ToolpathError>>,
{
    pub fn new(points: I, config: &ResampleConfig) -> Self {
        Self {
            points,
            resampler: CornerResampler::new(config),
            pending: VecDeque::new(),
            emitted: 0,
            done: false,
        }
    }
}

impl<I> Iterator for Resampled<I>
where
    I: Iterator<Item = Result<DVec2, ToolpathError>>,
{
    type Item = Result<DVec2, ToolpathError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(p) = self.pending.pop_front() {
                self.emitted += 1;
                return Some(Ok(p));
            }
            if self.done {
                return None;
            }
            match self.points.next() {
                Some(Ok(p)) => self.resampler.push(p, &mut self.pending),
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    debug!(
                        "Resampling complete: {} points out, {} corners",
                        self.emitted,
                        self.resampler.corners()
                    );
                }
            }
        }
    }
}

/// Resample an in-memory polyline
pub fn resample_points(points: &[DVec2], config: &ResampleConfig) -> Vec<DVec2> {
    let mut resampler = CornerResampler::new(config);
    let mut out = Vec::with_capacity(points.len());
    for &p in points {
        resampler.push(p, &mut out);
    }
    out
}
