//! Point collection
//!
//! Two ways of turning a G-code source into plain coordinate arrays:
//!
//! - **raw**: every position sample with Z and extrusion, in file order
//! - **sparse**: the resampled planar path, thinned to a point budget
//!
//! Sparse mode keeps only X and Y. Callers that need Z or extrusion along a
//! reduced path should use raw mode and select indices themselves
//! (see [`linspace_indices`]).

use std::io::BufRead;
use std::path::Path;

use afrbkit_core::{Bounds, ConfigError, PositionSample, ToolpathError};
use glam::DVec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::gcode::{planar_points, position_samples, GcodeLines};
use crate::sampling::{ResampleConfig, Resampled, SplineBatches};
use crate::utils::GcodeFileReader;

/// Point-budget parameters for sparse collection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectConfig {
    pub max_points: usize,
}

impl CollectConfig {
    pub const DEFAULT_MAX_POINTS: usize = 5000;

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_points == 0 {
            return Err(ConfigError::invalid("max_points", "must be >= 1"));
        }
        Ok(())
    }
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            max_points: Self::DEFAULT_MAX_POINTS,
        }
    }
}

/// Column-oriented raw toolpath
///
/// All four columns always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawToolpath {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    /// 1 while extruding, 0 otherwise
    pub extruding: Vec<u8>,
}

impl RawToolpath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: &PositionSample) {
        self.x.push(sample.x);
        self.y.push(sample.y);
        self.z.push(sample.z);
        self.extruding.push(sample.extruding_flag());
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Sample at `index`, if in range
    pub fn get(&self, index: usize) -> Option<PositionSample> {
        Some(PositionSample::new(
            *self.x.get(index)?,
            *self.y.get(index)?,
            *self.z.get(index)?,
            *self.extruding.get(index)? != 0,
        ))
    }

    /// Iterate the rows back as samples
    pub fn samples(&self) -> impl Iterator<Item = PositionSample> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }

    /// Number of samples flagged as extruding
    pub fn extruding_count(&self) -> usize {
        self.extruding.iter().filter(|&&e| e != 0).count()
    }

    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::new();
        for s in self.samples() {
            bounds.update(s.x, s.y, s.z);
        }
        bounds
    }
}

impl FromIterator<PositionSample> for RawToolpath {
    fn from_iter<T: IntoIterator<Item = PositionSample>>(iter: T) -> Self {
        let mut raw = RawToolpath::new();
        for sample in iter {
            raw.push(&sample);
        }
        raw
    }
}

/// Column-oriented planar path produced by sparse collection
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SparseToolpath {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl SparseToolpath {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = DVec2> + '_ {
        self.x.iter().zip(&self.y).map(|(&x, &y)| DVec2::new(x, y))
    }
}

impl From<Vec<DVec2>> for SparseToolpath {
    fn from(points: Vec<DVec2>) -> Self {
        let (x, y) = points.iter().map(|p| (p.x, p.y)).unzip();
        Self { x, y }
    }
}

/// `count` evenly spaced indices over `0..len`, first and last included
///
/// Fractional positions are truncated toward zero. Returns an empty vector
/// when either argument is zero.
pub fn linspace_indices(len: usize, count: usize) -> Vec<usize> {
    if len == 0 || count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![0];
    }
    let last = len - 1;
    let step = last as f64 / (count - 1) as f64;
    (0..count)
        .map(|k| if k == count - 1 { last } else { (k as f64 * step) as usize })
        .collect()
}

/// Thin `points` down to at most `max_points`
///
/// Evenly spaced selection; shorter inputs are returned unchanged.
pub fn cap_points<T: Copy>(points: &[T], max_points: usize) -> Vec<T> {
    if points.len() <= max_points {
        return points.to_vec();
    }
    linspace_indices(points.len(), max_points)
        .into_iter()
        .map(|i| points[i])
        .collect()
}

/// Compose the planar spline pipeline over a line source
///
/// planar projection → corner-adaptive resampling → overlapping batches
pub fn spline_batches<I>(
    lines: I,
    config: &ResampleConfig,
) -> SplineBatches<Resampled<impl Iterator<Item = Result<DVec2, ToolpathError>>>>
where
    I: Iterator<Item = Result<String, ToolpathError>>,
{
    SplineBatches::new(Resampled::new(planar_points(lines), config), config.batch_size)
}

/// Open `path` and stream spline batches from it
pub fn batch_points_for_spline(
    path: impl AsRef<Path>,
    config: &ResampleConfig,
) -> Result<impl Iterator<Item = Result<Vec<DVec2>, ToolpathError>>, ToolpathError> {
    let lines = GcodeFileReader::new(path)?.lines()?;
    Ok(spline_batches(lines, config))
}

/// Facade over the raw and sparse extraction modes
#[derive(Debug, Clone, Default)]
pub struct PointCollector {
    resample: ResampleConfig,
    collect: CollectConfig,
}

impl PointCollector {
    pub fn new(resample: ResampleConfig, collect: CollectConfig) -> Self {
        Self { resample, collect }
    }

    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.collect.max_points = max_points;
        self
    }

    pub fn resample_config(&self) -> &ResampleConfig {
        &self.resample
    }

    pub fn max_points(&self) -> usize {
        self.collect.max_points
    }

    /// Every sample in `path`, in file order
    pub fn collect_raw(&self, path: impl AsRef<Path>) -> Result<RawToolpath, ToolpathError> {
        let lines = GcodeFileReader::new(path)?.lines()?;
        Self::raw_from_lines(lines)
    }

    /// Every sample read from `reader`, in order
    pub fn collect_raw_from_reader<R: BufRead>(
        &self,
        reader: R,
    ) -> Result<RawToolpath, ToolpathError> {
        Self::raw_from_lines(GcodeLines::new(reader))
    }

    /// Resampled planar path of `path`, capped at the configured budget
    pub fn collect_sparse(&self, path: impl AsRef<Path>) -> Result<SparseToolpath, ToolpathError> {
        let lines = GcodeFileReader::new(path)?.lines()?;
        self.sparse_from_lines(lines)
    }

    /// Resampled planar path read from `reader`, capped at the configured budget
    pub fn collect_sparse_from_reader<R: BufRead>(
        &self,
        reader: R,
    ) -> Result<SparseToolpath, ToolpathError> {
        self.sparse_from_lines(GcodeLines::new(reader))
    }

    fn raw_from_lines<I>(lines: I) -> Result<RawToolpath, ToolpathError>
    where
        I: Iterator<Item = Result<String, ToolpathError>>,
    {
        let mut raw = RawToolpath::new();
        for sample in position_samples(lines) {
            raw.push(&sample?);
        }
        debug!("Collected {} raw samples", raw.len());
        Ok(raw)
    }

    fn sparse_from_lines<I>(&self, lines: I) -> Result<SparseToolpath, ToolpathError>
    where
        I: Iterator<Item = Result<String, ToolpathError>>,
    {
        let max_points = self.collect.max_points;
        let mut kept: Vec<DVec2> = Vec::new();
        let mut total = 0usize;

        for batch in spline_batches(lines, &self.resample) {
            let batch = batch?;
            total += batch.len();
            kept.extend(batch);
            if kept.len() > max_points.saturating_mul(2) {
                kept = kept.into_iter().step_by(2).collect();
            }
        }

        let kept = cap_points(&kept, max_points);
        debug!(
            "Collected {} sparse points from {} resampled (cap {})",
            kept.len(),
            total,
            max_points
        );
        Ok(SparseToolpath::from(kept))
    }
}
