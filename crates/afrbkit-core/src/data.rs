//! Toolpath data model shared by the pipeline crates.

use serde::{Deserialize, Serialize};

/// One reconstructed tool position
///
/// Emitted once per motion line that names at least one of X, Y or Z.
/// Coordinates are absolute machine millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Whether the feed axis was advancing on the triggering line
    pub extruding: bool,
}

impl PositionSample {
    pub fn new(x: f64, y: f64, z: f64, extruding: bool) -> Self {
        Self { x, y, z, extruding }
    }

    /// Planar projection
    #[inline]
    pub fn xy(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Extrusion flag as 0/1
    #[inline]
    pub fn extruding_flag(&self) -> u8 {
        u8::from(self.extruding)
    }
}

/// Bounding box accumulator used while collecting toolpaths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new()
    }
}

impl Bounds {
    pub fn new() -> Self {
        Self {
            min_x: f64::MAX,
            max_x: f64::MIN,
            min_y: f64::MAX,
            max_y: f64::MIN,
            min_z: f64::MAX,
            max_z: f64::MIN,
        }
    }

    pub fn update(&mut self, x: f64, y: f64, z: f64) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
        self.min_z = self.min_z.min(z);
        self.max_z = self.max_z.max(z);
    }

    pub fn include(&mut self, sample: &PositionSample) {
        self.update(sample.x, sample.y, sample.z);
    }

    /// True once at least one point has been accumulated
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y && self.min_z <= self.max_z
    }

    pub fn width(&self) -> f64 {
        if self.is_valid() {
            self.max_x - self.min_x
        } else {
            0.0
        }
    }

    pub fn depth(&self) -> f64 {
        if self.is_valid() {
            self.max_y - self.min_y
        } else {
            0.0
        }
    }

    pub fn height(&self) -> f64 {
        if self.is_valid() {
            self.max_z - self.min_z
        } else {
            0.0
        }
    }
}

impl<'a> FromIterator<&'a PositionSample> for Bounds {
    fn from_iter<T: IntoIterator<Item = &'a PositionSample>>(iter: T) -> Self {
        let mut bounds = Bounds::new();
        for sample in iter {
            bounds.include(sample);
        }
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_empty_is_invalid() {
        let bounds = Bounds::new();
        assert!(!bounds.is_valid());
        assert_eq!(bounds.width(), 0.0);
    }

    #[test]
    fn test_bounds_from_samples() {
        let samples = [
            PositionSample::new(1.0, -2.0, 0.2, true),
            PositionSample::new(4.0, 3.0, 0.2, false),
        ];
        let bounds: Bounds = samples.iter().collect();
        assert!(bounds.is_valid());
        assert_eq!(bounds.width(), 3.0);
        assert_eq!(bounds.depth(), 5.0);
        assert_eq!(bounds.height(), 0.0);
    }

    #[test]
    fn test_sample_serializes_flag() {
        let sample = PositionSample::new(1.0, 2.0, 3.0, true);
        assert_eq!(sample.extruding_flag(), 1);
        let json = serde_json::to_string(&sample).unwrap();
        assert!(json.contains("\"extruding\":true"));
    }
}
