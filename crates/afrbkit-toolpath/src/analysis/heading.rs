//! Wheel heading analysis
//!
//! Estimates the direction of travel at every toolpath point and measures how
//! smoothly a wheel following that heading would have to turn. Used to pick a
//! smoothing window before driving the 4th-axis simulation.

use std::f64::consts::{PI, TAU};

use afrbkit_core::ConfigError;
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Segments shorter than this have no direction
const MIN_SEGMENT_LEN: f64 = 1e-12;

/// Below this the incoming and outgoing directions are treated as a reversal
const REVERSAL_EPS: f64 = 1e-8;

/// Heading analysis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingConfig {
    /// Moving-average window sizes to compare
    pub windows: Vec<usize>,
    /// Fewest animation frames used to turn between two headings
    pub min_frames: usize,
    /// Most animation frames used to turn between two headings
    pub max_frames: usize,
}

impl Default for HeadingConfig {
    fn default() -> Self {
        Self {
            windows: vec![1, 3, 5, 9],
            min_frames: 4,
            max_frames: 24,
        }
    }
}

impl HeadingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.windows.is_empty() {
            return Err(ConfigError::invalid("windows", "at least one window is required"));
        }
        if self.windows.contains(&0) {
            return Err(ConfigError::invalid("windows", "every window must be >= 1"));
        }
        if self.min_frames == 0 {
            return Err(ConfigError::invalid("min_frames", "must be >= 1"));
        }
        if self.min_frames > self.max_frames {
            return Err(ConfigError::invalid(
                "max_frames",
                format!("must be >= min_frames ({})", self.min_frames),
            ));
        }
        Ok(())
    }
}

/// Summary of successive heading changes, in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HeadingStats {
    pub max_deg: f64,
    pub median_deg: f64,
    pub mean_deg: f64,
}

/// Result of analysing one smoothing window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowReport {
    pub window: usize,
    pub stats: HeadingStats,
    /// Largest per-frame step of the simulated wheel, in degrees
    pub frame_max_deg: f64,
    /// Mean per-frame step of the simulated wheel, in degrees
    pub frame_mean_deg: f64,
}

fn unit_or_zero(v: DVec2) -> DVec2 {
    let len = v.length();
    if len > MIN_SEGMENT_LEN {
        v / len
    } else {
        DVec2::ZERO
    }
}

/// Per-point tangent directions of a polyline
fn tangents(points: &[DVec2]) -> Vec<DVec2> {
    let n = points.len();
    let segs: Vec<DVec2> = points.windows(2).map(|w| w[1] - w[0]).collect();
    let units: Vec<DVec2> = segs.iter().map(|&s| unit_or_zero(s)).collect();

    (0..n)
        .map(|i| {
            if i == 0 {
                units[0]
            } else if i == n - 1 {
                units[n - 2]
            } else {
                let (u_in, u_out) = (units[i - 1], units[i]);
                let sum = u_in + u_out;
                let norm = sum.length();
                if norm >= REVERSAL_EPS {
                    sum / norm
                } else if segs[i - 1].length() >= segs[i].length() {
                    u_in
                } else {
                    u_out
                }
            }
        })
        .collect()
}

/// Remove jumps larger than pi between successive angles
pub fn unwrap_angles(angles: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(angles.len());
    let Some(&first) = angles.first() else {
        return out;
    };
    out.push(first);

    let mut correction = 0.0;
    for w in angles.windows(2) {
        let d = w[1] - w[0];
        let mut wrapped = (d + PI).rem_euclid(TAU) - PI;
        if wrapped == -PI && d > 0.0 {
            wrapped = PI;
        }
        if d.abs() >= PI {
            correction += wrapped - d;
        }
        out.push(w[1] + correction);
    }
    out
}

/// Centred moving average with zero padding, same length as the input
///
/// For even windows the extra sample is taken from before the centre.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 {
        return values.to_vec();
    }
    let n = values.len() as isize;
    let w = window as isize;
    let offset = (w - 1) / 2;
    (0..n)
        .map(|i| {
            let hi = (i + offset).min(n - 1);
            let lo = (i + offset - (w - 1)).max(0);
            let sum: f64 = (lo..=hi).map(|j| values[j as usize]).sum();
            sum / window as f64
        })
        .collect()
}

/// Smoothed, unwrapped heading (radians) at every point
///
/// Fewer than two points have no direction and give all-zero headings.
pub fn compute_headings(x: &[f64], y: &[f64], window: usize) -> Vec<f64> {
    let points: Vec<DVec2> = x.iter().zip(y).map(|(&x, &y)| DVec2::new(x, y)).collect();
    if points.len() < 2 {
        return vec![0.0; points.len()];
    }

    let raw: Vec<f64> = tangents(&points).iter().map(|t| t.y.atan2(t.x)).collect();
    moving_average(&unwrap_angles(&raw), window)
}

fn wrap_abs(d: f64) -> f64 {
    ((d + PI).rem_euclid(TAU) - PI).abs()
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Statistics of successive heading changes
pub fn heading_stats(thetas: &[f64]) -> HeadingStats {
    let mut deltas: Vec<f64> = thetas
        .windows(2)
        .map(|w| wrap_abs((w[1] - w[0]).abs()))
        .collect();
    if deltas.is_empty() {
        return HeadingStats::default();
    }

    let mean = deltas.iter().sum::<f64>() / deltas.len() as f64;
    deltas.sort_by(f64::total_cmp);
    HeadingStats {
        max_deg: deltas[deltas.len() - 1].to_degrees(),
        median_deg: median(&deltas).to_degrees(),
        mean_deg: mean.to_degrees(),
    }
}

/// Per-frame angle steps (radians) of a wheel animated through `thetas`
///
/// Each heading change is spread over a frame count proportional to its
/// size, clamped to `min_frames..=max_frames`. Changes beyond pi turn the
/// short way round.
pub fn frame_deltas(thetas: &[f64], min_frames: usize, max_frames: usize) -> Vec<f64> {
    let mut deltas = Vec::new();
    let span = max_frames.saturating_sub(min_frames) as f64;

    for w in thetas.windows(2) {
        let (prev, theta) = (w[0], w[1]);
        let d = theta - prev;
        let end = if d.abs() > PI {
            if d > 0.0 {
                prev - (TAU - d)
            } else {
                prev + (TAU + d)
            }
        } else {
            theta
        };
        let abs_d = (end - prev).abs();

        let frames = ((min_frames as f64 + span * (abs_d / PI)) as usize)
            .min(max_frames)
            .max(min_frames);
        let mut last = prev;
        for f in 1..=frames {
            let t = f as f64 / frames as f64;
            let interp = prev + (end - prev) * t;
            deltas.push(wrap_abs(interp - last));
            last = interp;
        }
    }
    deltas
}

/// Compare every configured smoothing window over one path
pub fn evaluate_windows(x: &[f64], y: &[f64], config: &HeadingConfig) -> Vec<WindowReport> {
    config
        .windows
        .iter()
        .map(|&window| {
            let thetas = compute_headings(x, y, window);
            let stats = heading_stats(&thetas);
            let steps = frame_deltas(&thetas, config.min_frames, config.max_frames);
            let (frame_max_deg, frame_mean_deg) = if steps.is_empty() {
                (0.0, 0.0)
            } else {
                let max = steps.iter().copied().fold(0.0, f64::max);
                let mean = steps.iter().sum::<f64>() / steps.len() as f64;
                (max.to_degrees(), mean.to_degrees())
            };
            tracing::debug!(
                "window={} max={:.2} median={:.2} mean={:.2}",
                window,
                stats.max_deg,
                stats.median_deg,
                stats.mean_deg
            );
            WindowReport {
                window,
                stats,
                frame_max_deg,
                frame_mean_deg,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_straight_line_heading() {
        let thetas = compute_headings(&[0.0, 1.0, 2.0, 3.0], &[0.0; 4], 1);
        assert!(thetas.iter().all(|&t| close(t, 0.0)));
    }

    #[test]
    fn test_corner_bisects_tangent() {
        let thetas = compute_headings(&[0.0, 1.0, 1.0], &[0.0, 0.0, 1.0], 1);
        assert!(close(thetas[0], 0.0));
        assert!(close(thetas[1], FRAC_PI_2 / 2.0));
        assert!(close(thetas[2], FRAC_PI_2));
    }

    #[test]
    fn test_reversal_takes_longer_segment() {
        // out 2mm along +x, back 1mm
        let thetas = compute_headings(&[0.0, 2.0, 1.0], &[0.0, 0.0, 0.0], 1);
        assert!(close(thetas[1], 0.0));
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(compute_headings(&[], &[], 3).is_empty());
        assert_eq!(compute_headings(&[1.0], &[1.0], 3), vec![0.0]);
    }

    #[test]
    fn test_unwrap_removes_jumps() {
        let out = unwrap_angles(&[3.0, -3.0]);
        assert!(close(out[1], -3.0 + TAU));
        let out = unwrap_angles(&[0.0, 1.0, 2.0]);
        assert_eq!(out, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_moving_average_zero_padded() {
        let out = moving_average(&[3.0, 3.0, 3.0, 3.0], 3);
        assert_eq!(out, vec![2.0, 3.0, 3.0, 2.0]);
        let out = moving_average(&[1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(out, vec![0.5, 1.5, 2.5, 3.5]);
        assert_eq!(moving_average(&[1.0, 5.0], 1), vec![1.0, 5.0]);
    }

    #[test]
    fn test_stats() {
        let stats = heading_stats(&[0.0, 0.1, 0.3, 0.6]);
        assert!(close(stats.max_deg, 0.3f64.to_degrees()));
        assert!(close(stats.median_deg, 0.2f64.to_degrees()));
        assert!(close(stats.mean_deg, 0.2f64.to_degrees()));
        assert_eq!(heading_stats(&[1.0]), HeadingStats::default());
    }

    #[test]
    fn test_frame_deltas_small_turn_uses_min_frames() {
        let deltas = frame_deltas(&[0.0, 0.4], 4, 24);
        assert_eq!(deltas.len(), 6);
        assert!(deltas.iter().all(|&d| close(d, 0.4 / 6.0)));
    }

    #[test]
    fn test_frame_deltas_inverted_bounds_use_min_frames() {
        let deltas = frame_deltas(&[0.0, 1.0], 10, 4);
        assert_eq!(deltas.len(), 10);
        assert!(close(deltas.iter().sum::<f64>(), 1.0));

        let config = HeadingConfig {
            min_frames: 10,
            max_frames: 4,
            ..Default::default()
        };
        let reports = evaluate_windows(&[0.0, 1.0, 1.0], &[0.0, 0.0, 1.0], &config);
        assert_eq!(reports.len(), config.windows.len());
    }

    #[test]
    fn test_frame_deltas_wraps_short_way() {
        // +3pi/2 is turned as -pi/2
        let deltas = frame_deltas(&[0.0, 1.5 * PI], 4, 24);
        let total: f64 = deltas.iter().sum();
        assert!(close(total, FRAC_PI_2));
        assert_eq!(deltas.len(), 14);
    }

    #[test]
    fn test_evaluate_windows_reports_each() {
        let x = [0.0, 1.0, 2.0, 2.0, 2.0];
        let y = [0.0, 0.0, 0.0, 1.0, 2.0];
        let reports = evaluate_windows(&x, &y, &HeadingConfig::default());
        let windows: Vec<usize> = reports.iter().map(|r| r.window).collect();
        assert_eq!(windows, vec![1, 3, 5, 9]);
        assert!(reports[0].stats.max_deg > 0.0);
    }

    #[test]
    fn test_heading_config_validate() {
        assert!(HeadingConfig::default().validate().is_ok());
        let bad = HeadingConfig {
            windows: vec![0],
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad = HeadingConfig {
            min_frames: 30,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
