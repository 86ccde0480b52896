//! Overlapping batch assembly for spline fitting
//!
//! Consecutive batches share a two-point seam: the last two points of the
//! buffer seed the next one instead of being emitted. Concatenating every
//! batch therefore reproduces the resampled stream exactly, while a
//! downstream fitter still sees enough history at each boundary.

use afrbkit_core::ToolpathError;
use glam::DVec2;
use tracing::{debug, warn};

/// Smallest batch size that leaves at least one point to emit
pub const MIN_BATCH_SIZE: usize = 3;

/// Points carried over between batches
pub const SEAM_OVERLAP: usize = 2;

/// Push-based batch accumulator
#[derive(Debug, Clone)]
pub struct StreamBatcher {
    batch_size: usize,
    buffer: Vec<DVec2>,
    batches_emitted: u64,
}

impl StreamBatcher {
    pub fn new(batch_size: usize) -> Self {
        let batch_size = if batch_size < MIN_BATCH_SIZE {
            warn!(
                "batch_size {} too small, using {}",
                batch_size, MIN_BATCH_SIZE
            );
            MIN_BATCH_SIZE
        } else {
            batch_size
        };
        Self {
            batch_size,
            buffer: Vec::with_capacity(batch_size),
            batches_emitted: 0,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn batches_emitted(&self) -> u64 {
        self.batches_emitted
    }

    /// Add a point; returns a full batch once the buffer reaches `batch_size`
    pub fn push(&mut self, p: DVec2) -> Option<Vec<DVec2>> {
        self.buffer.push(p);
        if self.buffer.len() < self.batch_size {
            return None;
        }

        let keep_from = self.buffer.len() - SEAM_OVERLAP;
        let mut next = Vec::with_capacity(self.batch_size);
        next.extend_from_slice(&self.buffer[keep_from..]);
        self.buffer.truncate(keep_from);
        self.batches_emitted += 1;
        Some(std::mem::replace(&mut self.buffer, next))
    }

    /// Flush whatever remains, including the seam points
    pub fn finish(&mut self) -> Option<Vec<DVec2>> {
        if self.buffer.is_empty() {
            return None;
        }
        self.batches_emitted += 1;
        Some(std::mem::take(&mut self.buffer))
    }
}

/// Lazy batching adapter over a fallible point stream
pub struct SplineBatches<I> {
    points: I,
    batcher: StreamBatcher,
    done: bool,
}

impl<I> SplineBatches<I>
where
    I: Iterator<Item = Result<DVec2, ToolpathError>>,
{
    pub fn new(points: I, batch_size: usize) -> Self {
        Self {
            points,
            batcher: StreamBatcher::new(batch_size),
            done: false,
        }
    }
}

impl<I> Iterator for SplineBatches<I>
where
    I: Iterator<Item = Result<DVec2, ToolpathError>>,
{
    type Item = Result<Vec<DVec2>, ToolpathError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.points.next() {
                Some(Ok(p)) => {
                    if let Some(batch) = self.batcher.push(p) {
                        return Some(Ok(batch));
                    }
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    let tail = self.batcher.finish();
                    debug!("Batching complete: {} batches", self.batcher.batches_emitted());
                    return tail.map(Ok);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize) -> Vec<DVec2> {
        (0..n).map(|i| DVec2::new(i as f64, 0.0)).collect()
    }

    fn batches(points: &[DVec2], size: usize) -> Vec<Vec<DVec2>> {
        SplineBatches::new(points.iter().copied().map(Ok), size)
            .map(|b| b.unwrap())
            .collect()
    }

    #[test]
    fn test_full_batch_holds_back_seam() {
        let mut batcher = StreamBatcher::new(4);
        let pts = line(4);
        assert!(batcher.push(pts[0]).is_none());
        assert!(batcher.push(pts[1]).is_none());
        assert!(batcher.push(pts[2]).is_none());
        let batch = batcher.push(pts[3]).unwrap();
        assert_eq!(batch, pts[..2].to_vec());
        assert_eq!(batcher.finish().unwrap(), pts[2..].to_vec());
        assert!(batcher.finish().is_none());
    }

    #[test]
    fn test_concatenation_reproduces_stream() {
        let pts = line(23);
        let out = batches(&pts, 5);
        let joined: Vec<DVec2> = out.iter().flatten().copied().collect();
        assert_eq!(joined, pts);
        assert!(out.iter().all(|b| !b.is_empty() && b.len() <= 5));
    }

    #[test]
    fn test_empty_stream_yields_nothing() {
        assert!(batches(&[], 10).is_empty());
    }

    #[test]
    fn test_short_stream_single_remainder() {
        let pts = line(3);
        assert_eq!(batches(&pts, 10), vec![pts]);
    }

    #[test]
    fn test_small_batch_size_clamped() {
        let batcher = StreamBatcher::new(1);
        assert_eq!(batcher.batch_size(), MIN_BATCH_SIZE);

        let pts = line(7);
        let out = batches(&pts, 0);
        assert_eq!(out.iter().map(Vec::len).sum::<usize>(), 7);
    }

    #[test]
    fn test_error_ends_batching() {
        let items = vec![
            Ok(DVec2::ZERO),
            Err(ToolpathError::NotAFile {
                path: "x".into(),
            }),
            Ok(DVec2::ONE),
        ];
        let mut it = SplineBatches::new(items.into_iter(), 3);
        assert!(matches!(it.next(), Some(Err(_))));
        assert!(it.next().is_none());
    }
}
