//! Partitioned distance evaluation.
//!
//! Very large single calls into a distance kernel can exhaust its working
//! memory. [`Partitioned`] splits the frame axis into `P` contiguous blocks,
//! evaluates them independently on the rayon pool and concatenates the
//! results in frame order. Every block reads a disjoint frame range and
//! writes a disjoint output range.

use rayon::prelude::*;
use tracing::trace;

use crate::coords::{FrameView, FramesView};
use crate::error::MetricError;
use crate::metric::Metric;

/// Computes the `partitions + 1` block boundaries for `n_frames` frames.
///
/// Boundaries are linearly interpolated over `[0, n_frames]` and truncated to
/// integers; the first is always 0 and the last always `n_frames`. When
/// `partitions > n_frames` some blocks are empty.
///
/// ```
/// use mdmsm_metric::partition_bounds;
///
/// assert_eq!(partition_bounds(10, 3), vec![0, 3, 6, 10]);
/// assert_eq!(partition_bounds(10, 1), vec![0, 10]);
/// ```
pub fn partition_bounds(n_frames: usize, partitions: usize) -> Vec<usize> {
    let p = partitions.max(1);
    (0..=p).map(|i| i * n_frames / p).collect()
}

/// Metric adapter that evaluates an inner metric block by block.
///
/// Without a partition count the inner metric is called once on the whole
/// segment. With `P` partitions the output is identical to the single call,
/// provided the inner metric evaluates frames independently.
#[derive(Debug, Clone)]
pub struct Partitioned<M> {
    inner: M,
    partitions: Option<usize>,
}

impl<M: Metric> Partitioned<M> {
    /// Wraps `inner` with partitioning disabled.
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            partitions: None,
        }
    }

    /// Sets the number of blocks.
    pub fn with_partitions(mut self, partitions: usize) -> Self {
        self.partitions = Some(partitions);
        self
    }

    /// Sets or clears the number of blocks.
    pub fn with_partitions_opt(mut self, partitions: Option<usize>) -> Self {
        self.partitions = partitions;
        self
    }

    /// Returns the configured number of blocks, if any.
    pub fn partitions(&self) -> Option<usize> {
        self.partitions
    }

    /// Returns the wrapped metric.
    pub fn inner(&self) -> &M {
        &self.inner
    }
}

impl<M: Metric> Metric for Partitioned<M> {
    fn distances(
        &self,
        frames: FramesView<'_>,
        reference: FrameView<'_>,
    ) -> Result<Vec<f64>, MetricError> {
        let partitions = match self.partitions {
            None => return self.inner.distances(frames, reference),
            Some(0) => return Err(MetricError::InvalidPartitions { partitions: 0 }),
            Some(p) => p,
        };

        let n_frames = frames.dim().0;
        let bounds = partition_bounds(n_frames, partitions);
        trace!(n_frames, partitions, "evaluating partitioned distances");

        let blocks: Vec<Result<Vec<f64>, MetricError>> = bounds
            .par_windows(2)
            .enumerate()
            .map(|(index, w)| {
                let (start, end) = (w[0], w[1]);
                if start == end {
                    return Ok(Vec::new());
                }
                let block = frames.slice(ndarray::s![start..end, .., ..]);
                self.inner
                    .distances(block, reference)
                    .and_then(|d| {
                        if d.len() == end - start {
                            Ok(d)
                        } else {
                            Err(MetricError::OutputLengthMismatch {
                                expected: end - start,
                                got: d.len(),
                            })
                        }
                    })
                    .map_err(|e| MetricError::Partition {
                        index,
                        start,
                        end,
                        source: Box::new(rebase(e, start)),
                    })
            })
            .collect();

        let mut out = Vec::with_capacity(n_frames);
        for block in blocks {
            out.extend(block?);
        }
        Ok(out)
    }
}

/// Shifts block-local frame indices in `err` by the block's first frame.
fn rebase(err: MetricError, start: usize) -> MetricError {
    match err {
        MetricError::NonFiniteCoordinate { frame } => MetricError::NonFiniteCoordinate {
            frame: frame + start,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Coordinates;
    use crate::metric::metric_fn;
    use crate::rmsd::Rmsd;

    #[test]
    fn bounds_cover_range() {
        assert_eq!(partition_bounds(7, 2), vec![0, 3, 7]);
        assert_eq!(partition_bounds(0, 3), vec![0, 0, 0, 0]);
        assert_eq!(partition_bounds(2, 4), vec![0, 0, 1, 1, 2]);
    }

    #[test]
    fn bounds_zero_partitions_treated_as_one() {
        assert_eq!(partition_bounds(5, 0), vec![0, 5]);
    }

    #[test]
    fn zero_partitions_rejected() {
        let inner = metric_fn(|f, _| Ok(vec![0.0; f.dim().0]));
        let metric = Partitioned::new(inner).with_partitions(0);
        let coords = Coordinates::from_flat(2, 1, vec![0.0; 6]).unwrap();
        assert!(matches!(
            metric.distances(coords.view(), coords.frame(0)),
            Err(MetricError::InvalidPartitions { partitions: 0 })
        ));
    }

    #[test]
    fn failing_block_is_identified() {
        // Fails on any block containing a frame whose first x is negative.
        let inner = metric_fn(|frames, _| {
            if frames.outer_iter().any(|f| f[[0, 0]] < 0.0) {
                Err(MetricError::Kernel {
                    reason: "negative".to_string(),
                })
            } else {
                Ok(vec![0.0; frames.dim().0])
            }
        });
        let mut xyz = vec![0.0f32; 6 * 3];
        xyz[4 * 3] = -1.0; // frame 4
        let coords = Coordinates::from_flat(6, 1, xyz).unwrap();
        let metric = Partitioned::new(inner).with_partitions(3);
        match metric.distances(coords.view(), coords.frame(0)) {
            Err(MetricError::Partition {
                index, start, end, ..
            }) => {
                assert_eq!((index, start, end), (2, 4, 6));
            }
            other => panic!("expected partition error, got {other:?}"),
        }
    }

    #[test]
    fn non_finite_frame_reported_against_whole_segment() {
        let mut xyz = vec![0.0f32; 6 * 3 * 3];
        for (i, x) in xyz.iter_mut().enumerate() {
            *x = (i % 5) as f32;
        }
        xyz[5 * 9 + 2] = f32::NAN; // frame 5
        let coords = Coordinates::from_flat(6, 3, xyz).unwrap();
        let metric = Partitioned::new(Rmsd::new()).with_partitions(3);
        match metric.distances(coords.view(), coords.frame(0)) {
            Err(MetricError::Partition { start, source, .. }) => {
                assert_eq!(start, 4);
                assert!(matches!(*source, MetricError::NonFiniteCoordinate { frame: 5 }));
            }
            other => panic!("expected partition error, got {other:?}"),
        }
    }
}
