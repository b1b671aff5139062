//! The distance-kernel seam.

use crate::coords::{FrameView, FramesView};
use crate::error::MetricError;

/// A structural distance between every frame of a segment and one reference.
///
/// Implementations must return exactly one value per frame, in frame order,
/// and must not depend on how the caller slices the segment: evaluating two
/// halves separately yields the same values as evaluating the whole.
pub trait Metric: Sync {
    /// Computes the distance from each frame in `frames` to `reference`.
    fn distances(
        &self,
        frames: FramesView<'_>,
        reference: FrameView<'_>,
    ) -> Result<Vec<f64>, MetricError>;
}

impl<M: Metric + ?Sized> Metric for &M {
    fn distances(
        &self,
        frames: FramesView<'_>,
        reference: FrameView<'_>,
    ) -> Result<Vec<f64>, MetricError> {
        (**self).distances(frames, reference)
    }
}

/// A [`Metric`] backed by a closure, for plugging in external kernels.
///
/// Built with [`metric_fn`].
#[derive(Clone)]
pub struct FnMetric<F> {
    f: F,
}

impl<F> std::fmt::Debug for FnMetric<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnMetric").finish_non_exhaustive()
    }
}

/// Wraps a closure as a [`Metric`].
///
/// # Example
///
/// ```
/// use mdmsm_metric::{Coordinates, Metric, metric_fn};
///
/// // Distance of atom 0's x coordinate from the reference.
/// let metric = metric_fn(|frames, reference| {
///     Ok(frames
///         .outer_iter()
///         .map(|f| (f[[0, 0]] - reference[[0, 0]]).abs() as f64)
///         .collect())
/// });
///
/// let coords = Coordinates::from_flat(2, 1, vec![0.0, 0.0, 0.0, 3.0, 0.0, 0.0]).unwrap();
/// let d = metric.distances(coords.view(), coords.frame(0)).unwrap();
/// assert_eq!(d, vec![0.0, 3.0]);
/// ```
pub fn metric_fn<F>(f: F) -> FnMetric<F>
where
    F: Fn(FramesView<'_>, FrameView<'_>) -> Result<Vec<f64>, MetricError> + Sync,
{
    FnMetric { f }
}

impl<F> Metric for FnMetric<F>
where
    F: Fn(FramesView<'_>, FrameView<'_>) -> Result<Vec<f64>, MetricError> + Sync,
{
    fn distances(
        &self,
        frames: FramesView<'_>,
        reference: FrameView<'_>,
    ) -> Result<Vec<f64>, MetricError> {
        let n = frames.dim().0;
        let out = (self.f)(frames, reference)?;
        if out.len() != n {
            return Err(MetricError::OutputLengthMismatch {
                expected: n,
                got: out.len(),
            });
        }
        Ok(out)
    }
}
