//! Minimal RMSD after optimal superposition.

use nalgebra::{Matrix3, Vector3};

use crate::coords::{FrameView, FramesView};
use crate::error::MetricError;
use crate::metric::Metric;

/// Root-mean-square deviation kernel.
///
/// With superposition enabled (the default) each frame is centred and
/// rotated onto the centred reference with the Kabsch algorithm before the
/// deviation is taken, so the result is invariant to rigid-body motion.
#[derive(Debug, Clone, Copy)]
pub struct Rmsd {
    superpose: bool,
}

impl Rmsd {
    /// Creates an RMSD kernel with superposition.
    pub fn new() -> Self {
        Self { superpose: true }
    }

    /// Enables or disables superposition.
    pub fn with_superpose(mut self, superpose: bool) -> Self {
        self.superpose = superpose;
        self
    }

    /// Returns whether frames are superposed before comparison.
    pub fn superpose(&self) -> bool {
        self.superpose
    }
}

impl Default for Rmsd {
    fn default() -> Self {
        Self::new()
    }
}

impl Metric for Rmsd {
    fn distances(
        &self,
        frames: FramesView<'_>,
        reference: FrameView<'_>,
    ) -> Result<Vec<f64>, MetricError> {
        let (_, n_atoms, _) = frames.dim();
        if n_atoms != reference.dim().0 {
            return Err(MetricError::AtomCountMismatch {
                frames: n_atoms,
                reference: reference.dim().0,
            });
        }
        if n_atoms == 0 {
            return Err(MetricError::NoAtoms);
        }

        let reference = to_points(reference).ok_or(MetricError::NonFiniteReference)?;
        let (ref_centred, _) = centre(&reference);

        frames
            .outer_iter()
            .enumerate()
            .map(|(i, frame)| {
                let points = to_points(frame).ok_or(MetricError::NonFiniteCoordinate { frame: i })?;
                Ok(if self.superpose {
                    let (centred, _) = centre(&points);
                    rmsd_superposed(&centred, &ref_centred)
                } else {
                    rmsd_raw(&points, &reference)
                })
            })
            .collect()
    }
}

/// Converts a frame to `f64` points, returning `None` if any value is not finite.
fn to_points(frame: FrameView<'_>) -> Option<Vec<Vector3<f64>>> {
    frame
        .outer_iter()
        .map(|atom| {
            let p = Vector3::new(atom[0] as f64, atom[1] as f64, atom[2] as f64);
            p.iter().all(|v| v.is_finite()).then_some(p)
        })
        .collect()
}

fn centre(points: &[Vector3<f64>]) -> (Vec<Vector3<f64>>, Vector3<f64>) {
    let centroid = points.iter().sum::<Vector3<f64>>() / points.len() as f64;
    (points.iter().map(|p| p - centroid).collect(), centroid)
}

fn rmsd_raw(x: &[Vector3<f64>], y: &[Vector3<f64>]) -> f64 {
    let sum: f64 = x.iter().zip(y).map(|(a, b)| (a - b).norm_squared()).sum();
    (sum / x.len() as f64).sqrt()
}

/// RMSD between two centred point sets after the optimal rotation of `x` onto `y`.
fn rmsd_superposed(x: &[Vector3<f64>], y: &[Vector3<f64>]) -> f64 {
    let mut h: Matrix3<f64> = Matrix3::zeros();
    for (xi, yi) in x.iter().zip(y) {
        h += xi * yi.transpose();
    }
    let svd = h.svd(true, true);
    let (u, v_t) = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => (u, v_t),
        _ => return rmsd_raw(x, y),
    };
    let mut r: Matrix3<f64> = v_t.transpose() * u.transpose();
    if r.determinant() < 0.0 {
        let mut v_t_adj = v_t;
        v_t_adj.row_mut(2).neg_mut();
        r = v_t_adj.transpose() * u.transpose();
    }
    let sum: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (r * xi - yi).norm_squared())
        .sum();
    (sum / x.len() as f64).sqrt()
}
