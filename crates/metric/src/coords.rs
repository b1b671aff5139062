//! Memory-resident coordinate arrays.
//!
//! A [`Coordinates`] array holds `n_frames × n_atoms × 3` positions in a
//! single contiguous `ndarray` buffer. Trajectories are concatenated along
//! the frame axis; a separate length vector recovers the per-trajectory
//! segments. All evaluation APIs borrow views, so no frame is copied unless a
//! caller explicitly selects a subset.

use std::ops::Range;

use ndarray::{Array3, ArrayView2, ArrayView3, Axis, s};

use crate::error::MetricError;

/// Borrowed view of a contiguous run of frames (`frames × atoms × 3`).
pub type FramesView<'a> = ArrayView3<'a, f32>;

/// Borrowed view of a single frame (`atoms × 3`).
pub type FrameView<'a> = ArrayView2<'a, f32>;

/// Concatenated frames of one or more trajectories.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinates {
    xyz: Array3<f32>,
}

impl Coordinates {
    /// Wraps an existing `frames × atoms × 3` array.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::ShapeMismatch`] if the last axis is not 3.
    pub fn new(xyz: Array3<f32>) -> Result<Self, MetricError> {
        let (n_frames, n_atoms, n_dims) = xyz.dim();
        if n_dims != 3 {
            return Err(MetricError::ShapeMismatch {
                len: xyz.len(),
                n_frames,
                n_atoms,
            });
        }
        Ok(Self { xyz })
    }

    /// Builds coordinates from a flat frame-major buffer `[f0a0x, f0a0y, ...]`.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::ShapeMismatch`] if `xyz.len() != n_frames * n_atoms * 3`.
    pub fn from_flat(n_frames: usize, n_atoms: usize, xyz: Vec<f32>) -> Result<Self, MetricError> {
        let len = xyz.len();
        let xyz = Array3::from_shape_vec((n_frames, n_atoms, 3), xyz).map_err(|_| {
            MetricError::ShapeMismatch {
                len,
                n_frames,
                n_atoms,
            }
        })?;
        Ok(Self { xyz })
    }

    /// Creates an array with zero frames of `n_atoms` atoms.
    pub fn empty(n_atoms: usize) -> Self {
        Self {
            xyz: Array3::zeros((0, n_atoms, 3)),
        }
    }

    /// Concatenates several coordinate arrays along the frame axis.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::AtomCountMismatch`] if the parts disagree on
    /// the number of atoms.
    pub fn concatenate(parts: &[Coordinates]) -> Result<Self, MetricError> {
        let Some(first) = parts.first() else {
            return Ok(Self::empty(0));
        };
        let n_atoms = first.n_atoms();
        if let Some(bad) = parts.iter().find(|p| p.n_atoms() != n_atoms) {
            return Err(MetricError::AtomCountMismatch {
                frames: bad.n_atoms(),
                reference: n_atoms,
            });
        }
        let views: Vec<FramesView<'_>> = parts.iter().map(|p| p.view()).collect();
        let xyz = ndarray::concatenate(Axis(0), &views).map_err(|_| MetricError::ShapeMismatch {
            len: views.iter().map(|v| v.len()).sum(),
            n_frames: views.iter().map(|v| v.dim().0).sum(),
            n_atoms,
        })?;
        Ok(Self { xyz })
    }

    /// Number of frames.
    pub fn n_frames(&self) -> usize {
        self.xyz.dim().0
    }

    /// Number of atoms per frame.
    pub fn n_atoms(&self) -> usize {
        self.xyz.dim().1
    }

    /// Returns `true` when there are no frames.
    pub fn is_empty(&self) -> bool {
        self.n_frames() == 0
    }

    /// Borrows every frame.
    pub fn view(&self) -> FramesView<'_> {
        self.xyz.view()
    }

    /// Borrows a single frame.
    ///
    /// # Panics
    ///
    /// Panics if `index >= n_frames()`.
    pub fn frame(&self, index: usize) -> FrameView<'_> {
        self.xyz.index_axis(Axis(0), index)
    }

    /// Borrows a single frame, checking bounds.
    pub fn try_frame(&self, index: usize) -> Result<FrameView<'_>, MetricError> {
        if index >= self.n_frames() {
            return Err(MetricError::FrameOutOfBounds {
                index,
                n_frames: self.n_frames(),
            });
        }
        Ok(self.frame(index))
    }

    /// Borrows a contiguous frame range.
    ///
    /// # Panics
    ///
    /// Panics if the range extends past `n_frames()`.
    pub fn frames(&self, range: Range<usize>) -> FramesView<'_> {
        self.xyz.slice(s![range, .., ..])
    }

    /// Copies the listed frames, in the given order, into a new array.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::FrameOutOfBounds`] for the first invalid index.
    pub fn select(&self, indices: &[usize]) -> Result<Self, MetricError> {
        if let Some(&index) = indices.iter().find(|&&i| i >= self.n_frames()) {
            return Err(MetricError::FrameOutOfBounds {
                index,
                n_frames: self.n_frames(),
            });
        }
        Ok(Self {
            xyz: self.xyz.select(Axis(0), indices),
        })
    }

    /// Consumes the wrapper and returns the underlying array.
    pub fn into_inner(self) -> Array3<f32> {
        self.xyz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n_frames: usize, n_atoms: usize) -> Coordinates {
        let xyz = (0..n_frames * n_atoms * 3).map(|v| v as f32).collect();
        Coordinates::from_flat(n_frames, n_atoms, xyz).unwrap()
    }

    #[test]
    fn from_flat_shape() {
        let c = ramp(4, 2);
        assert_eq!(c.n_frames(), 4);
        assert_eq!(c.n_atoms(), 2);
        assert!(!c.is_empty());
        assert_eq!(c.frame(1)[[0, 0]], 6.0);
    }

    #[test]
    fn from_flat_rejects_bad_length() {
        let result = Coordinates::from_flat(2, 2, vec![0.0; 11]);
        assert!(matches!(
            result,
            Err(MetricError::ShapeMismatch {
                len: 11,
                n_frames: 2,
                n_atoms: 2
            })
        ));
    }

    #[test]
    fn new_rejects_non_cartesian() {
        let result = Coordinates::new(Array3::zeros((2, 3, 2)));
        assert!(result.is_err());
    }

    #[test]
    fn frames_is_a_view() {
        let c = ramp(5, 1);
        let v = c.frames(1..3);
        assert_eq!(v.dim(), (2, 1, 3));
        assert_eq!(v[[0, 0, 0]], 3.0);
        assert_eq!(v[[1, 0, 2]], 8.0);
    }

    #[test]
    fn select_preserves_order() {
        let c = ramp(5, 1);
        let sel = c.select(&[4, 0]).unwrap();
        assert_eq!(sel.n_frames(), 2);
        assert_eq!(sel.frame(0)[[0, 0]], 12.0);
        assert_eq!(sel.frame(1)[[0, 0]], 0.0);
    }

    #[test]
    fn select_out_of_bounds() {
        let c = ramp(3, 1);
        assert!(matches!(
            c.select(&[0, 3]),
            Err(MetricError::FrameOutOfBounds {
                index: 3,
                n_frames: 3
            })
        ));
        assert!(c.try_frame(3).is_err());
    }

    #[test]
    fn concatenate_appends_frames() {
        let a = ramp(2, 2);
        let b = ramp(3, 2);
        let c = Coordinates::concatenate(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(c.n_frames(), 5);
        assert_eq!(c.frames(0..2), a.view());
        assert_eq!(c.frames(2..5), b.view());
    }

    #[test]
    fn concatenate_rejects_atom_mismatch() {
        let result = Coordinates::concatenate(&[ramp(1, 2), ramp(1, 3)]);
        assert!(matches!(
            result,
            Err(MetricError::AtomCountMismatch {
                frames: 3,
                reference: 2
            })
        ));
    }

    #[test]
    fn concatenate_empty() {
        let c = Coordinates::concatenate(&[]).unwrap();
        assert!(c.is_empty());
    }
}
