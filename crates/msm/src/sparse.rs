//! Sparse count and probability matrices backed by `sprs`.

use std::collections::BTreeMap;

use sprs::{CsMat, TriMat};

use crate::error::MsmError;

/// A sparse `f64` matrix in compressed sparse row form.
///
/// Only non-zero entries are stored; explicit zeros are dropped on
/// construction. Within each row, column indices are strictly increasing,
/// so two matrices with the same entries compare equal with `==`.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    inner: CsMat<f64>,
}

impl SparseMatrix {
    /// Creates an all-zero matrix.
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        Self {
            inner: CsMat::zero((n_rows, n_cols)),
        }
    }

    /// Builds a matrix from `(row, col, value)` triplets, summing duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`MsmError::IndexOutOfBounds`] for an entry outside the shape
    /// and [`MsmError::InvalidValue`] for a non-finite value.
    pub fn from_triplets<I>(n_rows: usize, n_cols: usize, triplets: I) -> Result<Self, MsmError>
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let mut tri = TriMat::new((n_rows, n_cols));
        for (row, col, value) in triplets {
            if row >= n_rows || col >= n_cols {
                return Err(MsmError::IndexOutOfBounds {
                    row,
                    col,
                    n_rows,
                    n_cols,
                });
            }
            if !value.is_finite() {
                return Err(MsmError::InvalidValue { row, col, value });
            }
            if value != 0.0 {
                tri.add_triplet(row, col, value);
            }
        }
        Ok(Self::pruned(tri.to_csr()))
    }

    /// Wraps an existing `sprs` matrix in either storage order.
    ///
    /// # Errors
    ///
    /// Returns [`MsmError::InvalidValue`] for a non-finite entry.
    pub fn from_csmat(matrix: &CsMat<f64>) -> Result<Self, MsmError> {
        let (n_rows, n_cols) = matrix.shape();
        Self::from_triplets(
            n_rows,
            n_cols,
            matrix.iter().map(|(&v, (i, j))| (i, j, v)),
        )
    }

    /// Builds a matrix from a row-major dense array.
    pub fn from_dense(rows: &[Vec<f64>]) -> Result<Self, MsmError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().find(|r| r.len() != n_cols) {
            return Err(MsmError::IndexOutOfBounds {
                row: n_rows,
                col: bad.len(),
                n_rows,
                n_cols,
            });
        }
        Self::from_triplets(
            n_rows,
            n_cols,
            rows.iter()
                .enumerate()
                .flat_map(|(i, r)| r.iter().enumerate().map(move |(j, &v)| (i, j, v))),
        )
    }

    /// Drops explicit zeros left behind by summed duplicates or arithmetic.
    fn pruned(matrix: CsMat<f64>) -> Self {
        if matrix.data().iter().all(|&v| v != 0.0) {
            return Self { inner: matrix };
        }
        let mut tri = TriMat::new(matrix.shape());
        for (&v, (i, j)) in matrix.iter() {
            if v != 0.0 {
                tri.add_triplet(i, j, v);
            }
        }
        Self {
            inner: tri.to_csr(),
        }
    }

    /// Rebuilds from entries already known to be finite and in bounds.
    fn rebuild<I>(shape: (usize, usize), entries: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let mut tri = TriMat::new(shape);
        for (i, j, v) in entries {
            if v != 0.0 {
                tri.add_triplet(i, j, v);
            }
        }
        Self::pruned(tri.to_csr())
    }

    /// The underlying CSR matrix.
    pub fn as_csmat(&self) -> &CsMat<f64> {
        &self.inner
    }

    /// Consumes the wrapper, returning the CSR matrix.
    pub fn into_csmat(self) -> CsMat<f64> {
        self.inner
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.inner.rows()
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.inner.cols()
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        self.inner.shape()
    }

    /// Returns `true` for square matrices.
    pub fn is_square(&self) -> bool {
        self.n_rows() == self.n_cols()
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.inner.nnz()
    }

    /// Returns the entry at `(row, col)`, zero if not stored or out of
    /// bounds.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.inner.get(row, col).copied().unwrap_or(0.0)
    }

    /// Iterates over the stored `(col, value)` entries of one row.
    ///
    /// # Panics
    ///
    /// Panics if `row >= n_rows()`.
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let entries: Vec<(usize, f64)> = match self.inner.outer_view(row) {
            Some(view) => view.iter().map(|(j, &v)| (j, v)).collect(),
            None => panic!("row {row} out of bounds for {} rows", self.n_rows()),
        };
        entries.into_iter()
    }

    /// Iterates over all stored `(row, col, value)` entries in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.inner.iter().map(|(&v, (i, j))| (i, j, v))
    }

    /// Sum of every row.
    pub fn row_sums(&self) -> Vec<f64> {
        self.inner
            .outer_iterator()
            .map(|row| row.data().iter().sum())
            .collect()
    }

    /// Sum of all entries.
    pub fn sum(&self) -> f64 {
        self.inner.data().iter().sum()
    }

    /// Returns the transpose.
    pub fn transpose(&self) -> Self {
        Self {
            inner: self.inner.transpose_view().to_csr(),
        }
    }

    /// Element-wise sum of two equally shaped matrices.
    ///
    /// # Errors
    ///
    /// Returns [`MsmError::IndexOutOfBounds`] if the shapes differ.
    pub fn add(&self, other: &Self) -> Result<Self, MsmError> {
        if self.shape() != other.shape() {
            return Err(MsmError::IndexOutOfBounds {
                row: other.n_rows(),
                col: other.n_cols(),
                n_rows: self.n_rows(),
                n_cols: self.n_cols(),
            });
        }
        Ok(Self::pruned(&self.inner + &other.inner))
    }

    /// Applies `f(row, col, value)` to every stored value, keeping the
    /// sparsity pattern except for results that are exactly zero.
    pub fn map(&self, mut f: impl FnMut(usize, usize, f64) -> f64) -> Self {
        Self::rebuild(self.shape(), self.iter().map(|(i, j, v)| (i, j, f(i, j, v))))
    }

    /// Induced submatrix on `keep` (rows and columns, in the given order).
    pub fn submatrix(&self, keep: &[usize]) -> Self {
        let position: BTreeMap<usize, usize> =
            keep.iter().enumerate().map(|(new, &old)| (old, new)).collect();
        let entries = self.iter().filter_map(|(i, j, v)| {
            let new_i = *position.get(&i)?;
            let new_j = *position.get(&j)?;
            Some((new_i, new_j, v))
        });
        Self::rebuild((keep.len(), keep.len()), entries)
    }

    /// Row-vector product `v · M`.
    ///
    /// # Panics
    ///
    /// Panics if `v.len() != n_rows()`.
    pub fn left_mul(&self, v: &[f64]) -> Vec<f64> {
        assert_eq!(v.len(), self.n_rows(), "vector length must match row count");
        let mut out = vec![0.0; self.n_cols()];
        for (row, &vi) in self.inner.outer_iterator().zip(v) {
            if vi == 0.0 {
                continue;
            }
            for (j, &m) in row.iter() {
                out[j] += vi * m;
            }
        }
        out
    }

    /// Dense row-major copy.
    pub fn to_dense(&self) -> Vec<Vec<f64>> {
        let mut dense = vec![vec![0.0; self.n_cols()]; self.n_rows()];
        for (i, j, v) in self.iter() {
            dense[i][j] = v;
        }
        dense
    }

    /// Returns `true` when both matrices have the same shape and sparsity
    /// pattern and every value agrees within `atol + rtol * |other|`.
    pub fn approx_eq(&self, other: &Self, rtol: f64, atol: f64) -> bool {
        self.shape() == other.shape()
            && self
                .inner
                .outer_iterator()
                .zip(other.inner.outer_iterator())
                .all(|(a, b)| {
                    a.indices() == b.indices()
                        && a.data()
                            .iter()
                            .zip(b.data())
                            .all(|(x, y)| (x - y).abs() <= atol + rtol * y.abs())
                })
    }
}
