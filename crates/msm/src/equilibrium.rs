//! Stationary distribution of a transition probability matrix.

use nalgebra::{DMatrix, DVector, Schur};
use tracing::{debug, warn};

use crate::error::MsmError;
use crate::sparse::SparseMatrix;

/// Largest admissible component of `|pi P - lambda pi|` for a returned
/// distribution.
pub const EQ_RESIDUAL_TOLERANCE: f64 = 1e-10;

/// Rows summing to one within this bound are treated as stochastic.
const ROW_SUM_TOLERANCE: f64 = 1e-12;

/// Deviation of the dominant eigenvalue from one above which a warning is
/// logged.
const EIGENVALUE_TOLERANCE: f64 = 1e-6;

/// Iteration cap of the Schur decomposition.
const SCHUR_MAX_ITERATIONS: usize = 10_000;

/// Computes the left eigenvector of `probs` for eigenvalue one, normalised
/// to sum to one.
///
/// Row-stochastic matrices are solved directly: `pi (P - I) = 0` with one
/// equation replaced by `sum(pi) = 1`, factorised by LU. The diagonal of
/// `P - I` is assembled from the off-diagonal rates, so chains whose escape
/// probabilities are far below machine epsilon relative to one are still
/// resolved exactly. Singular systems (several closed classes) fall back to
/// the least-squares solution of the bordered system.
///
/// Matrices with rows lacking probability mass have no eigenvalue one. The
/// eigenvalue closest to one is used instead, its deviation is logged as a
/// warning and its eigenvector is returned.
///
/// # Errors
///
/// Returns [`MsmError::NotSquare`] for a non-square matrix,
/// [`MsmError::NoStationaryDistribution`] when the matrix carries no mass
/// or no non-negative eigenvector is found and
/// [`MsmError::EquilibriumResidual`] when the solution does not satisfy
/// `pi P = lambda pi` within [`EQ_RESIDUAL_TOLERANCE`].
///
/// # Example
///
/// ```rust
/// use mdmsm_msm::{SparseMatrix, eq_probs};
///
/// let p = SparseMatrix::from_dense(&[vec![0.9, 0.1], vec![0.2, 0.8]]).unwrap();
/// let pi = eq_probs(&p).unwrap();
/// assert!((pi[0] - 2.0 / 3.0).abs() < 1e-12);
/// ```
pub fn eq_probs(probs: &SparseMatrix) -> Result<Vec<f64>, MsmError> {
    if !probs.is_square() {
        return Err(MsmError::NotSquare {
            n_rows: probs.n_rows(),
            n_cols: probs.n_cols(),
        });
    }
    let n = probs.n_rows();
    if n == 0 || probs.nnz() == 0 {
        return Err(MsmError::NoStationaryDistribution);
    }

    let stochastic = probs
        .row_sums()
        .iter()
        .all(|s| (s - 1.0).abs() <= ROW_SUM_TOLERANCE);
    let (pi, eigenvalue) = if stochastic {
        (stochastic_solve(probs)?, 1.0)
    } else {
        dominant_eigenvector(probs)?
    };

    if (eigenvalue - 1.0).abs() > EIGENVALUE_TOLERANCE {
        warn!(
            eigenvalue,
            "dominant eigenvalue deviates from one; matrix is not row-stochastic"
        );
    }
    let residual = residual(probs, &pi, eigenvalue);
    if residual > EQ_RESIDUAL_TOLERANCE {
        return Err(MsmError::EquilibriumResidual {
            residual,
            tolerance: EQ_RESIDUAL_TOLERANCE,
        });
    }
    debug!(n_states = n, eigenvalue, residual, "equilibrium solved");
    Ok(pi)
}

/// `max_j |(pi P)_j - lambda pi_j|`.
fn residual(probs: &SparseMatrix, pi: &[f64], eigenvalue: f64) -> f64 {
    probs
        .left_mul(pi)
        .iter()
        .zip(pi)
        .map(|(a, b)| (a - eigenvalue * b).abs())
        .fold(0.0, f64::max)
}

/// Transposed generator `(P - I)^T` with an exact zero column sum.
fn generator_transpose(probs: &SparseMatrix) -> DMatrix<f64> {
    let n = probs.n_rows();
    let mut a = DMatrix::zeros(n, n);
    for (i, j, p) in probs.iter() {
        if i != j {
            a[(j, i)] += p;
            a[(i, i)] -= p;
        }
    }
    a
}

fn stochastic_solve(probs: &SparseMatrix) -> Result<Vec<f64>, MsmError> {
    let n = probs.n_rows();
    let a = generator_transpose(probs);

    let mut square = a.clone();
    square.row_mut(n - 1).fill(1.0);
    let mut rhs = DVector::zeros(n);
    rhs[n - 1] = 1.0;
    let direct = square
        .lu()
        .solve(&rhs)
        .and_then(|x| normalise(x.as_slice()).ok())
        .filter(|pi| residual(probs, pi, 1.0) <= EQ_RESIDUAL_TOLERANCE);
    if let Some(pi) = direct {
        return Ok(pi);
    }

    debug!(n_states = n, "singular equilibrium system, using least squares");
    let bordered = a.insert_row(n, 1.0);
    let mut rhs = DVector::zeros(n + 1);
    rhs[n] = 1.0;
    let x = bordered
        .svd(true, true)
        .solve(&rhs, f64::EPSILON)
        .map_err(|_| MsmError::NoStationaryDistribution)?;
    normalise(x.as_slice())
}

/// Eigenvalue of `P` closest to one and its left eigenvector.
fn dominant_eigenvector(probs: &SparseMatrix) -> Result<(Vec<f64>, f64), MsmError> {
    let n = probs.n_rows();
    let mut pt = DMatrix::zeros(n, n);
    for (i, j, p) in probs.iter() {
        pt[(j, i)] = p;
    }
    let schur = Schur::try_new(pt.clone(), f64::EPSILON, SCHUR_MAX_ITERATIONS).ok_or(
        MsmError::NotConverged {
            solver: "schur decomposition",
            iterations: SCHUR_MAX_ITERATIONS,
            residual: f64::NAN,
        },
    )?;
    let eigenvalue = schur
        .complex_eigenvalues()
        .iter()
        .min_by(|a, b| {
            let da = (a.re - 1.0).hypot(a.im);
            let db = (b.re - 1.0).hypot(b.im);
            da.total_cmp(&db)
        })
        .map(|z| z.re)
        .ok_or(MsmError::NoStationaryDistribution)?;

    let shifted = pt - DMatrix::identity(n, n) * eigenvalue;
    let svd = shifted.svd(false, true);
    let v_t = svd.v_t.ok_or(MsmError::NoStationaryDistribution)?;
    let (smallest, _) = svd
        .singular_values
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .ok_or(MsmError::NoStationaryDistribution)?;
    let v: Vec<f64> = v_t.row(smallest).iter().copied().collect();
    Ok((normalise(&v)?, eigenvalue))
}

/// Scales `v` to unit sum, clearing round-off negatives.
fn normalise(v: &[f64]) -> Result<Vec<f64>, MsmError> {
    let total: f64 = v.iter().sum();
    if !total.is_finite() || total == 0.0 {
        return Err(MsmError::NoStationaryDistribution);
    }
    let scaled: Vec<f64> = v.iter().map(|x| x / total).collect();
    if scaled.iter().any(|&x| !x.is_finite() || x < -EQ_RESIDUAL_TOLERANCE) {
        return Err(MsmError::NoStationaryDistribution);
    }
    let clamped: Vec<f64> = scaled.into_iter().map(|x| x.max(0.0)).collect();
    let total: f64 = clamped.iter().sum();
    Ok(clamped.into_iter().map(|x| x / total).collect())
}
