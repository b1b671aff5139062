//! Estimators turning a count matrix into a row-stochastic matrix.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::MsmError;
use crate::sparse::SparseMatrix;

/// Relative change below which the reversible estimate is converged.
const MLE_TOLERANCE: f64 = 1e-10;

/// Iteration cap of the reversible estimate.
const MLE_MAX_ITERATIONS: usize = 100_000;

/// Maps a count matrix to a transition probability matrix.
///
/// Implementations must return a matrix of the same shape whose rows sum to
/// one, except rows without counts which stay empty.
pub trait Estimator {
    /// Estimates transition probabilities from `counts`.
    fn normalize(&self, counts: &SparseMatrix) -> Result<SparseMatrix, MsmError>;
}

/// The closed set of named estimators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    /// Row normalisation of the raw counts.
    #[default]
    #[serde(alias = "normalize")]
    MaximumLikelihood,
    /// Row normalisation of the symmetrised counts `(C + Cᵀ) / 2`.
    Transpose,
    /// Reversible maximum-likelihood estimate by fixed-point iteration.
    #[serde(alias = "mle")]
    ReversibleMle,
}

impl Method {
    /// All methods, in registry order.
    pub const ALL: [Method; 3] = [Self::MaximumLikelihood, Self::Transpose, Self::ReversibleMle];

    /// Canonical registry name.
    pub fn name(self) -> &'static str {
        match self {
            Self::MaximumLikelihood => "maximum-likelihood",
            Self::Transpose => "transpose",
            Self::ReversibleMle => "reversible-mle",
        }
    }

    /// Resolves a registry name or alias.
    ///
    /// # Errors
    ///
    /// Returns [`MsmError::UnknownMethod`] for names not in the registry.
    pub fn from_name(name: &str) -> Result<Self, MsmError> {
        match name {
            "maximum-likelihood" | "normalize" => Ok(Self::MaximumLikelihood),
            "transpose" => Ok(Self::Transpose),
            "reversible-mle" | "mle" => Ok(Self::ReversibleMle),
            other => Err(MsmError::UnknownMethod {
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = MsmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl Estimator for Method {
    fn normalize(&self, counts: &SparseMatrix) -> Result<SparseMatrix, MsmError> {
        check_counts(counts)?;
        match self {
            Self::MaximumLikelihood => Ok(row_normalize(counts)),
            Self::Transpose => {
                let symmetric = counts.add(&counts.transpose())?.map(|_, _, v| 0.5 * v);
                Ok(row_normalize(&symmetric))
            }
            Self::ReversibleMle => reversible_mle(counts),
        }
    }
}

fn check_counts(counts: &SparseMatrix) -> Result<(), MsmError> {
    if !counts.is_square() {
        return Err(MsmError::NotSquare {
            n_rows: counts.n_rows(),
            n_cols: counts.n_cols(),
        });
    }
    match counts.iter().find(|&(_, _, v)| v < 0.0) {
        Some((row, col, value)) => Err(MsmError::InvalidValue { row, col, value }),
        None => Ok(()),
    }
}

/// Divides every row by its sum. Empty rows stay empty.
pub fn row_normalize(counts: &SparseMatrix) -> SparseMatrix {
    let sums = counts.row_sums();
    counts.map(|i, _, v| v / sums[i])
}

/// Reversible estimate for counts `C`.
///
/// Iterates `x_ij <- (c_ij + c_ji) / (c_i / q_i + c_j / q_j)` where `c_i`
/// is the row sum of `C` and `q_i` the row sum of `x`, starting from
/// `x = C + Cᵀ`, and returns `x` row-normalised.
fn reversible_mle(counts: &SparseMatrix) -> Result<SparseMatrix, MsmError> {
    let symmetric = counts.add(&counts.transpose())?;
    let c = counts.row_sums();
    let mut x = symmetric.clone();
    let mut residual = f64::INFINITY;
    for iteration in 1..=MLE_MAX_ITERATIONS {
        let q = x.row_sums();
        let ratio: Vec<f64> = c
            .iter()
            .zip(&q)
            .map(|(&ci, &qi)| if qi > 0.0 { ci / qi } else { 0.0 })
            .collect();
        let next = symmetric.map(|i, j, s| s / (ratio[i] + ratio[j]));
        let total = next.sum();
        let next = next.map(|_, _, v| v / total);

        residual = next
            .iter()
            .zip(x.iter())
            .map(|((_, _, a), (_, _, b))| (a - b).abs())
            .fold(0.0, f64::max);
        x = next;
        if residual < MLE_TOLERANCE {
            debug!(iteration, residual, "reversible estimate converged");
            return Ok(row_normalize(&x));
        }
    }
    Err(MsmError::NotConverged {
        solver: "reversible-mle",
        iterations: MLE_MAX_ITERATIONS,
        residual,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn counts() -> SparseMatrix {
        SparseMatrix::from_dense(&[
            vec![4.0, 2.0, 0.0],
            vec![1.0, 0.0, 3.0],
            vec![2.0, 1.0, 5.0],
        ])
        .unwrap()
    }

    fn assert_row_stochastic(p: &SparseMatrix) {
        for sum in p.row_sums() {
            assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-8);
        }
    }

    #[test]
    fn names_and_aliases() {
        for method in Method::ALL {
            assert_eq!(Method::from_name(method.name()).unwrap(), method);
            assert_eq!(method.to_string().parse::<Method>().unwrap(), method);
        }
        assert_eq!(Method::from_name("normalize").unwrap(), Method::MaximumLikelihood);
        assert_eq!(Method::from_name("mle").unwrap(), Method::ReversibleMle);
        assert!(matches!(
            Method::from_name("bayesian"),
            Err(MsmError::UnknownMethod { .. })
        ));
    }

    #[test]
    fn serde_uses_registry_names() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            method: Method,
        }
        let text = toml::to_string(&Wrapper {
            method: Method::ReversibleMle,
        })
        .unwrap();
        assert!(text.contains("\"reversible-mle\""));
        let parsed: Wrapper = toml::from_str("method = \"normalize\"").unwrap();
        assert_eq!(parsed.method, Method::MaximumLikelihood);
    }

    #[test]
    fn maximum_likelihood_rows() {
        let p = Method::MaximumLikelihood.normalize(&counts()).unwrap();
        assert_row_stochastic(&p);
        assert_abs_diff_eq!(p.get(0, 0), 4.0 / 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.get(2, 2), 5.0 / 8.0, epsilon = 1e-12);
        assert_eq!(p.nnz(), counts().nnz());
    }

    #[test]
    fn zero_rows_stay_zero() {
        let c = SparseMatrix::from_dense(&[vec![1.0, 1.0], vec![0.0, 0.0]]).unwrap();
        let p = Method::MaximumLikelihood.normalize(&c).unwrap();
        assert_eq!(p.row_sums(), vec![1.0, 0.0]);
        assert_eq!(p.row(1).count(), 0);
    }

    #[test]
    fn transpose_satisfies_detailed_balance() {
        let p = Method::Transpose.normalize(&counts()).unwrap();
        assert_row_stochastic(&p);
        // stationary distribution is proportional to the symmetric row sums
        let sym = counts().add(&counts().transpose()).unwrap();
        let pi: Vec<f64> = sym.row_sums();
        for (i, j, pij) in p.iter() {
            assert_abs_diff_eq!(pi[i] * pij, pi[j] * p.get(j, i), epsilon = 1e-10);
        }
    }

    #[test]
    fn reversible_mle_is_reversible() {
        let p = Method::ReversibleMle.normalize(&counts()).unwrap();
        assert_row_stochastic(&p);
        let pi = crate::equilibrium::eq_probs(&p).unwrap();
        for (i, j, pij) in p.iter() {
            assert_abs_diff_eq!(pi[i] * pij, pi[j] * p.get(j, i), epsilon = 1e-7);
        }
    }

    #[test]
    fn reversible_mle_of_symmetric_counts_is_row_normalisation() {
        let c = SparseMatrix::from_dense(&[vec![2.0, 1.0], vec![1.0, 4.0]]).unwrap();
        let mle = Method::ReversibleMle.normalize(&c).unwrap();
        let ml = Method::MaximumLikelihood.normalize(&c).unwrap();
        assert!(mle.approx_eq(&ml, 1e-6, 1e-8));
    }

    #[test]
    fn negative_counts_rejected() {
        let c = SparseMatrix::from_dense(&[vec![1.0, -1.0], vec![1.0, 1.0]]).unwrap();
        assert!(matches!(
            Method::MaximumLikelihood.normalize(&c),
            Err(MsmError::InvalidValue { row: 0, col: 1, .. })
        ));
    }
}
