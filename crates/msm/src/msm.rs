//! The Markov state model facade.

use std::fmt;

use tracing::{info, info_span};

use crate::builders::Estimator;
use crate::config::MsmConfig;
use crate::counts::assigns_to_counts;
use crate::equilibrium::eq_probs;
use crate::error::MsmError;
use crate::sparse::SparseMatrix;
use crate::trim::{TrimMapping, trim_disconnected};

/// Relative tolerance for floating fit artifacts in [`Msm`] equality.
pub const RTOL: f64 = 1e-5;

/// Absolute tolerance for floating fit artifacts in [`Msm`] equality.
pub const ATOL: f64 = 1e-8;

/// Everything derived from the assignments by [`Msm::fit`].
///
/// The four artifacts always describe the same `n` states: counts and
/// probabilities are `n x n`, the mapping retains `n` states and the
/// equilibrium vector has length `n`.
#[derive(Debug, Clone)]
pub struct FitResult {
    tcounts: SparseMatrix,
    tprobs: SparseMatrix,
    mapping: TrimMapping,
    eq_probs: Vec<f64>,
}

impl FitResult {
    /// Bundles fit artifacts after checking that their dimensions agree.
    ///
    /// # Errors
    ///
    /// Returns [`MsmError::InconsistentArtifacts`] on any dimension
    /// mismatch.
    pub fn new(
        tcounts: SparseMatrix,
        tprobs: SparseMatrix,
        mapping: TrimMapping,
        eq_probs: Vec<f64>,
    ) -> Result<Self, MsmError> {
        let n = mapping.len();
        let expected = (n, n);
        if tcounts.shape() != expected || tprobs.shape() != expected || eq_probs.len() != n {
            return Err(MsmError::InconsistentArtifacts {
                reason: format!(
                    "mapping retains {n} states but counts are {}x{}, probabilities {}x{} \
                     and equilibrium has {} entries",
                    tcounts.n_rows(),
                    tcounts.n_cols(),
                    tprobs.n_rows(),
                    tprobs.n_cols(),
                    eq_probs.len()
                ),
            });
        }
        Ok(Self {
            tcounts,
            tprobs,
            mapping,
            eq_probs,
        })
    }

    /// Trimmed transition counts.
    pub fn tcounts(&self) -> &SparseMatrix {
        &self.tcounts
    }

    /// Transition probabilities.
    pub fn tprobs(&self) -> &SparseMatrix {
        &self.tprobs
    }

    /// Original to trimmed state mapping.
    pub fn mapping(&self) -> &TrimMapping {
        &self.mapping
    }

    /// Equilibrium probabilities.
    pub fn eq_probs(&self) -> &[f64] {
        &self.eq_probs
    }

    /// Number of states of the model.
    pub fn n_states(&self) -> usize {
        self.mapping.len()
    }
}

impl PartialEq for FitResult {
    fn eq(&self, other: &Self) -> bool {
        self.mapping == other.mapping
            && self.tcounts == other.tcounts
            && self.tprobs.approx_eq(&other.tprobs, RTOL, ATOL)
            && self.eq_probs.len() == other.eq_probs.len()
            && self
                .eq_probs
                .iter()
                .zip(&other.eq_probs)
                .all(|(a, b)| (a - b).abs() <= ATOL + RTOL * b.abs())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum FitState {
    Unfit,
    Fit(Box<FitResult>),
}

/// A Markov state model: a configuration plus, once fit, its artifacts.
///
/// # Example
///
/// ```
/// use mdmsm_msm::{Msm, MsmConfig};
///
/// let mut msm = Msm::new(MsmConfig::new(1).with_trim(true)).unwrap();
/// assert_eq!(msm.n_states(), None);
///
/// msm.fit(&[vec![0, 1, 0, 1, 2]]).unwrap();
/// assert_eq!(msm.n_states(), Some(2));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Msm {
    config: MsmConfig,
    state: FitState,
}

impl Msm {
    /// Creates an unfit model.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error found by
    /// [`MsmConfig::validate`].
    pub fn new(config: MsmConfig) -> Result<Self, MsmError> {
        config.validate()?;
        Ok(Self {
            config,
            state: FitState::Unfit,
        })
    }

    /// Creates a fit model from previously computed artifacts.
    pub fn from_fit(config: MsmConfig, fit: FitResult) -> Result<Self, MsmError> {
        config.validate()?;
        Ok(Self {
            config,
            state: FitState::Fit(Box::new(fit)),
        })
    }

    /// Counts, trims, estimates and solves for the equilibrium.
    ///
    /// Any previous fit is replaced only if every step succeeds; on error
    /// the model is left untouched.
    pub fn fit<S>(&mut self, assigns: &[S]) -> Result<(), MsmError>
    where
        S: AsRef<[usize]>,
    {
        let span = info_span!(
            "msm_fit",
            lag_time = self.config.lag_time(),
            method = %self.config.method()
        );
        let _guard = span.enter();

        let counts = assigns_to_counts(
            assigns,
            self.config.lag_time(),
            self.config.sliding_window(),
        )?;
        let (mapping, tcounts) = if self.config.trim() {
            trim_disconnected(&counts)?
        } else {
            (TrimMapping::identity(counts.n_rows()), counts)
        };
        let tprobs = self.config.method().normalize(&tcounts)?;
        let eq = eq_probs(&tprobs)?;

        let fit = FitResult::new(tcounts, tprobs, mapping, eq)?;
        info!(
            n_states = fit.n_states(),
            nnz = fit.tprobs().nnz(),
            "fit Markov state model"
        );
        self.state = FitState::Fit(Box::new(fit));
        Ok(())
    }

    /// Returns the configuration.
    pub fn config(&self) -> &MsmConfig {
        &self.config
    }

    /// Returns the fit artifacts, `None` until [`fit`](Self::fit) succeeds.
    pub fn fit_result(&self) -> Option<&FitResult> {
        match &self.state {
            FitState::Unfit => None,
            FitState::Fit(fit) => Some(fit.as_ref()),
        }
    }

    /// Returns `true` once the model has been fit.
    pub fn is_fit(&self) -> bool {
        self.fit_result().is_some()
    }

    /// Number of states, `None` when unfit.
    pub fn n_states(&self) -> Option<usize> {
        self.fit_result().map(FitResult::n_states)
    }

    /// Trimmed transition counts, `None` when unfit.
    pub fn tcounts(&self) -> Option<&SparseMatrix> {
        self.fit_result().map(FitResult::tcounts)
    }

    /// Transition probabilities, `None` when unfit.
    pub fn tprobs(&self) -> Option<&SparseMatrix> {
        self.fit_result().map(FitResult::tprobs)
    }

    /// State mapping, `None` when unfit.
    pub fn mapping(&self) -> Option<&TrimMapping> {
        self.fit_result().map(FitResult::mapping)
    }

    /// Equilibrium probabilities, `None` when unfit.
    pub fn eq_probs(&self) -> Option<&[f64]> {
        self.fit_result().map(FitResult::eq_probs)
    }
}

impl fmt::Display for Msm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MSM(lag_time={}, sliding_window={}, trim={}, method={}",
            self.config.lag_time(),
            self.config.sliding_window(),
            self.config.trim(),
            self.config.method()
        )?;
        match self.fit_result() {
            Some(fit) => write!(
                f,
                ", n_states={}, nnz={})",
                fit.n_states(),
                fit.tprobs().nnz()
            ),
            None => f.write_str(", unfit)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::builders::Method;

    fn assigns() -> Vec<Vec<usize>> {
        vec![vec![0, 0, 1, 1, 2, 2, 0, 0], vec![1, 2, 1, 0, 3]]
    }

    #[test]
    fn unfit_accessors_are_all_none() {
        let msm = Msm::new(MsmConfig::new(1)).unwrap();
        assert!(!msm.is_fit());
        assert!(msm.tcounts().is_none());
        assert!(msm.tprobs().is_none());
        assert!(msm.mapping().is_none());
        assert!(msm.eq_probs().is_none());
        assert_eq!(msm.n_states(), None);
    }

    #[test]
    fn invalid_config_rejected() {
        assert!(Msm::new(MsmConfig::new(0)).is_err());
    }

    #[test]
    fn fit_without_trim_keeps_all_states() {
        let mut msm = Msm::new(MsmConfig::new(1)).unwrap();
        msm.fit(&assigns()).unwrap();
        assert_eq!(msm.n_states(), Some(4));
        assert_eq!(msm.mapping().unwrap(), &TrimMapping::identity(4));
        // state 3 has no outgoing transitions
        let sums = msm.tprobs().unwrap().row_sums();
        assert_abs_diff_eq!(sums[0], 1.0, epsilon = 1e-12);
        assert_eq!(sums[3], 0.0);
    }

    #[test]
    fn fit_with_trim_drops_sink() {
        let mut msm = Msm::new(MsmConfig::new(1).with_trim(true)).unwrap();
        msm.fit(&assigns()).unwrap();
        assert_eq!(msm.n_states(), Some(3));
        assert_eq!(msm.mapping().unwrap().originals(), &[0, 1, 2]);
        let eq = msm.eq_probs().unwrap();
        assert_abs_diff_eq!(eq.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        let stepped = msm.tprobs().unwrap().left_mul(eq);
        for (a, b) in eq.iter().zip(&stepped) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn failed_fit_leaves_state_unchanged() {
        let mut msm = Msm::new(MsmConfig::new(1)).unwrap();
        msm.fit(&assigns()).unwrap();
        let before = msm.clone();
        let empty: Vec<Vec<usize>> = vec![vec![]];
        assert!(msm.fit(&empty).is_err());
        assert_eq!(msm, before);

        let mut unfit = Msm::new(MsmConfig::new(1)).unwrap();
        assert!(unfit.fit(&empty).is_err());
        assert!(!unfit.is_fit());
    }

    #[test]
    fn refit_replaces_everything() {
        let mut msm = Msm::new(MsmConfig::new(1)).unwrap();
        msm.fit(&assigns()).unwrap();
        msm.fit(&[vec![0, 1, 0, 1]]).unwrap();
        assert_eq!(msm.n_states(), Some(2));
        assert_eq!(msm.eq_probs().unwrap().len(), 2);
    }

    #[test]
    fn equality() {
        let config = MsmConfig::new(1).with_trim(true);
        let mut a = Msm::new(config.clone()).unwrap();
        let mut b = Msm::new(config.clone()).unwrap();
        assert_eq!(a, b);

        a.fit(&assigns()).unwrap();
        assert_ne!(a, b);
        b.fit(&assigns()).unwrap();
        assert_eq!(a, b);

        let other = Msm::new(config.with_method(Method::Transpose)).unwrap();
        assert_ne!(Msm::new(MsmConfig::new(1).with_trim(true)).unwrap(), other);
    }

    #[test]
    fn equality_tolerates_small_float_noise() {
        let mut a = Msm::new(MsmConfig::new(1)).unwrap();
        a.fit(&assigns()).unwrap();
        let fit = a.fit_result().unwrap();
        let noisy = FitResult::new(
            fit.tcounts().clone(),
            fit.tprobs().map(|_, _, v| v * (1.0 + 1e-9)),
            fit.mapping().clone(),
            fit.eq_probs().iter().map(|v| v + 1e-12).collect(),
        )
        .unwrap();
        let b = Msm::from_fit(a.config().clone(), noisy).unwrap();
        assert_eq!(a, b);

        let shifted = FitResult::new(
            fit.tcounts().map(|_, _, v| v + 1.0),
            fit.tprobs().clone(),
            fit.mapping().clone(),
            fit.eq_probs().to_vec(),
        )
        .unwrap();
        assert_ne!(a, Msm::from_fit(a.config().clone(), shifted).unwrap());
    }

    #[test]
    fn inconsistent_fit_rejected() {
        let result = FitResult::new(
            SparseMatrix::zeros(2, 2),
            SparseMatrix::zeros(2, 2),
            TrimMapping::identity(3),
            vec![0.5, 0.5],
        );
        assert!(matches!(
            result,
            Err(MsmError::InconsistentArtifacts { .. })
        ));
    }

    #[test]
    fn display() {
        let mut msm = Msm::new(MsmConfig::new(2)).unwrap();
        assert_eq!(
            msm.to_string(),
            "MSM(lag_time=2, sliding_window=true, trim=false, method=maximum-likelihood, unfit)"
        );
        msm.fit(&[vec![0, 1, 0, 1, 0, 1]]).unwrap();
        assert!(msm.to_string().ends_with("n_states=2, nnz=2)"));
    }
}
