//! Error types for the mdmsm-msm crate.

use std::path::PathBuf;

/// Error type for all fallible operations in the mdmsm-msm crate.
#[derive(Debug, thiserror::Error)]
pub enum MsmError {
    /// Returned when no state is observed in any assignment sequence.
    #[error("assignment sequences contain no states")]
    EmptyData,

    /// Returned when the lag time is zero.
    #[error("lag time must be >= 1, got {lag_time}")]
    InvalidLagTime {
        /// The invalid lag time.
        lag_time: usize,
    },

    /// Returned when a matrix that must be square is not.
    #[error("matrix must be square, got {n_rows}x{n_cols}")]
    NotSquare {
        /// Number of rows.
        n_rows: usize,
        /// Number of columns.
        n_cols: usize,
    },

    /// Returned when a matrix entry lies outside the declared shape.
    #[error("entry ({row}, {col}) outside {n_rows}x{n_cols} matrix")]
    IndexOutOfBounds {
        /// Row of the entry.
        row: usize,
        /// Column of the entry.
        col: usize,
        /// Number of rows.
        n_rows: usize,
        /// Number of columns.
        n_cols: usize,
    },

    /// Returned when a matrix value is NaN, infinite or negative where
    /// non-negative finite values are required.
    #[error("invalid matrix value {value} at ({row}, {col})")]
    InvalidValue {
        /// Row of the entry.
        row: usize,
        /// Column of the entry.
        col: usize,
        /// The offending value.
        value: f64,
    },

    /// Returned when an estimator name is not in the registry.
    #[error("unknown estimation method: {name:?}")]
    UnknownMethod {
        /// The requested name.
        name: String,
    },

    /// Returned when a trim mapping is not a bijection.
    #[error("invalid trim mapping: {reason}")]
    InvalidMapping {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when an iterative solver does not reach its tolerance.
    #[error("{solver} did not converge after {iterations} iterations (residual {residual:e})")]
    NotConverged {
        /// Name of the solver.
        solver: &'static str,
        /// Iterations performed.
        iterations: usize,
        /// Final residual.
        residual: f64,
    },

    /// Returned when the probability matrix carries no probability mass or
    /// has no non-negative dominant eigenvector.
    #[error("transition matrix has no stationary distribution")]
    NoStationaryDistribution,

    /// Returned when a computed stationary distribution does not satisfy
    /// `pi P = lambda pi` within the tolerance.
    #[error("stationary distribution residual {residual:e} exceeds tolerance {tolerance:e}")]
    EquilibriumResidual {
        /// Largest component of `|pi P - lambda pi|`.
        residual: f64,
        /// The admissible bound.
        tolerance: f64,
    },

    /// Returned when a load path is not a directory.
    #[error("not a directory: {} (archive loading is not supported)", path.display())]
    NotADirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// Returned when saving over an existing path without `force`.
    #[error("path already exists: {}", path.display())]
    AlreadyExists {
        /// The offending path.
        path: PathBuf,
    },

    /// Returned for features that are deliberately not implemented.
    #[error("unsupported: {feature}")]
    Unsupported {
        /// The requested feature.
        feature: &'static str,
    },

    /// Returned when a manifest lacks a required artifact or lists only some
    /// of the fit artifacts.
    #[error("inconsistent model directory: {reason}")]
    InconsistentArtifacts {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when an artifact file cannot be parsed.
    #[error("failed to parse {artifact}: {reason}")]
    Parse {
        /// Logical artifact name.
        artifact: &'static str,
        /// Description of the problem.
        reason: String,
    },

    /// Wraps filesystem errors.
    #[error("io error: {reason}")]
    Io {
        /// Description of the underlying I/O failure.
        reason: String,
    },
}

impl From<std::io::Error> for MsmError {
    fn from(e: std::io::Error) -> Self {
        MsmError::Io {
            reason: e.to_string(),
        }
    }
}
