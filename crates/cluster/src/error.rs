//! Error types for the mdmsm-cluster crate.

use std::fmt;

use mdmsm_metric::MetricError;

use crate::result::ClusterResult;

/// Clustering phase in which a distance evaluation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Greedy farthest-point seeding.
    KCenters,
    /// Medoid refinement.
    KMedoids,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KCenters => f.write_str("k-centers"),
            Self::KMedoids => f.write_str("k-medoids"),
        }
    }
}

/// Error type for all fallible operations in the mdmsm-cluster crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClusterError {
    /// Returned when the input has no frames.
    #[error("no frames to cluster")]
    EmptyInput,

    /// Returned when the cluster radius is negative or non-finite.
    #[error("cluster radius must be finite and >= 0, got {radius}")]
    InvalidRadius {
        /// The invalid radius.
        radius: f64,
    },

    /// Returned when the center cap is zero.
    #[error("max_centers must be >= 1, got {max_centers}")]
    InvalidMaxCenters {
        /// The invalid cap.
        max_centers: usize,
    },

    /// Returned when the medoid candidate cap is zero.
    #[error("medoid_candidates must be >= 1 when set")]
    InvalidMedoidCandidates,

    /// Returned when an algorithm name is not in the registry.
    #[error("unknown clustering algorithm: {name:?}")]
    UnknownAlgorithm {
        /// The requested name.
        name: String,
    },

    /// Returned when a length vector does not sum to the frame count.
    #[error("trajectory lengths sum to {total}, but the result has {n_frames} frames")]
    LengthsMismatch {
        /// Sum of the length vector.
        total: usize,
        /// Number of frames in the result.
        n_frames: usize,
    },

    /// Returned when the metric yields NaN or a negative distance.
    #[error("invalid distance {value} between frame {frame} and reference {reference}")]
    InvalidDistance {
        /// The reference (center) frame.
        reference: usize,
        /// The frame whose distance is invalid.
        frame: usize,
        /// The offending value.
        value: f64,
    },

    /// Returned when the very first distance evaluation fails, before any
    /// assignment exists.
    #[error(transparent)]
    Metric(#[from] MetricError),

    /// Returned when a distance evaluation fails after assignments have been
    /// committed. `partial` holds the last consistent clustering.
    #[error("{phase} distance evaluation against frame {reference} failed: {source}")]
    RecoverableComputation {
        /// Phase that was running.
        phase: Phase,
        /// Reference frame of the failed evaluation.
        reference: usize,
        /// The underlying kernel error.
        #[source]
        source: MetricError,
        /// Clustering as of the last committed step.
        partial: Box<ClusterResult>,
    },
}

impl ClusterError {
    /// Returns the last consistent clustering carried by a recoverable error.
    pub fn partial(&self) -> Option<&ClusterResult> {
        match self {
            Self::RecoverableComputation { partial, .. } => Some(partial.as_ref()),
            _ => None,
        }
    }

    /// Consumes the error, returning its partial clustering if there is one.
    pub fn into_partial(self) -> Option<ClusterResult> {
        match self {
            Self::RecoverableComputation { partial, .. } => Some(*partial),
            _ => None,
        }
    }
}
