//! Greedy farthest-point (k-centers) seeding.

use std::time::Instant;

use mdmsm_metric::{Coordinates, Metric};
use tracing::{debug, trace, warn};

use crate::config::KHybridConfig;
use crate::error::{ClusterError, Phase};
use crate::result::ClusterResult;

/// Mutable clustering state shared by both phases.
#[derive(Debug, Clone)]
pub(crate) struct Assignment {
    pub assignments: Vec<usize>,
    pub distances: Vec<f64>,
    pub centers: Vec<usize>,
}

impl Assignment {
    pub(crate) fn into_result(
        self,
        start: Instant,
        n_iterations: usize,
        converged: bool,
    ) -> ClusterResult {
        ClusterResult::new(
            self.assignments,
            self.distances,
            self.centers,
            start.elapsed().as_secs_f64(),
            n_iterations,
            converged,
        )
    }
}

/// Distances from every frame to `reference`, rejecting NaN and negative values.
///
/// Kernel failures are returned as [`ClusterError::Metric`] so callers can
/// upgrade them to recoverable errors once assignments exist.
pub(crate) fn checked_distances<M: Metric>(
    coords: &Coordinates,
    metric: &M,
    reference: usize,
) -> Result<Vec<f64>, ClusterError> {
    let d = metric.distances(coords.view(), coords.frame(reference))?;
    if let Some((frame, &value)) = d.iter().enumerate().find(|&(_, &v)| v.is_nan() || v < 0.0) {
        return Err(ClusterError::InvalidDistance {
            reference,
            frame,
            value,
        });
    }
    Ok(d)
}

/// Index and value of the first maximum.
fn argmax(values: &[f64]) -> (usize, f64) {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &v)| {
            if v > best.1 { (i, v) } else { best }
        })
}

/// Seeds centers starting from frame 0 until every frame lies within the
/// cluster radius of its nearest center, or the center cap is reached.
pub(crate) fn kcenters<M: Metric>(
    coords: &Coordinates,
    metric: &M,
    config: &KHybridConfig,
    start: Instant,
) -> Result<Assignment, ClusterError> {
    let n = coords.n_frames();
    let mut state = Assignment {
        assignments: vec![0; n],
        distances: vec![f64::INFINITY; n],
        centers: Vec::new(),
    };

    let mut next = 0;
    loop {
        let d = match checked_distances(coords, metric, next) {
            Ok(d) => d,
            Err(ClusterError::Metric(source)) if !state.centers.is_empty() => {
                return Err(ClusterError::RecoverableComputation {
                    phase: Phase::KCenters,
                    reference: next,
                    source,
                    partial: Box::new(state.into_result(start, 0, false)),
                });
            }
            Err(e) => return Err(e),
        };

        let k = state.centers.len();
        state.centers.push(next);
        for (i, &di) in d.iter().enumerate() {
            if di < state.distances[i] {
                state.distances[i] = di;
                state.assignments[i] = k;
            }
        }
        state.assignments[next] = k;
        state.distances[next] = d[next];

        let (far, max_distance) = argmax(&state.distances);
        trace!(center = next, n_centers = k + 1, max_distance, "added center");

        if max_distance <= config.cluster_radius() {
            debug!(n_centers = k + 1, max_distance, "all frames within cluster radius");
            break;
        }
        if state.centers.len() >= config.max_centers() {
            warn!(
                max_centers = config.max_centers(),
                max_distance,
                radius = config.cluster_radius(),
                "center cap reached before all frames were within the cluster radius"
            );
            break;
        }
        next = far;
    }

    Ok(state)
}
