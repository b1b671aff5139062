//! K-medoids refinement of seeded centers.
//!
//! Each iteration proposes, for every cluster, the member with the lowest
//! summed distance to the other members as its new medoid, then reassigns
//! all frames to their nearest (possibly moved) center. Refinement stops
//! when no medoid moves, when reassignment changes no frame, or after
//! `kmedoids_updates` iterations. State is committed only after an
//! iteration's reassignment succeeds.

use std::time::Instant;

use mdmsm_metric::{Coordinates, Metric};
use rand::Rng;
use tracing::debug;

use crate::config::KHybridConfig;
use crate::error::{ClusterError, Phase};
use crate::kcenters::{Assignment, checked_distances};

/// Outcome of the refinement loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Refinement {
    pub n_iterations: usize,
    pub converged: bool,
}

/// Positions (into the member list) to try as the new medoid.
fn candidate_positions(n_members: usize, cap: Option<usize>, rng: &mut impl Rng) -> Vec<usize> {
    match cap {
        Some(c) if c < n_members => rand::seq::index::sample(rng, n_members, c).into_vec(),
        _ => (0..n_members).collect(),
    }
}

/// Wraps a kernel failure with the last committed state.
fn recoverable(
    err: ClusterError,
    reference: usize,
    state: &Assignment,
    start: Instant,
    n_iterations: usize,
) -> ClusterError {
    match err {
        ClusterError::Metric(source) => ClusterError::RecoverableComputation {
            phase: Phase::KMedoids,
            reference,
            source,
            partial: Box::new(state.clone().into_result(start, n_iterations, false)),
        },
        other => other,
    }
}

/// Assigns every frame to its nearest center; ties go to the lower cluster id.
///
/// Each center is forced into its own cluster. On failure returns the
/// error together with the center frame being evaluated.
fn assign_to_nearest<M: Metric>(
    coords: &Coordinates,
    metric: &M,
    centers: &[usize],
) -> Result<(Vec<usize>, Vec<f64>), (ClusterError, usize)> {
    let n = coords.n_frames();
    let mut assignments = vec![0; n];
    let mut distances = vec![f64::INFINITY; n];
    let mut self_distances = Vec::with_capacity(centers.len());

    for (k, &c) in centers.iter().enumerate() {
        let d = checked_distances(coords, metric, c).map_err(|e| (e, c))?;
        for (i, &di) in d.iter().enumerate() {
            if di < distances[i] {
                distances[i] = di;
                assignments[i] = k;
            }
        }
        self_distances.push(d[c]);
    }
    for (k, (&c, &d)) in centers.iter().zip(&self_distances).enumerate() {
        assignments[c] = k;
        distances[c] = d;
    }
    Ok((assignments, distances))
}

/// Refines `state` in place.
pub(crate) fn kmedoids<M: Metric>(
    coords: &Coordinates,
    metric: &M,
    config: &KHybridConfig,
    state: &mut Assignment,
    rng: &mut impl Rng,
    start: Instant,
) -> Result<Refinement, ClusterError> {
    let n_clusters = state.centers.len();

    for iteration in 0..config.kmedoids_updates() {
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); n_clusters];
        for (i, &a) in state.assignments.iter().enumerate() {
            members[a].push(i);
        }

        let mut centers = state.centers.clone();
        let mut moved = 0;
        for (k, cluster) in members.iter().enumerate() {
            if cluster.len() < 2 {
                continue;
            }
            let cluster_coords = coords.select(cluster)?;
            let mut best_cost: f64 = cluster.iter().map(|&i| state.distances[i]).sum();
            let mut best = centers[k];

            for pos in candidate_positions(cluster.len(), config.medoid_candidates(), rng) {
                let candidate = cluster[pos];
                if candidate == centers[k] {
                    continue;
                }
                let cost: f64 = checked_distances(&cluster_coords, metric, pos)
                    .map_err(|e| recoverable(e, candidate, state, start, iteration))?
                    .iter()
                    .sum();
                if cost < best_cost {
                    best_cost = cost;
                    best = candidate;
                }
            }
            if best != centers[k] {
                centers[k] = best;
                moved += 1;
            }
        }

        if moved == 0 {
            debug!(iteration, "no medoid moved; refinement converged");
            return Ok(Refinement {
                n_iterations: iteration,
                converged: true,
            });
        }

        let (assignments, distances) = assign_to_nearest(coords, metric, &centers)
            .map_err(|(e, c)| recoverable(e, c, state, start, iteration))?;
        let changed = assignments
            .iter()
            .zip(&state.assignments)
            .filter(|(a, b)| a != b)
            .count();

        state.centers = centers;
        state.assignments = assignments;
        state.distances = distances;
        debug!(iteration, moved, changed, "k-medoids update");

        if changed == 0 {
            return Ok(Refinement {
                n_iterations: iteration + 1,
                converged: true,
            });
        }
    }

    Ok(Refinement {
        n_iterations: config.kmedoids_updates(),
        converged: config.kmedoids_updates() == 0,
    })
}
