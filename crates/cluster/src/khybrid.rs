//! K-Hybrid clustering entry point.

use std::time::Instant;

use mdmsm_metric::{Coordinates, Metric};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, info_span};

use crate::config::KHybridConfig;
use crate::error::ClusterError;
use crate::kcenters::kcenters;
use crate::kmedoids::kmedoids;
use crate::result::ClusterResult;

/// K-centers seeding followed by k-medoids refinement.
///
/// The metric is any [`Metric`]; wrap it in
/// [`Partitioned`](mdmsm_metric::Partitioned) to bound the size of each
/// kernel call.
#[derive(Debug, Clone)]
pub struct KHybrid<M> {
    metric: M,
    config: KHybridConfig,
}

impl<M: Metric> KHybrid<M> {
    /// Creates a clusterer.
    pub fn new(metric: M, config: KHybridConfig) -> Self {
        Self { metric, config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &KHybridConfig {
        &self.config
    }

    /// Returns the metric.
    pub fn metric(&self) -> &M {
        &self.metric
    }

    /// Clusters every frame of `coords`.
    ///
    /// # Errors
    ///
    /// - [`ClusterError::InvalidRadius`] and friends for a bad configuration.
    /// - [`ClusterError::EmptyInput`] if `coords` has no frames.
    /// - [`ClusterError::Metric`] if the first distance evaluation fails.
    /// - [`ClusterError::RecoverableComputation`] if a later evaluation
    ///   fails; the error carries the last consistent clustering.
    pub fn fit(&self, coords: &Coordinates) -> Result<ClusterResult, ClusterError> {
        self.config.validate()?;
        if coords.is_empty() {
            return Err(ClusterError::EmptyInput);
        }

        let _span = info_span!(
            "khybrid",
            n_frames = coords.n_frames(),
            radius = self.config.cluster_radius()
        )
        .entered();
        let start = Instant::now();

        let mut state = kcenters(coords, &self.metric, &self.config, start)?;
        info!(n_centers = state.centers.len(), "k-centers seeding complete");

        let mut rng = StdRng::seed_from_u64(self.config.seed());
        let refinement = kmedoids(
            coords,
            &self.metric,
            &self.config,
            &mut state,
            &mut rng,
            start,
        )?;

        let result = state.into_result(start, refinement.n_iterations, refinement.converged);
        info!(
            n_clusters = result.n_clusters(),
            n_iterations = result.n_iterations(),
            converged = result.converged(),
            runtime = result.runtime(),
            "clustering complete"
        );
        Ok(result)
    }
}
