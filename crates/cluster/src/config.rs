//! Configuration for K-Hybrid clustering.

use std::fmt;
use std::str::FromStr;

use crate::error::ClusterError;

/// Clustering algorithms known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// K-centers seeding followed by k-medoids refinement.
    KHybrid,
}

impl Algorithm {
    /// All registered algorithms.
    pub const ALL: [Algorithm; 1] = [Self::KHybrid];

    /// Returns the registry name.
    pub fn name(self) -> &'static str {
        match self {
            Self::KHybrid => "khybrid",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ClusterError::UnknownAlgorithm {
                name: s.to_string(),
            })
    }
}

/// Configuration for K-Hybrid clustering.
///
/// The cluster radius is mandatory. The center cap is always enforced: a
/// radius that is too small for the data stops seeding at `max_centers`
/// clusters instead of growing without bound.
///
/// # Example
///
/// ```
/// use mdmsm_cluster::KHybridConfig;
///
/// let config = KHybridConfig::new(0.15)
///     .with_max_centers(500)
///     .with_kmedoids_updates(3);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct KHybridConfig {
    cluster_radius: f64,
    max_centers: usize,
    kmedoids_updates: usize,
    medoid_candidates: Option<usize>,
    seed: u64,
}

impl KHybridConfig {
    /// Creates a configuration with the given cluster radius.
    ///
    /// Defaults: `max_centers = 10_000`, `kmedoids_updates = 5`,
    /// `medoid_candidates = Some(50)`, `seed = 0`.
    pub fn new(cluster_radius: f64) -> Self {
        Self {
            cluster_radius,
            max_centers: 10_000,
            kmedoids_updates: 5,
            medoid_candidates: Some(50),
            seed: 0,
        }
    }

    /// Sets the cluster radius.
    pub fn with_cluster_radius(mut self, radius: f64) -> Self {
        self.cluster_radius = radius;
        self
    }

    /// Sets the hard cap on the number of centers.
    pub fn with_max_centers(mut self, max_centers: usize) -> Self {
        self.max_centers = max_centers;
        self
    }

    /// Sets the maximum number of k-medoids refinement iterations (0 disables refinement).
    pub fn with_kmedoids_updates(mut self, updates: usize) -> Self {
        self.kmedoids_updates = updates;
        self
    }

    /// Sets how many members are tried as the new medoid of each cluster.
    ///
    /// `None` tries every member.
    pub fn with_medoid_candidates(mut self, candidates: Option<usize>) -> Self {
        self.medoid_candidates = candidates;
        self
    }

    /// Sets the RNG seed used to pick medoid candidates in large clusters.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    // --- Accessors ---

    /// Returns the cluster radius.
    pub fn cluster_radius(&self) -> f64 {
        self.cluster_radius
    }

    /// Returns the center cap.
    pub fn max_centers(&self) -> usize {
        self.max_centers
    }

    /// Returns the k-medoids iteration cap.
    pub fn kmedoids_updates(&self) -> usize {
        self.kmedoids_updates
    }

    /// Returns the per-cluster medoid candidate cap.
    pub fn medoid_candidates(&self) -> Option<usize> {
        self.medoid_candidates
    }

    /// Returns the RNG seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Validates this configuration.
    pub fn validate(&self) -> Result<(), ClusterError> {
        if !self.cluster_radius.is_finite() || self.cluster_radius < 0.0 {
            return Err(ClusterError::InvalidRadius {
                radius: self.cluster_radius,
            });
        }
        if self.max_centers == 0 {
            return Err(ClusterError::InvalidMaxCenters {
                max_centers: self.max_centers,
            });
        }
        if self.medoid_candidates == Some(0) {
            return Err(ClusterError::InvalidMedoidCandidates);
        }
        Ok(())
    }
}
