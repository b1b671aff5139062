//! Output types for K-Hybrid clustering.

use crate::error::ClusterError;

/// Clustering of a concatenated coordinate array.
///
/// `assignments` and `distances` are parallel per-frame arrays;
/// `center_indices` holds the global frame index of each cluster's exemplar,
/// indexed by cluster id.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterResult {
    assignments: Vec<usize>,
    distances: Vec<f64>,
    center_indices: Vec<usize>,
    runtime: f64,
    n_iterations: usize,
    converged: bool,
}

impl ClusterResult {
    pub(crate) fn new(
        assignments: Vec<usize>,
        distances: Vec<f64>,
        center_indices: Vec<usize>,
        runtime: f64,
        n_iterations: usize,
        converged: bool,
    ) -> Self {
        debug_assert_eq!(assignments.len(), distances.len());
        Self {
            assignments,
            distances,
            center_indices,
            runtime,
            n_iterations,
            converged,
        }
    }

    /// Cluster id of every frame.
    pub fn assignments(&self) -> &[usize] {
        &self.assignments
    }

    /// Distance of every frame to its own cluster center.
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// Global frame index of each cluster center.
    pub fn center_indices(&self) -> &[usize] {
        &self.center_indices
    }

    /// Wall-clock seconds spent clustering.
    pub fn runtime(&self) -> f64 {
        self.runtime
    }

    /// Number of k-medoids iterations performed.
    pub fn n_iterations(&self) -> usize {
        self.n_iterations
    }

    /// Whether refinement stopped because nothing changed rather than at the iteration cap.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Number of clusters.
    pub fn n_clusters(&self) -> usize {
        self.center_indices.len()
    }

    /// Number of clustered frames.
    pub fn n_frames(&self) -> usize {
        self.assignments.len()
    }

    /// Splits the per-frame arrays back into one array per source trajectory.
    ///
    /// `lengths[t]` is the frame count of trajectory `t` in concatenation
    /// order. Center indices are converted to `(trajectory, frame)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::LengthsMismatch`] if the lengths do not sum to
    /// [`n_frames`](Self::n_frames).
    pub fn partition(&self, lengths: &[usize]) -> Result<PartitionedResult, ClusterError> {
        let total: usize = lengths.iter().sum();
        if total != self.n_frames() {
            return Err(ClusterError::LengthsMismatch {
                total,
                n_frames: self.n_frames(),
            });
        }

        let offsets = offsets(lengths);
        let mut assignments = Vec::with_capacity(lengths.len());
        let mut distances = Vec::with_capacity(lengths.len());
        for (&start, &len) in offsets.iter().zip(lengths) {
            assignments.push(self.assignments[start..start + len].to_vec());
            distances.push(self.distances[start..start + len].to_vec());
        }

        let center_indices = self
            .center_indices
            .iter()
            .map(|&global| locate(&offsets, lengths, global))
            .collect();

        Ok(PartitionedResult {
            lengths: lengths.to_vec(),
            assignments,
            distances,
            center_indices,
            runtime: self.runtime,
            n_iterations: self.n_iterations,
            converged: self.converged,
        })
    }
}

/// Start offset of every trajectory in the concatenated array.
fn offsets(lengths: &[usize]) -> Vec<usize> {
    lengths
        .iter()
        .scan(0usize, |acc, &len| {
            let start = *acc;
            *acc += len;
            Some(start)
        })
        .collect()
}

/// Maps a global frame index to `(trajectory, local frame)`.
///
/// Empty trajectories share their offset with the next one, so the search
/// picks the last trajectory starting at or before `global` that is non-empty.
fn locate(offsets: &[usize], lengths: &[usize], global: usize) -> (usize, usize) {
    let mut t = offsets.partition_point(|&o| o <= global).saturating_sub(1);
    while lengths[t] == 0 && t > 0 {
        t -= 1;
    }
    (t, global - offsets[t])
}

/// Clustering split into per-trajectory arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionedResult {
    lengths: Vec<usize>,
    assignments: Vec<Vec<usize>>,
    distances: Vec<Vec<f64>>,
    center_indices: Vec<(usize, usize)>,
    runtime: f64,
    n_iterations: usize,
    converged: bool,
}

impl PartitionedResult {
    /// Frame count of each trajectory.
    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    /// Per-trajectory cluster ids.
    pub fn assignments(&self) -> &[Vec<usize>] {
        &self.assignments
    }

    /// Per-trajectory distances to the assigned center.
    pub fn distances(&self) -> &[Vec<f64>] {
        &self.distances
    }

    /// `(trajectory, frame)` of each cluster center.
    pub fn center_indices(&self) -> &[(usize, usize)] {
        &self.center_indices
    }

    /// Wall-clock seconds spent clustering.
    pub fn runtime(&self) -> f64 {
        self.runtime
    }

    /// Number of clusters.
    pub fn n_clusters(&self) -> usize {
        self.center_indices.len()
    }

    /// Re-concatenates the per-trajectory arrays into a flat result.
    pub fn concatenate(&self) -> ClusterResult {
        let offsets = offsets(&self.lengths);
        ClusterResult::new(
            self.assignments.concat(),
            self.distances.concat(),
            self.center_indices
                .iter()
                .map(|&(t, f)| offsets[t] + f)
                .collect(),
            self.runtime,
            self.n_iterations,
            self.converged,
        )
    }
}
