//! Restriction of a count matrix to its largest strongly connected set.

use std::collections::BTreeMap;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, info};

use crate::error::MsmError;
use crate::sparse::SparseMatrix;

/// Bijection between original state indices and a contiguous trimmed index
/// space `0..len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimMapping {
    to_original: Vec<usize>,
    to_trimmed: BTreeMap<usize, usize>,
}

impl TrimMapping {
    /// The identity mapping over `n_states` states.
    pub fn identity(n_states: usize) -> Self {
        Self::from_originals((0..n_states).collect())
    }

    fn from_originals(to_original: Vec<usize>) -> Self {
        let to_trimmed = to_original
            .iter()
            .enumerate()
            .map(|(trimmed, &original)| (original, trimmed))
            .collect();
        Self {
            to_original,
            to_trimmed,
        }
    }

    /// Builds a mapping from `(original, trimmed)` pairs in any order.
    ///
    /// # Errors
    ///
    /// Returns [`MsmError::InvalidMapping`] unless the trimmed indices are
    /// exactly `0..pairs.len()` and no original index repeats.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, MsmError>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut by_trimmed: BTreeMap<usize, usize> = BTreeMap::new();
        for (original, trimmed) in pairs {
            if by_trimmed.insert(trimmed, original).is_some() {
                return Err(MsmError::InvalidMapping {
                    reason: format!("trimmed index {trimmed} appears twice"),
                });
            }
        }
        for (expected, &trimmed) in by_trimmed.keys().enumerate() {
            if expected != trimmed {
                return Err(MsmError::InvalidMapping {
                    reason: format!("trimmed indices are not contiguous: missing {expected}"),
                });
            }
        }
        let mapping = Self::from_originals(by_trimmed.into_values().collect());
        if mapping.to_trimmed.len() != mapping.to_original.len() {
            return Err(MsmError::InvalidMapping {
                reason: "an original index appears twice".to_string(),
            });
        }
        Ok(mapping)
    }

    /// Number of retained states.
    pub fn len(&self) -> usize {
        self.to_original.len()
    }

    /// Returns `true` if no state is retained.
    pub fn is_empty(&self) -> bool {
        self.to_original.is_empty()
    }

    /// Original index of a trimmed state.
    pub fn original(&self, trimmed: usize) -> Option<usize> {
        self.to_original.get(trimmed).copied()
    }

    /// Trimmed index of an original state, `None` if it was discarded.
    pub fn trimmed(&self, original: usize) -> Option<usize> {
        self.to_trimmed.get(&original).copied()
    }

    /// Original indices in trimmed order.
    pub fn originals(&self) -> &[usize] {
        &self.to_original
    }

    /// Iterates over `(original, trimmed)` pairs in trimmed order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.to_original
            .iter()
            .enumerate()
            .map(|(trimmed, &original)| (original, trimmed))
    }
}

/// Restricts `counts` to its largest strongly connected component.
///
/// States are vertices and every non-zero off-diagonal count is a directed
/// edge. Among components of equal size, the one containing the smallest
/// original index wins. The retained states keep their original order.
///
/// # Errors
///
/// Returns [`MsmError::NotSquare`] for a non-square matrix and
/// [`MsmError::EmptyData`] for a `0x0` matrix.
pub fn trim_disconnected(counts: &SparseMatrix) -> Result<(TrimMapping, SparseMatrix), MsmError> {
    if !counts.is_square() {
        return Err(MsmError::NotSquare {
            n_rows: counts.n_rows(),
            n_cols: counts.n_cols(),
        });
    }
    let n = counts.n_rows();
    if n == 0 {
        return Err(MsmError::EmptyData);
    }

    let mut graph = DiGraph::<(), ()>::with_capacity(n, counts.nnz());
    for _ in 0..n {
        graph.add_node(());
    }
    for (i, j, _) in counts.iter() {
        if i != j {
            graph.add_edge(NodeIndex::new(i), NodeIndex::new(j), ());
        }
    }

    let components = tarjan_scc(&graph);
    debug!(n_components = components.len(), "strongly connected components");
    let mut best: Vec<usize> = Vec::new();
    for component in components {
        let mut states: Vec<usize> = component.into_iter().map(NodeIndex::index).collect();
        states.sort_unstable();
        if states.len() > best.len() || (states.len() == best.len() && states[0] < best[0]) {
            best = states;
        }
    }

    info!(
        n_states = n,
        n_retained = best.len(),
        n_discarded = n - best.len(),
        "trimmed disconnected states"
    );
    let reduced = counts.submatrix(&best);
    Ok((TrimMapping::from_originals(best), reduced))
}
