//! Transition counting from discrete state trajectories.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::MsmError;
use crate::sparse::SparseMatrix;

/// Counts transitions `(s[t], s[t + lag_time])` over every trajectory.
///
/// With `sliding_window`, every start offset contributes, so a trajectory of
/// length `L` adds `L - lag_time` counts. Without it only the windows
/// starting at `0, lag_time, 2 * lag_time, ...` are counted, adding
/// `floor((L - 1) / lag_time)`. Trajectories shorter than the lag add
/// nothing.
///
/// The matrix is square with dimension `1 + max state` over all
/// trajectories, including states that never take part in a transition.
///
/// # Errors
///
/// Returns [`MsmError::InvalidLagTime`] for a zero lag and
/// [`MsmError::EmptyData`] when every trajectory is empty.
///
/// # Example
///
/// ```rust
/// use mdmsm_msm::assigns_to_counts;
///
/// let counts = assigns_to_counts(&[vec![0, 0, 1, 1, 2, 2, 0, 0]], 1, true).unwrap();
/// assert_eq!(counts.get(0, 0), 2.0);
/// assert_eq!(counts.get(2, 0), 1.0);
/// ```
pub fn assigns_to_counts<S>(
    assigns: &[S],
    lag_time: usize,
    sliding_window: bool,
) -> Result<SparseMatrix, MsmError>
where
    S: AsRef<[usize]>,
{
    if lag_time == 0 {
        return Err(MsmError::InvalidLagTime { lag_time });
    }
    let n_states = assigns
        .iter()
        .filter_map(|traj| traj.as_ref().iter().max())
        .max()
        .map(|&max| max + 1)
        .ok_or(MsmError::EmptyData)?;

    let step = if sliding_window { 1 } else { lag_time };
    let mut pairs: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    let mut total = 0_usize;
    for traj in assigns {
        let traj = traj.as_ref();
        if traj.len() <= lag_time {
            continue;
        }
        for t in (0..traj.len() - lag_time).step_by(step) {
            *pairs.entry((traj[t], traj[t + lag_time])).or_insert(0.0) += 1.0;
            total += 1;
        }
    }
    debug!(
        n_trajectories = assigns.len(),
        n_states,
        lag_time,
        sliding_window,
        transitions = total,
        "counted transitions"
    );

    SparseMatrix::from_triplets(
        n_states,
        n_states,
        pairs.into_iter().map(|((i, j), c)| (i, j, c)),
    )
}
