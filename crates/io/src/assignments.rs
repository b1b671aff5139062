//! Reading per-frame tables back into per-trajectory arrays.

use std::collections::BTreeMap;
use std::path::Path;

use arrow::datatypes::{ArrowPrimitiveType, Float64Type, UInt32Type};

use crate::error::IoError;
use crate::parquet_read;

/// Reads a `(trajectory, frame, value)` table into one array per trajectory.
///
/// Trajectory ids without rows become empty arrays; frames of each
/// trajectory must be exactly `0..n` in any row order.
fn read_per_frame<T, V>(path: &Path, convert: impl Fn(T::Native) -> V) -> Result<Vec<Vec<V>>, IoError>
where
    T: ArrowPrimitiveType,
{
    let batches = parquet_read::read_batches(path)?;
    let mut by_traj: BTreeMap<u32, BTreeMap<u32, V>> = BTreeMap::new();
    for batch in &batches {
        let trajectory = parquet_read::primitive_column::<UInt32Type>(batch, "trajectory", path)?;
        let frame = parquet_read::primitive_column::<UInt32Type>(batch, "frame", path)?;
        let value = parquet_read::primitive_column::<T>(batch, "value", path)?;
        for ((&t, &f), &v) in trajectory
            .values()
            .iter()
            .zip(frame.values().iter())
            .zip(value.values().iter())
        {
            if by_traj.entry(t).or_default().insert(f, convert(v)).is_some() {
                return Err(IoError::Validation {
                    count: 1,
                    details: format!("trajectory {t} frame {f} appears twice"),
                });
            }
        }
    }

    let n_traj = by_traj.keys().next_back().map_or(0, |&t| t as usize + 1);
    let mut out: Vec<Vec<V>> = (0..n_traj).map(|_| Vec::new()).collect();
    for (t, frames) in by_traj {
        let n = frames.len();
        if frames.keys().next_back().is_some_and(|&last| last as usize + 1 != n) {
            return Err(IoError::Validation {
                count: 1,
                details: format!("trajectory {t} frames are not contiguous from 0"),
            });
        }
        out[t as usize] = frames.into_values().collect();
    }
    Ok(out)
}

/// Reads cluster assignments written by
/// [`write_assignments`](crate::write_assignments).
///
/// # Errors
///
/// Returns [`IoError::Validation`] for duplicate or missing frames, and the
/// errors of the underlying Parquet reader for unreadable tables.
pub fn read_assignments(path: &Path) -> Result<Vec<Vec<usize>>, IoError> {
    read_per_frame::<UInt32Type, usize>(path, |v| v as usize)
}

/// Reads distances written by [`write_distances`](crate::write_distances).
pub fn read_distances(path: &Path) -> Result<Vec<Vec<f64>>, IoError> {
    read_per_frame::<Float64Type, f64>(path, |v| v)
}
