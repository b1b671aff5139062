//! Trajectory tables: loading frames of atomic coordinates from Parquet.
//!
//! A trajectory table has one row per atom per frame, in frame-major order:
//!
//! | column  | type    |
//! |---------|---------|
//! | `frame` | UInt32  |
//! | `atom`  | UInt32  |
//! | `name`  | Utf8    |
//! | `x`     | Float32 |
//! | `y`     | Float32 |
//! | `z`     | Float32 |
//!
//! Every frame must list the same atoms in the same order, and frame ids
//! must increase from one frame to the next.

use std::collections::HashSet;
use std::path::Path;

use arrow::datatypes::{Float32Type, UInt32Type};
use mdmsm_metric::Coordinates;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::IoError;
use crate::parquet_read;

/// Backbone plus beta carbon, the default atom selection.
pub const DEFAULT_ATOM_NAMES: [&str; 5] = ["C", "O", "CA", "N", "CB"];

/// Configuration for loading trajectory tables.
///
/// # Example
///
/// ```
/// use mdmsm_io::LoadConfig;
///
/// let config = LoadConfig::default()
///     .with_atom_names(["CA"])
///     .with_stride(10)
///     .with_threads(Some(4));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadConfig {
    /// Atom names to keep; empty keeps every atom.
    atom_names: Vec<String>,
    /// Keep every `stride`-th frame, starting with the first.
    stride: usize,
    /// Loader threads; `None` uses one per core.
    threads: Option<usize>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            atom_names: DEFAULT_ATOM_NAMES.iter().map(|s| s.to_string()).collect(),
            stride: 1,
            threads: None,
        }
    }
}

impl LoadConfig {
    /// Sets the atom names to keep. An empty list keeps every atom.
    pub fn with_atom_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.atom_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the frame stride.
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride;
        self
    }

    /// Sets the number of loader threads.
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    /// Returns the atom names to keep.
    pub fn atom_names(&self) -> &[String] {
        &self.atom_names
    }

    /// Returns the frame stride.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the number of loader threads.
    pub fn threads(&self) -> Option<usize> {
        self.threads
    }

    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] listing every problem found.
    pub fn validate(&self) -> Result<(), IoError> {
        let mut problems = Vec::new();
        if self.stride == 0 {
            problems.push("stride must be at least 1".to_string());
        }
        if self.threads == Some(0) {
            problems.push("threads must be at least 1".to_string());
        }
        if self.atom_names.iter().any(|n| n.trim().is_empty()) {
            problems.push("atom names must not be blank".to_string());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(IoError::Validation {
                count: problems.len(),
                details: problems.join("; "),
            })
        }
    }
}

/// Rows of a trajectory table, concatenated over record batches.
struct Rows {
    frame: Vec<u32>,
    atom: Vec<u32>,
    /// Names of the rows of the first frame only.
    names: Vec<String>,
    x: Vec<f32>,
    y: Vec<f32>,
    z: Vec<f32>,
}

fn read_rows(path: &Path) -> Result<Rows, IoError> {
    let batches = parquet_read::read_batches(path)?;
    let mut rows = Rows {
        frame: Vec::new(),
        atom: Vec::new(),
        names: Vec::new(),
        x: Vec::new(),
        y: Vec::new(),
        z: Vec::new(),
    };
    for batch in &batches {
        let frame = parquet_read::primitive_column::<UInt32Type>(batch, "frame", path)?;
        let atom = parquet_read::primitive_column::<UInt32Type>(batch, "atom", path)?;
        let name = parquet_read::string_column(batch, "name", path)?;
        let x = parquet_read::primitive_column::<Float32Type>(batch, "x", path)?;
        let y = parquet_read::primitive_column::<Float32Type>(batch, "y", path)?;
        let z = parquet_read::primitive_column::<Float32Type>(batch, "z", path)?;

        let first = rows.frame.first().or(frame.values().first()).copied();
        for (i, &f) in frame.values().iter().enumerate() {
            if Some(f) == first && rows.names.len() == rows.frame.len() + i {
                rows.names.push(name.value(i).to_string());
            }
        }
        rows.frame.extend_from_slice(frame.values());
        rows.atom.extend_from_slice(atom.values());
        rows.x.extend_from_slice(x.values());
        rows.y.extend_from_slice(y.values());
        rows.z.extend_from_slice(z.values());
    }
    Ok(rows)
}

fn inconsistent(path: &Path, reason: String) -> IoError {
    IoError::InconsistentFrames {
        path: path.to_path_buf(),
        reason,
    }
}

/// Checks the frame-major layout and returns the number of atoms per frame.
fn atoms_per_frame(rows: &Rows, path: &Path) -> Result<usize, IoError> {
    let n_atoms = rows.names.len();
    if n_atoms == 0 {
        return Err(inconsistent(path, "table has no rows".to_string()));
    }
    if rows.frame.len() % n_atoms != 0 {
        return Err(inconsistent(
            path,
            format!(
                "{} rows are not a whole number of {n_atoms}-atom frames",
                rows.frame.len()
            ),
        ));
    }
    let template = &rows.atom[..n_atoms];
    let mut previous: Option<u32> = None;
    for (block, (frames, atoms)) in rows
        .frame
        .chunks_exact(n_atoms)
        .zip(rows.atom.chunks_exact(n_atoms))
        .enumerate()
    {
        let id = frames[0];
        if frames.iter().any(|&f| f != id) {
            return Err(inconsistent(
                path,
                format!("frame {block} (id {id}) does not have {n_atoms} rows"),
            ));
        }
        if previous.is_some_and(|p| p >= id) {
            return Err(inconsistent(path, format!("frame ids are not increasing at {id}")));
        }
        if atoms != template {
            return Err(inconsistent(
                path,
                format!("frame id {id} lists different atoms than the first frame"),
            ));
        }
        previous = Some(id);
    }
    Ok(n_atoms)
}

/// Loads one trajectory table, keeping the selected atoms of every
/// `stride`-th frame.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`], [`IoError::Parquet`],
/// [`IoError::MissingColumn`] or [`IoError::ColumnType`] for unreadable
/// tables, [`IoError::InconsistentFrames`] for rows that do not form whole
/// frames, and [`IoError::NoAtomsSelected`] when no atom name matches.
pub fn read_trajectory(path: &Path, config: &LoadConfig) -> Result<Coordinates, IoError> {
    config.validate()?;
    let rows = read_rows(path)?;
    let n_atoms = atoms_per_frame(&rows, path)?;

    let wanted: HashSet<&str> = config.atom_names.iter().map(String::as_str).collect();
    let selected: Vec<usize> = rows
        .names
        .iter()
        .enumerate()
        .filter(|(_, name)| wanted.is_empty() || wanted.contains(name.as_str()))
        .map(|(i, _)| i)
        .collect();
    if selected.is_empty() {
        return Err(IoError::NoAtomsSelected {
            path: path.to_path_buf(),
            names: config.atom_names.clone(),
        });
    }

    let n_total = rows.frame.len() / n_atoms;
    let kept: Vec<usize> = (0..n_total).step_by(config.stride).collect();
    let mut xyz = Vec::with_capacity(kept.len() * selected.len() * 3);
    for &block in &kept {
        for &atom in &selected {
            let r = block * n_atoms + atom;
            xyz.extend_from_slice(&[rows.x[r], rows.y[r], rows.z[r]]);
        }
    }
    debug!(
        path = %path.display(),
        n_frames = n_total,
        n_kept = kept.len(),
        n_atoms,
        n_selected = selected.len(),
        "read trajectory"
    );
    Ok(Coordinates::from_flat(kept.len(), selected.len(), xyz)?)
}

/// Loads several trajectory tables in parallel and concatenates them.
///
/// Tables are read on a dedicated pool of `config.threads()` threads.
/// Returns the number of kept frames of every trajectory together with the
/// concatenated coordinates, so the lengths sum to the total frame count.
///
/// # Errors
///
/// Returns [`IoError::Validation`] for an empty path list or invalid
/// configuration, [`IoError::ThreadPool`] if the pool cannot be built,
/// [`IoError::Coordinates`] when trajectories select different atom counts,
/// and any error of [`read_trajectory`].
pub fn read_trajectories<P>(
    paths: &[P],
    config: &LoadConfig,
) -> Result<(Vec<usize>, Coordinates), IoError>
where
    P: AsRef<Path> + Sync,
{
    config.validate()?;
    if paths.is_empty() {
        return Err(IoError::Validation {
            count: 1,
            details: "no trajectory paths given".to_string(),
        });
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads.unwrap_or(0))
        .build()
        .map_err(|e| IoError::ThreadPool {
            reason: e.to_string(),
        })?;

    let parts: Vec<Coordinates> = pool.install(|| {
        paths
            .par_iter()
            .map(|p| read_trajectory(p.as_ref(), config))
            .collect::<Result<Vec<_>, _>>()
    })?;
    let lengths: Vec<usize> = parts.iter().map(Coordinates::n_frames).collect();
    let coords = Coordinates::concatenate(&parts)?;
    info!(
        n_trajectories = lengths.len(),
        n_frames = coords.n_frames(),
        n_atoms = coords.n_atoms(),
        threads = pool.current_num_threads(),
        "loaded trajectories"
    );
    Ok((lengths, coords))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_selection() {
        let config = LoadConfig::default();
        assert_eq!(config.atom_names(), &["C", "O", "CA", "N", "CB"]);
        assert_eq!(config.stride(), 1);
        assert_eq!(config.threads(), None);
    }

    #[test]
    fn validate_collects_every_problem() {
        let config = LoadConfig::default()
            .with_stride(0)
            .with_threads(Some(0))
            .with_atom_names([" "]);
        match config.validate().unwrap_err() {
            IoError::Validation { count, .. } => assert_eq!(count, 3),
            other => panic!("unexpected error {other}"),
        }
    }

    fn rows(frame: Vec<u32>, atom: Vec<u32>, n_names: usize) -> Rows {
        let n = frame.len();
        Rows {
            frame,
            atom,
            names: vec!["CA".to_string(); n_names],
            x: vec![0.0; n],
            y: vec![0.0; n],
            z: vec![0.0; n],
        }
    }

    #[test]
    fn layout_checks() {
        let path = Path::new("t.parquet");
        let ok = rows(vec![0, 0, 5, 5], vec![0, 1, 0, 1], 2);
        assert_eq!(atoms_per_frame(&ok, path).unwrap(), 2);

        let ragged = rows(vec![0, 0, 1], vec![0, 1, 0], 2);
        assert!(atoms_per_frame(&ragged, path).is_err());

        let decreasing = rows(vec![3, 3, 1, 1], vec![0, 1, 0, 1], 2);
        assert!(atoms_per_frame(&decreasing, path).is_err());

        let reordered = rows(vec![0, 0, 1, 1], vec![0, 1, 1, 0], 2);
        assert!(atoms_per_frame(&reordered, path).is_err());

        let empty = rows(vec![], vec![], 0);
        assert!(atoms_per_frame(&empty, path).is_err());
    }
}
