//! High-level Parquet writer configuration and the output tables.

use std::path::Path;

use arrow::datatypes::DataType;
use mdmsm_metric::Coordinates;
use parquet::file::properties::WriterProperties;
use tracing::debug;

use crate::error::IoError;
use crate::parquet_write;

/// Compression algorithm for Parquet output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    /// No compression.
    None,
    /// Snappy compression (fast, moderate ratio).
    #[default]
    Snappy,
    /// Zstd compression (slower, better ratio).
    Zstd,
}

impl Compression {
    fn to_parquet(self) -> Result<parquet::basic::Compression, IoError> {
        Ok(match self {
            Self::None => parquet::basic::Compression::UNCOMPRESSED,
            Self::Snappy => parquet::basic::Compression::SNAPPY,
            Self::Zstd => {
                let level = parquet::basic::ZstdLevel::try_new(3)?;
                parquet::basic::Compression::ZSTD(level)
            }
        })
    }
}

/// Configuration for writing Parquet tables.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    compression: Compression,
    row_group_size: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            row_group_size: 1_000_000,
        }
    }
}

impl WriterConfig {
    /// Sets the compression algorithm.
    pub fn with_compression(mut self, comp: Compression) -> Self {
        self.compression = comp;
        self
    }

    /// Sets the maximum number of rows per row group.
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Returns the compression algorithm.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Returns the row group size.
    pub fn row_group_size(&self) -> usize {
        self.row_group_size
    }

    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Validation`] if `row_group_size` is zero.
    pub fn validate(&self) -> Result<(), IoError> {
        if self.row_group_size == 0 {
            return Err(IoError::Validation {
                count: 1,
                details: "row_group_size must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    fn properties(&self) -> Result<WriterProperties, IoError> {
        self.validate()?;
        Ok(WriterProperties::builder()
            .set_compression(self.compression.to_parquet()?)
            .set_max_row_group_size(self.row_group_size)
            .build())
    }
}

/// Writes per-trajectory cluster assignments as a
/// `(trajectory, frame, value: UInt32)` table.
///
/// # Errors
///
/// Returns [`IoError::Validation`] for an invalid configuration or an id that
/// does not fit in `UInt32`, and [`IoError::Parquet`] on write failures.
pub fn write_assignments(
    path: &Path,
    assignments: &[Vec<usize>],
    config: &WriterConfig,
) -> Result<(), IoError> {
    let props = config.properties()?;
    let schema = parquet_write::per_frame_schema(DataType::UInt32);
    let batch = parquet_write::assignments_to_record_batch(assignments, &schema)?;
    parquet_write::write_batches(path, &[batch], &schema, props)?;
    debug!(path = %path.display(), n_trajectories = assignments.len(), "wrote assignments");
    Ok(())
}

/// Writes per-trajectory distances as a `(trajectory, frame, value: Float64)`
/// table.
pub fn write_distances(
    path: &Path,
    distances: &[Vec<f64>],
    config: &WriterConfig,
) -> Result<(), IoError> {
    let props = config.properties()?;
    let schema = parquet_write::per_frame_schema(DataType::Float64);
    let batch = parquet_write::distances_to_record_batch(distances, &schema)?;
    parquet_write::write_batches(path, &[batch], &schema, props)?;
    debug!(path = %path.display(), n_trajectories = distances.len(), "wrote distances");
    Ok(())
}

/// Writes cluster centers as a `(center, trajectory, frame, atom, x, y, z)`
/// table, where frame `c` of `center_coords` is the structure of center `c`.
pub fn write_centers(
    path: &Path,
    center_indices: &[(usize, usize)],
    center_coords: &Coordinates,
    config: &WriterConfig,
) -> Result<(), IoError> {
    let props = config.properties()?;
    let schema = parquet_write::centers_schema();
    let batch = parquet_write::centers_to_record_batch(center_indices, center_coords, &schema)?;
    parquet_write::write_batches(path, &[batch], &schema, props)?;
    debug!(path = %path.display(), n_centers = center_indices.len(), "wrote centers");
    Ok(())
}

/// Writes coordinates as a trajectory table readable by
/// [`read_trajectory`](crate::read_trajectory).
///
/// `names` holds one atom name per atom.
pub fn write_trajectory(
    path: &Path,
    coords: &Coordinates,
    names: &[String],
    config: &WriterConfig,
) -> Result<(), IoError> {
    let props = config.properties()?;
    let schema = parquet_write::trajectory_schema();
    let batch = parquet_write::trajectory_to_record_batch(coords, names, &schema)?;
    parquet_write::write_batches(path, &[batch], &schema, props)?;
    debug!(path = %path.display(), n_frames = coords.n_frames(), "wrote trajectory");
    Ok(())
}
