//! Error types for mdmsm-io.

use std::path::PathBuf;

/// Error type for all fallible operations in the mdmsm-io crate.
///
/// Covers missing files, Parquet and Arrow failures, tables whose columns
/// do not match the expected layout, and coordinate data that cannot form a
/// consistent frame-by-atom array.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when a required file does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that could not be found.
        path: PathBuf,
    },

    /// Wraps an error originating from the Parquet or Arrow libraries.
    #[error("parquet error: {reason}")]
    Parquet {
        /// Description of the underlying Parquet failure.
        reason: String,
    },

    /// Returned when one or more validation checks fail.
    #[error("{count} validation error(s): {details}")]
    Validation {
        /// Number of accumulated validation failures.
        count: usize,
        /// Human-readable summary of the failures.
        details: String,
    },

    /// Returned when a required column is not present in a table.
    #[error("column '{name}' not found in {}", path.display())]
    MissingColumn {
        /// Name of the missing column.
        name: String,
        /// Path to the file that was inspected.
        path: PathBuf,
    },

    /// Returned when a column has an unexpected data type.
    #[error("column '{name}' in {} has type {got}, expected {expected}", path.display())]
    ColumnType {
        /// Name of the column.
        name: String,
        /// Expected Arrow data type.
        expected: String,
        /// Actual Arrow data type.
        got: String,
        /// Path to the file that was inspected.
        path: PathBuf,
    },

    /// Returned when trajectory rows do not form whole frames of the same atoms.
    #[error("inconsistent frames in {}: {reason}", path.display())]
    InconsistentFrames {
        /// Path to the trajectory table.
        path: PathBuf,
        /// Description of the inconsistency.
        reason: String,
    },

    /// Returned when the atom selection matches no atom of a trajectory.
    #[error("no atoms named {names:?} in {}", path.display())]
    NoAtomsSelected {
        /// Path to the trajectory table.
        path: PathBuf,
        /// The requested atom names.
        names: Vec<String>,
    },

    /// Returned when the loader thread pool cannot be built.
    #[error("thread pool error: {reason}")]
    ThreadPool {
        /// Description of the failure.
        reason: String,
    },

    /// Wraps an error from the coordinate types of mdmsm-metric.
    #[error("coordinate error: {reason}")]
    Coordinates {
        /// Description of the underlying failure.
        reason: String,
    },
}

impl From<parquet::errors::ParquetError> for IoError {
    fn from(e: parquet::errors::ParquetError) -> Self {
        IoError::Parquet {
            reason: e.to_string(),
        }
    }
}

impl From<arrow::error::ArrowError> for IoError {
    fn from(e: arrow::error::ArrowError) -> Self {
        IoError::Parquet {
            reason: e.to_string(),
        }
    }
}

impl From<mdmsm_metric::MetricError> for IoError {
    fn from(e: mdmsm_metric::MetricError) -> Self {
        IoError::Coordinates {
            reason: e.to_string(),
        }
    }
}
