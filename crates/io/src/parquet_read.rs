//! Low-level Parquet reading and typed column extraction.

use std::path::Path;

use arrow::array::{Array, ArrowPrimitiveType, AsArray, PrimitiveArray, RecordBatch, StringArray};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::IoError;

/// Reads all record batches from a Parquet file.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] if the file does not exist, or
/// [`IoError::Parquet`] if the file cannot be opened or read.
pub(crate) fn read_batches(path: &Path) -> Result<Vec<RecordBatch>, IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let file = std::fs::File::open(path).map_err(|e| IoError::Parquet {
        reason: e.to_string(),
    })?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let reader = builder.build()?;

    let batches: Vec<RecordBatch> = reader.collect::<Result<Vec<_>, _>>()?;
    Ok(batches)
}

fn column_by_name<'a>(
    batch: &'a RecordBatch,
    name: &str,
    path: &Path,
) -> Result<&'a dyn Array, IoError> {
    let col = batch
        .column_by_name(name)
        .ok_or_else(|| IoError::MissingColumn {
            name: name.to_string(),
            path: path.to_path_buf(),
        })?;
    if col.null_count() > 0 {
        return Err(IoError::Validation {
            count: 1,
            details: format!("column '{name}' contains {} null(s)", col.null_count()),
        });
    }
    Ok(col.as_ref())
}

fn type_error(name: &str, expected: &DataType, got: &DataType, path: &Path) -> IoError {
    IoError::ColumnType {
        name: name.to_string(),
        expected: expected.to_string(),
        got: got.to_string(),
        path: path.to_path_buf(),
    }
}

/// Returns the non-null primitive column `name` of type `T`.
///
/// # Errors
///
/// Returns [`IoError::MissingColumn`], [`IoError::ColumnType`] or
/// [`IoError::Validation`] (for nulls).
pub(crate) fn primitive_column<'a, T: ArrowPrimitiveType>(
    batch: &'a RecordBatch,
    name: &str,
    path: &Path,
) -> Result<&'a PrimitiveArray<T>, IoError> {
    let col = column_by_name(batch, name, path)?;
    col.as_primitive_opt::<T>()
        .ok_or_else(|| type_error(name, &T::DATA_TYPE, col.data_type(), path))
}

/// Returns the non-null UTF-8 column `name`.
pub(crate) fn string_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
    path: &Path,
) -> Result<&'a StringArray, IoError> {
    let col = column_by_name(batch, name, path)?;
    col.as_string_opt::<i32>()
        .ok_or_else(|| type_error(name, &DataType::Utf8, col.data_type(), path))
}
