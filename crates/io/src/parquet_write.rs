//! Low-level Parquet column building.

use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float32Array, Float64Array, RecordBatch, StringArray, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema};
use mdmsm_metric::Coordinates;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use crate::error::IoError;

/// Converts an index to the `UInt32` used in every table.
pub(crate) fn to_u32(value: usize, what: &str) -> Result<u32, IoError> {
    u32::try_from(value).map_err(|_| IoError::Validation {
        count: 1,
        details: format!("{what} {value} does not fit in UInt32"),
    })
}

/// Schema of a trajectory table: one row per atom per frame.
pub(crate) fn trajectory_schema() -> Schema {
    Schema::new(vec![
        Field::new("frame", DataType::UInt32, false),
        Field::new("atom", DataType::UInt32, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("x", DataType::Float32, false),
        Field::new("y", DataType::Float32, false),
        Field::new("z", DataType::Float32, false),
    ])
}

/// Schema of a per-frame table with a `value` column of `value_type`.
pub(crate) fn per_frame_schema(value_type: DataType) -> Schema {
    Schema::new(vec![
        Field::new("trajectory", DataType::UInt32, false),
        Field::new("frame", DataType::UInt32, false),
        Field::new("value", value_type, false),
    ])
}

/// Schema of the cluster centers table.
pub(crate) fn centers_schema() -> Schema {
    Schema::new(vec![
        Field::new("center", DataType::UInt32, false),
        Field::new("trajectory", DataType::UInt32, false),
        Field::new("frame", DataType::UInt32, false),
        Field::new("atom", DataType::UInt32, false),
        Field::new("x", DataType::Float32, false),
        Field::new("y", DataType::Float32, false),
        Field::new("z", DataType::Float32, false),
    ])
}

fn xyz_columns(coords: &Coordinates) -> [ArrayRef; 3] {
    let view = coords.view();
    let axis = |k: usize| -> ArrayRef {
        Arc::new(Float32Array::from_iter_values(
            view.outer_iter()
                .flat_map(|frame| frame.column(k).to_vec()),
        ))
    };
    [axis(0), axis(1), axis(2)]
}

/// Converts coordinates and per-atom names into a trajectory batch.
pub(crate) fn trajectory_to_record_batch(
    coords: &Coordinates,
    names: &[String],
    schema: &Schema,
) -> Result<RecordBatch, IoError> {
    if names.len() != coords.n_atoms() {
        return Err(IoError::Validation {
            count: 1,
            details: format!(
                "{} atom names for {} atoms",
                names.len(),
                coords.n_atoms()
            ),
        });
    }
    let n_atoms = coords.n_atoms();
    let n_rows = coords.n_frames() * n_atoms;
    let mut frames = Vec::with_capacity(n_rows);
    let mut atoms = Vec::with_capacity(n_rows);
    for f in 0..coords.n_frames() {
        let f = to_u32(f, "frame")?;
        for a in 0..n_atoms {
            frames.push(f);
            atoms.push(to_u32(a, "atom")?);
        }
    }
    let name_col = StringArray::from_iter_values(
        (0..coords.n_frames())
            .flat_map(|_| names.iter().map(String::as_str))
            .collect::<Vec<_>>(),
    );
    let [x, y, z] = xyz_columns(coords);

    let columns: Vec<ArrayRef> = vec![
        Arc::new(UInt32Array::from(frames)),
        Arc::new(UInt32Array::from(atoms)),
        Arc::new(name_col),
        x,
        y,
        z,
    ];
    Ok(RecordBatch::try_new(Arc::new(schema.clone()), columns)?)
}

/// `(trajectory, frame)` columns for per-trajectory arrays of the given
/// lengths.
fn frame_index_columns(lengths: impl Iterator<Item = usize>) -> Result<[ArrayRef; 2], IoError> {
    let mut trajectory = Vec::new();
    let mut frame = Vec::new();
    for (t, len) in lengths.enumerate() {
        let t = to_u32(t, "trajectory")?;
        for f in 0..len {
            trajectory.push(t);
            frame.push(to_u32(f, "frame")?);
        }
    }
    Ok([
        Arc::new(UInt32Array::from(trajectory)),
        Arc::new(UInt32Array::from(frame)),
    ])
}

/// Converts per-trajectory cluster assignments into a batch.
pub(crate) fn assignments_to_record_batch(
    assignments: &[Vec<usize>],
    schema: &Schema,
) -> Result<RecordBatch, IoError> {
    let [trajectory, frame] = frame_index_columns(assignments.iter().map(Vec::len))?;
    let values = assignments
        .iter()
        .flatten()
        .map(|&a| to_u32(a, "cluster id"))
        .collect::<Result<Vec<_>, _>>()?;
    let columns: Vec<ArrayRef> = vec![trajectory, frame, Arc::new(UInt32Array::from(values))];
    Ok(RecordBatch::try_new(Arc::new(schema.clone()), columns)?)
}

/// Converts per-trajectory distances into a batch.
pub(crate) fn distances_to_record_batch(
    distances: &[Vec<f64>],
    schema: &Schema,
) -> Result<RecordBatch, IoError> {
    let [trajectory, frame] = frame_index_columns(distances.iter().map(Vec::len))?;
    let values = Float64Array::from_iter_values(distances.iter().flatten().copied());
    let columns: Vec<ArrayRef> = vec![trajectory, frame, Arc::new(values)];
    Ok(RecordBatch::try_new(Arc::new(schema.clone()), columns)?)
}

/// Converts center identities and their coordinates into a batch.
///
/// Frame `c` of `center_coords` holds the structure of center `c`.
pub(crate) fn centers_to_record_batch(
    center_indices: &[(usize, usize)],
    center_coords: &Coordinates,
    schema: &Schema,
) -> Result<RecordBatch, IoError> {
    if center_indices.len() != center_coords.n_frames() {
        return Err(IoError::Validation {
            count: 1,
            details: format!(
                "{} center indices for {} center structures",
                center_indices.len(),
                center_coords.n_frames()
            ),
        });
    }
    let n_atoms = center_coords.n_atoms();
    let n_rows = center_indices.len() * n_atoms;
    let mut center = Vec::with_capacity(n_rows);
    let mut trajectory = Vec::with_capacity(n_rows);
    let mut frame = Vec::with_capacity(n_rows);
    let mut atom = Vec::with_capacity(n_rows);
    for (c, &(t, f)) in center_indices.iter().enumerate() {
        let (c, t, f) = (
            to_u32(c, "center")?,
            to_u32(t, "trajectory")?,
            to_u32(f, "frame")?,
        );
        for a in 0..n_atoms {
            center.push(c);
            trajectory.push(t);
            frame.push(f);
            atom.push(to_u32(a, "atom")?);
        }
    }
    let [x, y, z] = xyz_columns(center_coords);
    let columns: Vec<ArrayRef> = vec![
        Arc::new(UInt32Array::from(center)),
        Arc::new(UInt32Array::from(trajectory)),
        Arc::new(UInt32Array::from(frame)),
        Arc::new(UInt32Array::from(atom)),
        x,
        y,
        z,
    ];
    Ok(RecordBatch::try_new(Arc::new(schema.clone()), columns)?)
}

/// Writes a sequence of [`RecordBatch`]es to a Parquet file at `path`.
///
/// # Errors
///
/// Returns [`IoError::Parquet`] if file creation, batch writing, or file
/// finalisation fails.
pub(crate) fn write_batches(
    path: &Path,
    batches: &[RecordBatch],
    schema: &Schema,
    props: WriterProperties,
) -> Result<(), IoError> {
    let file = std::fs::File::create(path).map_err(|e| IoError::Parquet {
        reason: e.to_string(),
    })?;
    let mut writer = ArrowWriter::try_new(file, Arc::new(schema.clone()), Some(props))?;

    for batch in batches {
        writer.write(batch)?;
    }

    writer.close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use arrow::array::AsArray;
    use arrow::datatypes::{Float32Type, UInt32Type};

    use super::*;

    fn coords() -> Coordinates {
        Coordinates::from_flat(
            2,
            2,
            vec![
                0.0, 1.0, 2.0, 3.0, 4.0, 5.0, //
                6.0, 7.0, 8.0, 9.0, 10.0, 11.0,
            ],
        )
        .unwrap()
    }

    #[test]
    fn schemas() {
        assert_eq!(trajectory_schema().fields().len(), 6);
        assert_eq!(per_frame_schema(DataType::UInt32).field(2).name(), "value");
        assert_eq!(centers_schema().field(0).name(), "center");
    }

    #[test]
    fn trajectory_batch_is_frame_major() {
        let names = vec!["CA".to_string(), "CB".to_string()];
        let batch = trajectory_to_record_batch(&coords(), &names, &trajectory_schema()).unwrap();
        assert_eq!(batch.num_rows(), 4);
        let frame = batch.column(0).as_primitive::<UInt32Type>();
        let atom = batch.column(1).as_primitive::<UInt32Type>();
        let x = batch.column(3).as_primitive::<Float32Type>();
        let z = batch.column(5).as_primitive::<Float32Type>();
        assert_eq!(frame.values().to_vec(), vec![0, 0, 1, 1]);
        assert_eq!(atom.values().to_vec(), vec![0, 1, 0, 1]);
        assert_eq!(x.values().to_vec(), vec![0.0, 3.0, 6.0, 9.0]);
        assert_eq!(z.values().to_vec(), vec![2.0, 5.0, 8.0, 11.0]);
        assert_eq!(batch.column(2).as_string::<i32>().value(3), "CB");
    }

    #[test]
    fn trajectory_batch_needs_one_name_per_atom() {
        let err = trajectory_to_record_batch(&coords(), &["CA".to_string()], &trajectory_schema())
            .unwrap_err();
        assert!(matches!(err, IoError::Validation { .. }));
    }

    #[test]
    fn assignments_batch_indexes_frames_per_trajectory() {
        let schema = per_frame_schema(DataType::UInt32);
        let batch = assignments_to_record_batch(&[vec![4, 5], vec![], vec![6]], &schema).unwrap();
        let trajectory = batch.column(0).as_primitive::<UInt32Type>();
        let frame = batch.column(1).as_primitive::<UInt32Type>();
        assert_eq!(trajectory.values().to_vec(), vec![0, 0, 2]);
        assert_eq!(frame.values().to_vec(), vec![0, 1, 0]);
    }

    #[test]
    fn centers_batch_repeats_ids_per_atom() {
        let batch = centers_to_record_batch(&[(0, 3), (1, 0)], &coords(), &centers_schema()).unwrap();
        assert_eq!(batch.num_rows(), 4);
        let trajectory = batch.column(1).as_primitive::<UInt32Type>();
        let frame = batch.column(2).as_primitive::<UInt32Type>();
        assert_eq!(trajectory.values().to_vec(), vec![0, 0, 1, 1]);
        assert_eq!(frame.values().to_vec(), vec![3, 3, 0, 0]);
    }

    #[test]
    fn centers_batch_checks_lengths() {
        let err = centers_to_record_batch(&[(0, 0)], &coords(), &centers_schema()).unwrap_err();
        assert!(matches!(err, IoError::Validation { .. }));
    }

    #[test]
    fn oversized_index_rejected() {
        assert!(to_u32(u32::MAX as usize, "frame").is_ok());
        assert!(usize::BITS == 32 || to_u32(usize::MAX, "frame").is_err());
    }
}
