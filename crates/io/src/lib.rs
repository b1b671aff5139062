//! # mdmsm-io
//!
//! Load molecular dynamics trajectories from Parquet tables and write
//! clustering output (assignments, distances, centers) back to Parquet.
//! Bridges files into the `Coordinates` arrays of mdmsm-metric and the
//! per-trajectory arrays of mdmsm-cluster.

mod assignments;
mod error;
mod parquet_read;
mod parquet_write;
mod trajectory;
mod writer;

pub use assignments::{read_assignments, read_distances};
pub use error::IoError;
pub use trajectory::{DEFAULT_ATOM_NAMES, LoadConfig, read_trajectories, read_trajectory};
pub use writer::{
    Compression, WriterConfig, write_assignments, write_centers, write_distances,
    write_trajectory,
};
