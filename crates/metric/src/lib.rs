//! Structural distance evaluation for conformational clustering.
//!
//! This crate holds the memory-resident coordinate array, the [`Metric`]
//! seam used by the clusterer, a Kabsch-superposed [`Rmsd`] kernel and the
//! [`Partitioned`] adapter that splits large inputs into contiguous blocks.
//!
//! # Pipeline
//!
//! ```text
//!  ┌──────────────┐     ┌────────────────┐     ┌──────────────────┐
//!  │ Coordinates  │────▶│  Partitioned   │────▶│   Rmsd kernel    │
//!  │ (frames×3D)  │     │  (block split) │     │  (per block)     │
//!  └──────────────┘     └────────────────┘     └──────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust
//! use mdmsm_metric::{Coordinates, Metric, Partitioned, Rmsd};
//!
//! let xyz = vec![
//!     0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0,
//!     0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 1.0, 0.0,
//! ];
//! let coords = Coordinates::from_flat(2, 3, xyz).unwrap();
//! let metric = Partitioned::new(Rmsd::new()).with_partitions(2);
//!
//! let d = metric.distances(coords.view(), coords.frame(0)).unwrap();
//! assert_eq!(d.len(), 2);
//! assert!(d[0].abs() < 1e-6);
//! ```

pub mod coords;
pub mod error;
pub mod metric;
pub mod partition;
pub mod rmsd;

pub use coords::{Coordinates, FrameView, FramesView};
pub use error::MetricError;
pub use metric::{FnMetric, Metric, metric_fn};
pub use partition::{Partitioned, partition_bounds};
pub use rmsd::Rmsd;
