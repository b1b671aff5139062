//! K-Hybrid conformational clustering.
//!
//! Frames are first seeded greedily with k-centers (farthest-point
//! selection until every frame lies within the cluster radius of a center),
//! then refined with k-medoids updates that move each center to the member
//! minimising total intra-cluster distance.
//!
//! # Pipeline
//!
//! ```text
//!  ┌──────────────┐     ┌────────────────┐     ┌──────────────────┐
//!  │   kcenters   │────▶│   kmedoids     │────▶│  ClusterResult   │
//!  │  (seeding)   │     │  (refinement)  │     │  (partition)     │
//!  └──────────────┘     └────────────────┘     └──────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust
//! use mdmsm_cluster::{KHybrid, KHybridConfig};
//! use mdmsm_metric::{Coordinates, Rmsd};
//!
//! // Two single-atom "conformations" far apart, each seen twice.
//! let xyz = vec![
//!     0.0, 0.0, 0.0, 1.0, 0.0, 0.0,
//!     0.0, 0.0, 0.0, 1.0, 0.0, 0.0,
//!     0.0, 0.0, 0.0, 4.0, 0.0, 0.0,
//!     0.0, 0.0, 0.0, 4.0, 0.0, 0.0,
//! ];
//! let coords = Coordinates::from_flat(4, 2, xyz).unwrap();
//! let config = KHybridConfig::new(0.1);
//!
//! let result = KHybrid::new(Rmsd::new(), config).fit(&coords).unwrap();
//! assert_eq!(result.n_clusters(), 2);
//! assert_eq!(result.assignments(), &[0, 0, 1, 1]);
//! ```

pub mod config;
pub mod error;
pub mod khybrid;
pub mod result;

pub(crate) mod kcenters;
pub(crate) mod kmedoids;

pub use config::{Algorithm, KHybridConfig};
pub use error::{ClusterError, Phase};
pub use khybrid::KHybrid;
pub use result::{ClusterResult, PartitionedResult};
