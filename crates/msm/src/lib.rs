//! Markov state models from discrete state trajectories.
//!
//! Cluster assignments are turned into a transition count matrix at a lag
//! time, optionally restricted to the largest strongly connected set of
//! states, normalised into a row-stochastic transition matrix and solved
//! for its equilibrium distribution.
//!
//! # Pipeline
//!
//! ```text
//!  ┌──────────┐   ┌──────────┐   ┌────────────┐   ┌───────────────┐
//!  │  counts  │──▶│   trim   │──▶│  builders  │──▶│  equilibrium  │
//!  │  (lag)   │   │  (SCC)   │   │ (estimate) │   │   (π = πP)    │
//!  └──────────┘   └──────────┘   └────────────┘   └───────────────┘
//!                        \____________ Msm ____________/
//! ```
//!
//! # Quick start
//!
//! ```rust
//! use mdmsm_msm::{Method, Msm, MsmConfig};
//!
//! let config = MsmConfig::new(1)
//!     .with_trim(true)
//!     .with_method(Method::MaximumLikelihood);
//! let mut msm = Msm::new(config).unwrap();
//! msm.fit(&[vec![0, 0, 1, 1, 2, 2, 0, 0]]).unwrap();
//!
//! let eq = msm.eq_probs().unwrap();
//! assert!((eq.iter().sum::<f64>() - 1.0).abs() < 1e-12);
//! ```

pub mod builders;
pub mod config;
pub mod counts;
pub mod equilibrium;
pub mod error;
pub mod msm;
pub mod persist;
pub mod sparse;
pub mod trim;

pub use builders::{Estimator, Method, row_normalize};
pub use config::MsmConfig;
pub use counts::assigns_to_counts;
pub use equilibrium::eq_probs;
pub use error::MsmError;
pub use msm::{FitResult, Msm};
pub use persist::{Artifact, Manifest, SaveOptions, StreamArtifact};
pub use sparse::SparseMatrix;
pub use trim::{TrimMapping, trim_disconnected};
