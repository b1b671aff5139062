//! Cluster command: load trajectories, run K-Hybrid and write the results.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use mdmsm_cluster::{ClusterError, ClusterResult, KHybrid};
use mdmsm_io::{read_trajectories, write_assignments, write_centers, write_distances};
use mdmsm_metric::{Partitioned, Rmsd};

use crate::cli::ClusterArgs;
use crate::config::MdmsmConfig;
use crate::convert;

/// Run the clustering pipeline.
pub fn run(args: ClusterArgs) -> Result<()> {
    let _cmd = info_span!("cluster").entered();

    // 1. Load config, then let CLI flags override it
    let mut config = MdmsmConfig::load(args.config.as_deref())?;
    apply_overrides(&mut config, &args);

    // 2. Build crate configs
    let algorithm = convert::parse_algorithm(&config.cluster.algorithm)?;
    let khybrid_cfg = convert::build_khybrid_config(&config.cluster)?;
    let load_cfg = convert::build_load_config(&config.io)?;
    let writer_cfg = convert::build_writer_config(&config.io)?;
    let output_dir = config.io.output.clone().unwrap_or_else(|| PathBuf::from("."));

    // 3. Load every trajectory into one coordinate array
    info!(
        n_trajectories = args.trajectories.len(),
        processes = ?config.io.processes,
        "loading trajectories"
    );
    let (lengths, coords) = read_trajectories(args.trajectories.as_slice(), &load_cfg)
        .context("failed to load trajectories")?;
    info!(
        n_frames = coords.n_frames(),
        n_atoms = coords.n_atoms(),
        "loading finished"
    );

    // 4. Cluster
    let metric = Partitioned::new(Rmsd::new().with_superpose(config.cluster.superpose))
        .with_partitions_opt(config.cluster.partitions);
    let khybrid = KHybrid::new(metric, khybrid_cfg);
    let pool = build_pool(config.io.processes)?;
    let result = recover_partial(pool.install(|| khybrid.fit(&coords)))?;

    // 5. Split the flat result back into trajectories
    let partitioned = result
        .partition(&lengths)
        .context("failed to partition clustering result")?;

    // 6. Write outputs
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create output directory: {}", output_dir.display()))?;
    let stub = convert::output_stub(
        &output_dir,
        &config.io.output_tag,
        algorithm,
        khybrid.config().cluster_radius(),
    );

    let distances_path = convert::output_path(&stub, "distances");
    write_distances(&distances_path, partitioned.distances(), &writer_cfg)
        .with_context(|| format!("failed to write {}", distances_path.display()))?;

    let assignments_path = convert::output_path(&stub, "assignments");
    write_assignments(&assignments_path, partitioned.assignments(), &writer_cfg)
        .with_context(|| format!("failed to write {}", assignments_path.display()))?;

    let centers_path = convert::output_path(&stub, "centers");
    let center_coords = coords.select(result.center_indices())?;
    write_centers(
        &centers_path,
        partitioned.center_indices(),
        &center_coords,
        &writer_cfg,
    )
    .with_context(|| format!("failed to write {}", centers_path.display()))?;

    info!(
        n_frames = result.n_frames(),
        n_clusters = result.n_clusters(),
        runtime_s = result.runtime(),
        converged = result.converged(),
        stub = %stub.display(),
        "clustering complete"
    );
    Ok(())
}

/// Copies every flag the user passed over the matching config field.
fn apply_overrides(config: &mut MdmsmConfig, args: &ClusterArgs) {
    config.cluster.rmsd_cutoff = Some(args.rmsd_cutoff);
    if let Some(ref algorithm) = args.algorithm {
        config.cluster.algorithm = algorithm.clone();
    }
    if let Some(partitions) = args.partitions {
        config.cluster.partitions = Some(partitions);
    }
    if let Some(ref atoms) = args.atoms {
        config.io.atoms = atoms.clone();
    }
    if let Some(processes) = args.processes {
        config.io.processes = Some(processes);
    }
    if let Some(subsample) = args.subsample {
        config.io.subsample = subsample;
    }
    if let Some(ref output) = args.output {
        config.io.output = Some(output.clone());
    }
    if let Some(ref tag) = args.output_tag {
        config.io.output_tag = tag.clone();
    }
}

/// Builds the worker pool the distance kernels run on.
fn build_pool(processes: Option<usize>) -> Result<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = processes {
        builder = builder.num_threads(n);
    }
    builder.build().context("failed to build thread pool")
}

/// Keeps the last committed clustering when a distance evaluation fails
/// part-way through.
fn recover_partial(fit: Result<ClusterResult, ClusterError>) -> Result<ClusterResult> {
    match fit {
        Ok(result) => Ok(result),
        Err(e @ ClusterError::RecoverableComputation { .. }) => {
            warn!(error = %e, "clustering interrupted; writing the partial result");
            e.into_partial().context("recoverable error without a partial result")
        }
        Err(e) => Err(e).context("clustering failed"),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use clap::Parser;

    use super::*;
    use crate::cli::{Cli, Command};

    fn cluster_args(extra: &[&str]) -> ClusterArgs {
        let mut argv = vec![
            "mdmsm",
            "cluster",
            "--trajectories",
            "a.parquet",
            "--rmsd-cutoff",
            "0.3",
        ];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Command::Cluster(args) => args,
            Command::Msm(_) => panic!("expected cluster subcommand"),
        }
    }

    #[test]
    fn flags_override_config() {
        let mut config = MdmsmConfig::default();
        config.io.subsample = 4;
        let args = cluster_args(&["--subsample", "2", "--output-tag", "run1", "--atoms", "CA"]);
        apply_overrides(&mut config, &args);
        assert_eq!(config.cluster.rmsd_cutoff, Some(0.3));
        assert_eq!(config.io.subsample, 2);
        assert_eq!(config.io.output_tag, "run1");
        assert_eq!(config.io.atoms, vec!["CA"]);
    }

    #[test]
    fn absent_flags_keep_config() {
        let mut config = MdmsmConfig::default();
        config.io.output = Some(Path::new("results").to_path_buf());
        config.cluster.partitions = Some(3);
        apply_overrides(&mut config, &cluster_args(&[]));
        assert_eq!(config.io.output.as_deref(), Some(Path::new("results")));
        assert_eq!(config.cluster.partitions, Some(3));
        assert_eq!(config.io.subsample, 10);
    }

    #[test]
    fn unrecoverable_errors_propagate() {
        let err = ClusterError::InvalidMaxCenters { max_centers: 0 };
        assert!(recover_partial(Err(err)).is_err());
    }

    #[test]
    fn pool_size_follows_processes() {
        let pool = build_pool(Some(2)).unwrap();
        assert_eq!(pool.current_num_threads(), 2);
    }
}
