//! Pure conversion functions: TOML config structs -> crate API config types.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::config::*;

use mdmsm_cluster::{Algorithm, KHybridConfig};
use mdmsm_io::{Compression, LoadConfig, WriterConfig};
use mdmsm_msm::{Method, MsmConfig};

/// Parses a clustering algorithm name.
pub fn parse_algorithm(s: &str) -> Result<Algorithm> {
    s.parse::<Algorithm>()
        .with_context(|| format!("invalid algorithm {s:?}"))
}

/// Parses a transition probability estimator name.
pub fn parse_method(s: &str) -> Result<Method> {
    s.parse::<Method>()
        .with_context(|| format!("invalid method {s:?}"))
}

/// Parses a compression algorithm name string into the corresponding enum variant.
pub fn parse_compression(s: &str) -> Result<Compression> {
    match s.to_lowercase().as_str() {
        "none" => Ok(Compression::None),
        "snappy" => Ok(Compression::Snappy),
        "zstd" => Ok(Compression::Zstd),
        other => bail!("unknown compression: {other:?}"),
    }
}

/// Builds a [`KHybridConfig`] from the TOML cluster configuration.
///
/// `medoid_candidates = 0` searches every cluster member.
pub fn build_khybrid_config(cluster: &ClusterToml) -> Result<KHybridConfig> {
    let Some(radius) = cluster.rmsd_cutoff else {
        bail!("no RMSD cutoff: set [cluster].rmsd_cutoff in config or use --rmsd-cutoff");
    };
    let candidates = cluster.medoid_candidates.filter(|&n| n > 0);
    let cfg = KHybridConfig::new(radius)
        .with_max_centers(cluster.max_centers)
        .with_kmedoids_updates(cluster.kmedoids_updates)
        .with_medoid_candidates(candidates)
        .with_seed(cluster.seed);
    cfg.validate()?;
    Ok(cfg)
}

/// Builds a [`LoadConfig`] from the TOML I/O configuration.
pub fn build_load_config(io: &IoToml) -> Result<LoadConfig> {
    let cfg = LoadConfig::default()
        .with_atom_names(&io.atoms)
        .with_stride(io.subsample)
        .with_threads(io.processes);
    cfg.validate()?;
    Ok(cfg)
}

/// Builds a [`WriterConfig`] from the TOML I/O configuration.
pub fn build_writer_config(io: &IoToml) -> Result<WriterConfig> {
    let compression = parse_compression(&io.compression)?;
    let cfg = WriterConfig::default()
        .with_compression(compression)
        .with_row_group_size(io.row_group_size);
    cfg.validate()?;
    Ok(cfg)
}

/// Builds an [`MsmConfig`] from the TOML MSM configuration.
pub fn build_msm_config(msm: &MsmToml) -> Result<MsmConfig> {
    let cfg = MsmConfig::new(msm.lag_time)
        .with_sliding_window(msm.sliding_window)
        .with_trim(msm.trim)
        .with_method(parse_method(&msm.method)?);
    cfg.validate()?;
    Ok(cfg)
}

/// Formats a cutoff the way it appears in output file names: whole numbers
/// keep one decimal place (`1.0`), everything else uses the shortest form.
pub fn format_cutoff(cutoff: f64) -> String {
    if cutoff.fract() == 0.0 {
        format!("{cutoff:.1}")
    } else {
        format!("{cutoff}")
    }
}

/// Returns the `<dir>/<tag>-<algorithm>-<cutoff>` prefix shared by every
/// clustering output file.
pub fn output_stub(dir: &Path, tag: &str, algorithm: Algorithm, cutoff: f64) -> PathBuf {
    let name = [tag, algorithm.name(), &format_cutoff(cutoff)].join("-");
    dir.join(name)
}

/// Appends `-<suffix>.parquet` to an output stub.
pub fn output_path(stub: &Path, suffix: &str) -> PathBuf {
    let mut name = stub.as_os_str().to_owned();
    name.push(format!("-{suffix}.parquet"));
    PathBuf::from(name)
}
