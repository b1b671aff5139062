use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level mdmsm configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MdmsmConfig {
    /// Clustering settings.
    #[serde(default)]
    pub cluster: ClusterToml,

    /// Markov state model settings.
    #[serde(default)]
    pub msm: MsmToml,

    /// Loading and output settings.
    #[serde(default)]
    pub io: IoToml,
}

impl MdmsmConfig {
    /// Reads a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let toml_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        toml::from_str(&toml_str).context("failed to parse TOML config")
    }

    /// Reads `path` if given, otherwise returns the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::from_file)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterToml {
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    #[serde(default)]
    pub rmsd_cutoff: Option<f64>,
    #[serde(default = "default_max_centers")]
    pub max_centers: usize,
    #[serde(default = "default_kmedoids_updates")]
    pub kmedoids_updates: usize,
    #[serde(default = "default_medoid_candidates")]
    pub medoid_candidates: Option<usize>,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub partitions: Option<usize>,
    #[serde(default = "default_true")]
    pub superpose: bool,
}

impl Default for ClusterToml {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            rmsd_cutoff: None,
            max_centers: default_max_centers(),
            kmedoids_updates: default_kmedoids_updates(),
            medoid_candidates: default_medoid_candidates(),
            seed: 0,
            partitions: None,
            superpose: true,
        }
    }
}

fn default_algorithm() -> String {
    "khybrid".to_string()
}
fn default_max_centers() -> usize {
    10_000
}
fn default_kmedoids_updates() -> usize {
    5
}
fn default_medoid_candidates() -> Option<usize> {
    Some(50)
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MsmToml {
    #[serde(default = "default_lag_time")]
    pub lag_time: usize,
    #[serde(default = "default_true")]
    pub sliding_window: bool,
    #[serde(default)]
    pub trim: bool,
    #[serde(default = "default_method")]
    pub method: String,
}

impl Default for MsmToml {
    fn default() -> Self {
        Self {
            lag_time: default_lag_time(),
            sliding_window: true,
            trim: false,
            method: default_method(),
        }
    }
}

fn default_lag_time() -> usize {
    1
}
fn default_method() -> String {
    "maximum-likelihood".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IoToml {
    #[serde(default = "default_atoms")]
    pub atoms: Vec<String>,
    #[serde(default = "default_subsample")]
    pub subsample: usize,
    #[serde(default)]
    pub processes: Option<usize>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub output_tag: String,
    #[serde(default = "default_compression")]
    pub compression: String,
    #[serde(default = "default_row_group_size")]
    pub row_group_size: usize,
}

impl Default for IoToml {
    fn default() -> Self {
        Self {
            atoms: default_atoms(),
            subsample: default_subsample(),
            processes: None,
            output: None,
            output_tag: String::new(),
            compression: default_compression(),
            row_group_size: default_row_group_size(),
        }
    }
}

fn default_atoms() -> Vec<String> {
    mdmsm_io::DEFAULT_ATOM_NAMES
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_subsample() -> usize {
    10
}
fn default_compression() -> String {
    "snappy".to_string()
}
fn default_row_group_size() -> usize {
    1_000_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: MdmsmConfig = toml::from_str("").unwrap();
        assert_eq!(config.cluster.algorithm, "khybrid");
        assert_eq!(config.cluster.max_centers, 10_000);
        assert_eq!(config.msm.lag_time, 1);
        assert!(config.msm.sliding_window);
        assert_eq!(config.io.subsample, 10);
        assert_eq!(config.io.atoms, vec!["C", "O", "CA", "N", "CB"]);
    }

    #[test]
    fn sections_parse() {
        let text = r#"
            [cluster]
            rmsd_cutoff = 0.15
            partitions = 8
            medoid_candidates = 20

            [msm]
            lag_time = 10
            trim = true
            method = "transpose"

            [io]
            atoms = ["CA"]
            processes = 4
            output_tag = "villin"
        "#;
        let config: MdmsmConfig = toml::from_str(text).unwrap();
        assert_eq!(config.cluster.rmsd_cutoff, Some(0.15));
        assert_eq!(config.cluster.partitions, Some(8));
        assert_eq!(config.cluster.medoid_candidates, Some(20));
        assert_eq!(config.msm.method, "transpose");
        assert!(config.msm.trim);
        assert_eq!(config.io.processes, Some(4));
        assert_eq!(config.io.output_tag, "villin");
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(toml::from_str::<MdmsmConfig>("[cluster]\nradius = 1.0").is_err());
        assert!(toml::from_str::<MdmsmConfig>("[plot]\n").is_err());
    }
}
