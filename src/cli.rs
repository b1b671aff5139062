use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Conformational clustering and Markov state models for MD trajectories.
#[derive(Parser)]
#[command(
    name = "mdmsm",
    version,
    about = "Conformational clustering and Markov state models for MD trajectories"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Cluster trajectory frames by RMSD and write assignments, distances and centers.
    Cluster(ClusterArgs),
    /// Build a Markov state model from cluster assignments and save it.
    Msm(MsmArgs),
}

/// Arguments for the `cluster` subcommand.
#[derive(clap::Args)]
pub struct ClusterArgs {
    /// Trajectory Parquet tables to cluster.
    #[arg(short, long, required = true, num_args = 1..)]
    pub trajectories: Vec<PathBuf>,

    /// Atom names to cluster on (comma separated).
    #[arg(long, value_delimiter = ',')]
    pub atoms: Option<Vec<String>>,

    /// Clustering algorithm.
    #[arg(short, long)]
    pub algorithm: Option<String>,

    /// RMSD cutoff (nm) bounding the cluster radius.
    #[arg(long = "rmsd-cutoff")]
    pub rmsd_cutoff: f64,

    /// Threads used for loading and clustering.
    #[arg(short, long)]
    pub processes: Option<usize>,

    /// Split each distance evaluation into this many frame blocks.
    #[arg(long)]
    pub partitions: Option<usize>,

    /// Keep every n-th frame (1 keeps all).
    #[arg(short, long)]
    pub subsample: Option<usize>,

    /// Output directory.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// String prepended to output file names.
    #[arg(long = "output-tag")]
    pub output_tag: Option<String>,

    /// Path to TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Arguments for the `msm` subcommand.
#[derive(clap::Args)]
pub struct MsmArgs {
    /// Assignments Parquet table written by `cluster`.
    #[arg(short, long)]
    pub assignments: PathBuf,

    /// Lag time in frames.
    #[arg(short, long = "lag-time")]
    pub lag_time: Option<usize>,

    /// Probability estimator (maximum-likelihood, transpose, reversible-mle).
    #[arg(short, long)]
    pub method: Option<String>,

    /// Restrict the model to its largest strongly connected set of states.
    #[arg(long)]
    pub trim: bool,

    /// Count only non-overlapping windows.
    #[arg(long = "no-sliding-window")]
    pub no_sliding_window: bool,

    /// Directory to save the model to.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Replace an existing model directory.
    #[arg(short, long)]
    pub force: bool,

    /// Path to TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
