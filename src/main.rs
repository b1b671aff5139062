mod cli;
mod cluster_cmd;
mod config;
mod convert;
mod logging;
mod msm_cmd;

use std::process;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Cluster(args) => cluster_cmd::run(args),
        Command::Msm(args) => msm_cmd::run(args),
    }
}
