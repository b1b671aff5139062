//! MSM command: estimate a Markov state model from cluster assignments.

use anyhow::{Context, Result};
use tracing::{info, info_span};

use mdmsm_io::read_assignments;
use mdmsm_msm::{Msm, SaveOptions};

use crate::cli::MsmArgs;
use crate::config::MdmsmConfig;
use crate::convert;

/// Run the MSM estimation pipeline.
pub fn run(args: MsmArgs) -> Result<()> {
    let _cmd = info_span!("msm").entered();

    let mut config = MdmsmConfig::load(args.config.as_deref())?;
    apply_overrides(&mut config, &args);
    let msm_cfg = convert::build_msm_config(&config.msm)?;

    info!(path = %args.assignments.display(), "reading assignments");
    let assigns = read_assignments(&args.assignments)
        .with_context(|| format!("failed to read assignments: {}", args.assignments.display()))?;
    info!(n_trajectories = assigns.len(), "assignments loaded");

    let mut msm = Msm::new(msm_cfg).context("invalid MSM configuration")?;
    msm.fit(&assigns).context("failed to fit MSM")?;
    info!(model = %msm, "fit complete");

    msm.save(&args.output, &SaveOptions::new().with_force(args.force))
        .with_context(|| format!("failed to save MSM to {}", args.output.display()))?;
    info!(path = %args.output.display(), "model saved");
    Ok(())
}

fn apply_overrides(config: &mut MdmsmConfig, args: &MsmArgs) {
    if let Some(lag_time) = args.lag_time {
        config.msm.lag_time = lag_time;
    }
    if let Some(ref method) = args.method {
        config.msm.method = method.clone();
    }
    if args.trim {
        config.msm.trim = true;
    }
    if args.no_sliding_window {
        config.msm.sliding_window = false;
    }
}
