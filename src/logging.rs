use tracing_subscriber::EnvFilter;

/// Workspace crates whose log output is shown.
const CRATE_TARGETS: &[&str] = &[
    "mdmsm",
    "mdmsm_cluster",
    "mdmsm_io",
    "mdmsm_metric",
    "mdmsm_msm",
];

/// Maps the `-v` count to a tracing level: none is warn, then info, debug
/// and trace.
fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Builds the `target=level` directive list for every workspace crate.
fn default_directives(verbosity: u8) -> String {
    let level = level_for(verbosity);
    CRATE_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Installs the global subscriber. Logs go to stderr; `RUST_LOG` wins over
/// the verbosity flag when set.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
