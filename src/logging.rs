use std::io;

use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

impl Verbosity {
    /// `--quiet` wins over `--verbose`.
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }
}

/// Picks the filter directive: flags first, then `RUST_LOG`, then the
/// configured level.
pub fn filter_for(verbosity: Verbosity, configured_level: &str) -> EnvFilter {
    match verbosity {
        Verbosity::Quiet => EnvFilter::new("off"),
        Verbosity::Verbose => EnvFilter::new("debug"),
        Verbosity::Normal => EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::try_new(configured_level).unwrap_or_else(|_| EnvFilter::new("info"))
        }),
    }
}

/// Installs the global subscriber. Diagnostics go to stderr; stdout is kept
/// for command output.
pub fn init_tracing(verbosity: Verbosity, configured_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_for(verbosity, configured_level))
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
