//! Logging setup for the rollpack CLI.
//!
//! The level is picked in this order:
//! 1. `--verbose`: debug for rollpack crates
//! 2. `--quiet`: errors only
//! 3. `RUST_LOG`
//! 4. info for rollpack crates

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str = "rollpack_bundler=debug,rollpack_cli=debug";
const QUIET_FILTER: &str = "rollpack_bundler=error,rollpack_cli=error";
const DEFAULT_FILTER: &str = "rollpack_bundler=info,rollpack_cli=info";

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color && crate::ui::should_use_color())
        .without_time()
        .compact();

    // A subscriber may already be installed when embedded in tests
    let _ = tracing_subscriber::registry()
        .with(build_filter(verbose, quiet))
        .with(fmt_layer)
        .try_init();
}

fn build_filter(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}
