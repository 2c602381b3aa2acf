//! Tracing subscriber setup for the binary

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Noise from the HTTP stack kept at `warn` in verbose mode
const VERBOSE_DIRECTIVE: &str = "debug,hyper=warn,hyper_util=warn,reqwest=warn,warp=warn";

/// Pick the filter: `--verbose`, then `RUST_LOG`, then the configured fallback
#[must_use]
pub fn filter(verbose: bool, fallback: &str) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_DIRECTIVE)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
    }
}

/// Install the global subscriber; later calls are ignored
pub fn init(verbose: bool, fallback: &str) {
    let _ = tracing_subscriber::registry()
        .with(filter(verbose, fallback))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}
