//! Tracing subscriber setup.
//!
//! Logs go to stderr so that CLI output on stdout stays machine-readable.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "interview_coach=info,actix_web=info,warn";

/// Filter used when `--verbose` is passed.
pub const VERBOSE_FILTER: &str = "interview_coach=debug,actix_web=info,info";

/// Builds the filter from `RUST_LOG`, falling back to the defaults above.
#[must_use]
pub fn env_filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Installs the global subscriber.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
