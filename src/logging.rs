//! Logging configuration for askdb.
//!
//! Logs go to stderr so stdout carries only query results.

use tracing_subscriber::EnvFilter;

/// Returns the filter directive used when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Initializes logging to stderr.
///
/// `RUST_LOG` takes precedence; otherwise `--verbose` selects `debug` and the
/// default is `info`. Safe to call more than once: later calls are ignored.
pub fn init_stderr_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
