//! Logging configuration using tracing.
//!
//! Logs go to stderr so JSON reports on stdout stay machine-readable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set.
///
/// Without `--verbose` only warnings are shown, so milestone logs do not
/// interleave with the table-mode spinner on stderr.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "warn,netsweep=debug"
    } else {
        "warn"
    }
}

/// Initializes the global tracing subscriber. `RUST_LOG` overrides `verbose`.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_logging(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let fmt_layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
