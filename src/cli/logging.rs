//! Diagnostic logging for the binary
//!
//! Store diagnostics go through `tracing`; this installs a stderr
//! subscriber filtered by `TAGDB_LOG` (same syntax as `RUST_LOG`).

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "TAGDB_LOG";

pub fn init_logging(verbose: bool) {
    let default = if verbose { "tagdb=debug" } else { "tagdb=warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    // A subscriber may already be installed (tests); keep it
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
