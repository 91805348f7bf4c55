//! Diagnostic tracing on stderr.
//!
//! Stage progress is logged at `info`, so the operator sees it by default.
//! Product output (file listing, halt report) is printed to stdout by the
//! binary and does not depend on `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`; defaults to `info`. Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=orgloop=debug orgloop run
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
