//! Test-only helpers shared across `#[cfg(test)]` modules.

#![cfg(test)]

use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

/// Install a `tracing` subscriber for the current test process, once. Lets
/// `RUST_LOG=gattr_core=trace cargo test -- --nocapture` show the cache's
/// `debug!`/`trace!` spans instead of discarding them.
pub fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
