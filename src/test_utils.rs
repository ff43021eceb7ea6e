//! Test helpers shared by unit and integration tests.

use std::sync::Once;

static INIT: Once = Once::new();

/// Installs a `tracing` subscriber that writes through the test harness.
///
/// Honors `RUST_LOG`; defaults to `spyglass=debug`. Safe to call from every
/// test, only the first call has an effect.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("spyglass=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
