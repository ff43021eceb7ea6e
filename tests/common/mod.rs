//! Shared helpers for the integration suites.

#![allow(dead_code)]

/// Installs a test-writer `tracing` subscriber once per test binary.
pub fn init_test_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("spyglass=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Phase tracking macro for structured test logging.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(test = $name, "=== TEST START ===");
    };
}

/// Assertion with logging for better test output.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {
        if !$cond {
            let expected = &$expected;
            let actual = &$actual;
            tracing::error!(
                message = $msg,
                expected = ?expected,
                actual = ?actual,
                "Assertion failed"
            );
        }
        assert!($cond, "{}: expected {:?}, got {:?}", $msg, $expected, $actual);
    };
}

/// Initializes logging and marks the start of `name`.
pub fn init_test(name: &str) {
    init_test_logging();
    test_phase!(name);
}
