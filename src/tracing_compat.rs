//! Optional `tracing` integration.
//!
//! With the `tracing-integration` feature enabled this module re-exports the
//! `tracing` event macros. Without it, macros of the same names expand to
//! nothing and their arguments are never evaluated, so call sites compile
//! identically either way.

#[cfg(feature = "tracing-integration")]
pub use tracing::{debug, error, info, trace, warn};

#[cfg(not(feature = "tracing-integration"))]
mod noop {
    macro_rules! noop_trace {
        ($($arg:tt)*) => {};
    }
    macro_rules! noop_debug {
        ($($arg:tt)*) => {};
    }
    macro_rules! noop_info {
        ($($arg:tt)*) => {};
    }
    macro_rules! noop_warn {
        ($($arg:tt)*) => {};
    }
    macro_rules! noop_error {
        ($($arg:tt)*) => {};
    }

    #[allow(unused_imports)]
    pub(crate) use {
        noop_debug as debug, noop_error as error, noop_info as info, noop_trace as trace,
        noop_warn as warn,
    };
}

#[cfg(not(feature = "tracing-integration"))]
#[allow(unused_imports)]
pub(crate) use noop::{debug, error, info, trace, warn};
