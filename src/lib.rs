//! Spyglass: spy doubles with an immutable invocation ledger and causal
//! call-order queries.
//!
//! # Overview
//!
//! A spy stands in for a collaborator in a test. It records every call made
//! to it, answers each call through a bound responder, and lets the test ask
//! afterwards which calls happened, with which arguments, and in what order.
//!
//! # Core Guarantees
//!
//! - **Record before respond**: a call is in the ledger before its responder
//!   runs, even if the responder raises
//! - **Immutable history**: ledger snapshots never change; each call yields a
//!   new snapshot
//! - **Global predecessor links**: every record points at the call made just
//!   before it on any method, so strict sequences can be verified
//! - **Errors reach the caller unchanged**: a responder's error is never
//!   swallowed
//!
//! # Module Structure
//!
//! - [`value`], [`convert`]: argument and return values
//! - [`matcher`]: argument matching and built-in predicate matchers
//! - [`record`], [`clock`], [`ledger`]: invocation records and history
//! - [`reflector`]: query facade over a ledger snapshot
//! - [`causal`]: chronological and strict sequential checks
//! - [`responder`]: stub behaviors
//! - [`spy`], [`dispatch`]: spies and call dispatch
//! - [`contract`], [`proxy`]: contract descriptors and proxy generation
//! - [`config`]: layered configuration
//! - [`error`](mod@error): error types
//! - [`tracing_compat`]: optional tracing integration (requires `tracing-integration` feature)
//!
//! # Example
//!
//! ```
//! use spyglass::{Value, create_anonymous_spy, occurred_sequentially, reflector};
//! use spyglass::responder::returns_static_value;
//!
//! let spy = create_anonymous_spy([("doFoo", returns_static_value("foobar"))]);
//! assert_eq!(spy.handle("doFoo", vec![]).unwrap(), Value::from("foobar"));
//! spy.handle("doBar", vec![Value::Bool(true)]).unwrap();
//!
//! let calls = reflector(&spy);
//! assert_eq!(calls.by_name("doFoo").len(), 1);
//! assert!(occurred_sequentially!(calls.by_name("doFoo"), calls.by_name("doBar")).unwrap());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]

extern crate self as spyglass;

pub mod causal;
pub mod clock;
pub mod config;
pub mod contract;
pub mod convert;
pub mod dispatch;
pub mod error;
pub mod ledger;
pub mod matcher;
pub mod proxy;
pub mod record;
pub mod reflector;
pub mod responder;
pub mod spy;
pub mod tracing_compat;
pub mod value;

// ── Test-only modules ───────────────────────────────────────────────────
#[cfg(any(test, feature = "test-internals"))]
pub mod test_utils;

pub use causal::{occurred_chronologically, occurred_sequentially, sequential_chain};
pub use clock::{
    Clock, ClockKind, LogicalClock, ManualClock, MonotonicClock, SharedLogicalClock, Timestamp,
};
pub use config::{ConfigError, ConfigLoader, SpyglassConfig};
pub use contract::{
    ContractCatalog, ContractDescriptor, ContractKind, Finality, MethodSignature, Param, Receiver,
    Visibility,
};
pub use convert::{ConversionError, FromValue, ToValue};
pub use error::{Error, ErrorKind, Result};
pub use ledger::Ledger;
pub use matcher::{ArgMatcher, Predicate};
pub use proxy::{ProxyRegistry, ProxySpy, ProxyType, SpyContract};
pub use record::{Call, InvocationRecord, LedgerId, RecordId};
pub use reflector::{Invocations, Reflector};
pub use responder::{Responder, Returnable};
pub use spy::{Spy, SpyBuilder};
pub use value::{ObjectRef, Value};

#[doc(hidden)]
pub use proxy::__private;

#[cfg(feature = "proc-macros")]
pub use spyglass_macros::spy;

/// Creates a spy with no contract.
///
/// `responders` binds method names to responders; every other method
/// returns `Null`.
pub fn create_anonymous_spy<I, K, R>(responders: I) -> Spy
where
    I: IntoIterator<Item = (K, R)>,
    K: Into<String>,
    R: Into<Responder>,
{
    Spy::builder().responders(responders).build()
}

/// Creates a dynamic proxy for a contract registered in `registry`.
///
/// # Errors
///
/// `InvalidArgument` if `contract_name` is not registered.
pub fn create_spy_instance_of<I, K, R>(
    registry: &ProxyRegistry,
    contract_name: &str,
    responders: I,
) -> Result<ProxySpy>
where
    I: IntoIterator<Item = (K, R)>,
    K: Into<String>,
    R: Into<Responder>,
{
    registry.create_spy_instance_of(contract_name, responders)
}

/// A query facade over the spy's current ledger snapshot.
#[must_use]
pub fn reflector(spy: &Spy) -> Reflector {
    spy.reflector()
}
