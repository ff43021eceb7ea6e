//! Spies: the unit of identity for recorded calls.
//!
//! A [`Spy`] owns the current ledger snapshot of its calls, the responders
//! bound to method names and a fallback responder. Callers hold the spy and
//! see it change as calls arrive; every change replaces the snapshot rather
//! than editing it, so reflectors taken earlier keep their view.

use crate::clock::Clock;
use crate::config::SpyglassConfig;
use crate::ledger::Ledger;
use crate::record::LedgerId;
use crate::reflector::Reflector;
use crate::responder::{Responder, returns_null};
use core::fmt;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A recording test double.
pub struct Spy {
    id: LedgerId,
    pub(crate) ledger: Mutex<Ledger>,
    responders: BTreeMap<String, Responder>,
    fallback: Responder,
    pub(crate) clock: Arc<dyn Clock>,
    contract: Option<String>,
    render_limit: usize,
}

impl Spy {
    /// Starts building a spy.
    #[must_use]
    pub fn builder() -> SpyBuilder {
        SpyBuilder::new()
    }

    /// A spy with no bound responders: every call returns `Null`.
    #[must_use]
    pub fn anonymous() -> Self {
        SpyBuilder::new().build()
    }

    /// Identity of this spy's ledger.
    #[must_use]
    pub const fn id(&self) -> LedgerId {
        self.id
    }

    /// The current ledger snapshot.
    #[must_use]
    pub fn ledger(&self) -> Ledger {
        self.ledger.lock().clone()
    }

    /// A query facade over the current snapshot.
    #[must_use]
    pub fn reflector(&self) -> Reflector {
        Reflector::new(self.ledger()).with_render_limit(self.render_limit)
    }

    /// Name of the contract this spy stands in for, if any.
    #[must_use]
    pub fn contract(&self) -> Option<&str> {
        self.contract.as_deref()
    }

    /// True if `method_name` has an explicitly bound responder.
    #[must_use]
    pub fn has_responder(&self, method_name: &str) -> bool {
        self.responders.contains_key(method_name)
    }

    /// The responder for `method_name`, or the fallback.
    pub(crate) fn resolve(&self, method_name: &str) -> &Responder {
        self.responders.get(method_name).unwrap_or(&self.fallback)
    }
}

impl fmt::Debug for Spy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spy")
            .field("id", &self.id)
            .field("contract", &self.contract)
            .field("responders", &self.responders.keys().collect::<Vec<_>>())
            .field("calls", &self.ledger.lock().len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Spy`].
#[derive(Default)]
pub struct SpyBuilder {
    responders: BTreeMap<String, Responder>,
    fallback: Option<Responder>,
    clock: Option<Arc<dyn Clock>>,
    config: SpyglassConfig,
    contract: Option<String>,
}

impl SpyBuilder {
    /// Creates a builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a responder to a method name. A later binding for the same
    /// name replaces the earlier one.
    #[must_use]
    pub fn responder(mut self, method_name: impl Into<String>, responder: impl Into<Responder>) -> Self {
        self.responders.insert(method_name.into(), responder.into());
        self
    }

    /// Binds several responders.
    #[must_use]
    pub fn responders<I, K, R>(mut self, responders: I) -> Self
    where
        I: IntoIterator<Item = (K, R)>,
        K: Into<String>,
        R: Into<Responder>,
    {
        self.responders
            .extend(responders.into_iter().map(|(k, r)| (k.into(), r.into())));
        self
    }

    /// Replaces the fallback responder (default: return `Null`).
    #[must_use]
    pub fn fallback(mut self, responder: impl Into<Responder>) -> Self {
        self.fallback = Some(responder.into());
        self
    }

    /// Uses `clock` instead of the configured clock kind.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Applies a configuration.
    #[must_use]
    pub fn config(mut self, config: &SpyglassConfig) -> Self {
        self.config = config.clone();
        self
    }

    /// Records the contract name the spy stands in for.
    #[must_use]
    pub fn contract(mut self, name: impl Into<String>) -> Self {
        self.contract = Some(name.into());
        self
    }

    /// Builds the spy with an empty ledger.
    #[must_use]
    pub fn build(self) -> Spy {
        let ledger = Ledger::new();
        Spy {
            id: ledger.id(),
            ledger: Mutex::new(ledger),
            responders: self.responders,
            fallback: self.fallback.unwrap_or_else(returns_null),
            clock: self.clock.unwrap_or_else(|| self.config.clock.build()),
            contract: self.contract,
            render_limit: self.config.render_limit,
        }
    }
}

impl fmt::Debug for SpyBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpyBuilder")
            .field("responders", &self.responders.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .field("contract", &self.contract)
            .finish_non_exhaustive()
    }
}
