//! Proxy generation.
//!
//! A [`ProxyRegistry`] turns contract descriptors into [`ProxyType`]s: the
//! table of which methods a stand-in intercepts and which it must leave
//! alone. Proxy types are memoized per contract name, so asking for the same
//! contract twice reuses the first result.
//!
//! Two kinds of proxy instance exist:
//!
//! - [`ProxySpy`], a dynamic proxy that dispatches by method name and checks
//!   calls against the contract at run time.
//! - Typed proxies generated at build time by `#[spy]` on a trait. They
//!   implement the trait itself and reach the registry through
//!   [`SpyContract`] and [`ProxyRegistry::instance_of`].

use crate::config::SpyglassConfig;
use crate::contract::{
    ContractCatalog, ContractDescriptor, ContractKind, Finality, MethodSignature, Visibility,
};
use crate::error::{Error, ErrorKind, Result};
use crate::responder::Responder;
use crate::spy::Spy;
use crate::tracing_compat::{debug, info, warn};
use crate::value::Value;
use core::fmt;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A type that a `#[spy]`-generated proxy implements.
///
/// The generated `<Trait>Spy` struct wraps a [`Spy`] and forwards every
/// intercepted trait method to [`Spy::handle`].
pub trait SpyContract: Sized {
    /// Descriptor of the trait the proxy implements.
    fn contract_descriptor() -> ContractDescriptor;

    /// Descriptors of spied supertraits the proxy also implements.
    fn supertype_descriptors() -> Vec<ContractDescriptor> {
        Vec::new()
    }

    /// Wraps a spy.
    fn from_spy(spy: Spy) -> Self;

    /// The wrapped spy.
    fn as_spy(&self) -> &Spy;
}

/// Synthesized interception table for one contract.
#[derive(Debug)]
pub struct ProxyType {
    descriptor: ContractDescriptor,
    intercepted: BTreeMap<String, MethodSignature>,
    finals: BTreeMap<String, MethodSignature>,
    ancestors: Vec<String>,
    config: SpyglassConfig,
}

/// How a proxy treats one method name.
#[derive(Debug, Clone, Copy)]
enum Routing<'a> {
    Intercepted(&'a MethodSignature),
    Final,
    Unknown,
}

impl ProxyType {
    fn synthesize(
        descriptor: ContractDescriptor,
        methods: Vec<MethodSignature>,
        ancestors: Vec<String>,
        config: SpyglassConfig,
    ) -> Self {
        let mut intercepted = BTreeMap::new();
        let mut finals = BTreeMap::new();
        for method in methods {
            if method.is_interceptable() {
                intercepted.insert(method.name.clone(), method);
            } else if method.finality == Finality::Final
                && method.visibility == Visibility::Public
                && !method.is_constructor
            {
                warn!(
                    contract = descriptor.name(),
                    method = %method.name,
                    "final method cannot be intercepted"
                );
                finals.insert(method.name.clone(), method);
            }
        }
        info!(
            contract = descriptor.name(),
            intercepted = intercepted.len(),
            skipped_finals = finals.len(),
            "synthesized proxy type"
        );
        Self {
            descriptor,
            intercepted,
            finals,
            ancestors,
            config,
        }
    }

    /// Contract name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Contract kind.
    #[must_use]
    pub const fn kind(&self) -> ContractKind {
        self.descriptor.kind()
    }

    /// The contract's own descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &ContractDescriptor {
        &self.descriptor
    }

    /// Signatures the proxy intercepts, by name.
    pub fn intercepted_methods(&self) -> impl Iterator<Item = &MethodSignature> {
        self.intercepted.values()
    }

    /// Final methods left un-intercepted.
    pub fn skipped_methods(&self) -> impl Iterator<Item = &MethodSignature> {
        self.finals.values()
    }

    /// True if calls to `method_name` are intercepted.
    #[must_use]
    pub fn intercepts(&self, method_name: &str) -> bool {
        self.intercepted.contains_key(method_name)
    }

    /// True if instances can stand in for `contract_name`: the contract
    /// itself or any of its transitive supertypes.
    #[must_use]
    pub fn is_substitutable_for(&self, contract_name: &str) -> bool {
        self.name() == contract_name || self.ancestors.iter().any(|a| a == contract_name)
    }

    /// Creates a proxy instance with a fresh spy.
    pub fn instantiate<I, K, R>(self: &Arc<Self>, responders: I) -> ProxySpy
    where
        I: IntoIterator<Item = (K, R)>,
        K: Into<String>,
        R: Into<Responder>,
    {
        let spy = Spy::builder()
            .config(&self.config)
            .contract(self.name())
            .responders(responders)
            .build();
        ProxySpy {
            spy,
            proxy_type: Arc::clone(self),
        }
    }

    fn route(&self, method_name: &str) -> Routing<'_> {
        if let Some(signature) = self.intercepted.get(method_name) {
            Routing::Intercepted(signature)
        } else if self.finals.contains_key(method_name) {
            Routing::Final
        } else {
            Routing::Unknown
        }
    }
}

/// A dynamic proxy instance: a spy bound to a [`ProxyType`].
pub struct ProxySpy {
    spy: Spy,
    proxy_type: Arc<ProxyType>,
}

impl ProxySpy {
    /// Calls `method_name` on the proxy.
    ///
    /// Intercepted methods and names outside the contract go to the spy's
    /// dispatcher.
    ///
    /// # Errors
    ///
    /// - `NotInterceptable` for a final contract method (nothing is recorded)
    /// - `InvalidArgument` when fewer arguments than the method requires are
    ///   passed (nothing is recorded)
    /// - any error the bound responder raises
    pub fn call(&self, method_name: &str, args: Vec<Value>) -> Result<Value> {
        match self.proxy_type.route(method_name) {
            Routing::Final => {
                return Err(Error::new(ErrorKind::NotInterceptable).with_message(format!(
                    "{}::{method_name} is final",
                    self.proxy_type.name()
                )));
            }
            Routing::Intercepted(signature) => {
                let required = signature.required_arity();
                if args.len() < required {
                    return Err(Error::invalid_argument(format!(
                        "{}::{method_name} expects at least {required} argument(s), got {}",
                        self.proxy_type.name(),
                        args.len()
                    )));
                }
            }
            Routing::Unknown => {}
        }
        self.spy.handle(method_name, args)
    }

    /// The proxy type this instance was built from.
    #[must_use]
    pub const fn proxy_type(&self) -> &Arc<ProxyType> {
        &self.proxy_type
    }

    /// True if this proxy can stand in for `contract_name`.
    #[must_use]
    pub fn is_instance_of(&self, contract_name: &str) -> bool {
        self.proxy_type.is_substitutable_for(contract_name)
    }

    /// The underlying spy.
    #[must_use]
    pub const fn spy(&self) -> &Spy {
        &self.spy
    }
}

impl Deref for ProxySpy {
    type Target = Spy;

    fn deref(&self) -> &Spy {
        &self.spy
    }
}

impl fmt::Debug for ProxySpy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxySpy")
            .field("contract", &self.proxy_type.name())
            .field("spy", &self.spy)
            .finish()
    }
}

/// Known contracts plus the memo of proxy types synthesized from them.
///
/// Construct one per test run and pass it by reference.
#[derive(Default)]
pub struct ProxyRegistry {
    catalog: RwLock<ContractCatalog>,
    memo: Mutex<BTreeMap<String, Arc<ProxyType>>>,
    synthesized: AtomicUsize,
    config: SpyglassConfig,
}

impl ProxyRegistry {
    /// An empty registry with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty registry whose proxies use `config`.
    #[must_use]
    pub fn with_config(config: SpyglassConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// A registry pre-loaded with `catalog`.
    #[must_use]
    pub fn with_catalog(catalog: ContractCatalog) -> Self {
        Self {
            catalog: RwLock::new(catalog),
            ..Self::default()
        }
    }

    /// The configuration applied to new proxies.
    #[must_use]
    pub const fn config(&self) -> &SpyglassConfig {
        &self.config
    }

    /// Adds a contract. Re-registering an identical descriptor is a no-op;
    /// a changed descriptor discards memoized proxy types.
    pub fn register(&self, descriptor: ContractDescriptor) {
        let changed = {
            let mut catalog = self.catalog.write();
            if catalog.get(descriptor.name()) == Some(&descriptor) {
                false
            } else {
                catalog.insert(descriptor);
                true
            }
        };
        if changed {
            self.memo.lock().clear();
        }
    }

    /// True if `name` is a registered contract.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.catalog.read().contains(name)
    }

    /// Returns the proxy type for `contract_name`, synthesizing it on first
    /// use.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if no contract with that name is registered.
    pub fn represent(&self, contract_name: &str) -> Result<Arc<ProxyType>> {
        let mut memo = self.memo.lock();
        if let Some(existing) = memo.get(contract_name) {
            debug!(contract = contract_name, "reusing memoized proxy type");
            return Ok(Arc::clone(existing));
        }

        let (descriptor, methods, ancestors) = {
            let catalog = self.catalog.read();
            let descriptor = catalog.get(contract_name).cloned().ok_or_else(|| {
                Error::invalid_argument(format!(
                    "no class or interface named {contract_name}"
                ))
            })?;
            let methods = catalog.resolve_methods(contract_name).unwrap_or_default();
            (descriptor, methods, catalog.ancestors(contract_name))
        };

        let proxy = Arc::new(ProxyType::synthesize(
            descriptor,
            methods,
            ancestors,
            self.config.clone(),
        ));
        self.synthesized.fetch_add(1, Ordering::Relaxed);
        memo.insert(contract_name.to_owned(), Arc::clone(&proxy));
        Ok(proxy)
    }

    /// Number of proxy types synthesized so far.
    #[must_use]
    pub fn synthesis_count(&self) -> usize {
        self.synthesized.load(Ordering::Relaxed)
    }

    /// Creates a dynamic proxy for `contract_name`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if no contract with that name is registered.
    pub fn create_spy_instance_of<I, K, R>(
        &self,
        contract_name: &str,
        responders: I,
    ) -> Result<ProxySpy>
    where
        I: IntoIterator<Item = (K, R)>,
        K: Into<String>,
        R: Into<Responder>,
    {
        Ok(self.represent(contract_name)?.instantiate(responders))
    }

    /// Creates a typed proxy generated by `#[spy]`.
    ///
    /// Registers the trait's descriptor and those of its spied supertraits.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the contract cannot be represented.
    pub fn instance_of<T, I, K, R>(&self, responders: I) -> Result<T>
    where
        T: SpyContract,
        I: IntoIterator<Item = (K, R)>,
        K: Into<String>,
        R: Into<Responder>,
    {
        for supertype in T::supertype_descriptors() {
            self.register(supertype);
        }
        let descriptor = T::contract_descriptor();
        let name = descriptor.name().to_owned();
        self.register(descriptor);
        let proxy = self.represent(&name)?;
        let spy = Spy::builder()
            .config(&proxy.config)
            .contract(name)
            .responders(responders)
            .build();
        Ok(T::from_spy(spy))
    }
}

impl fmt::Debug for ProxyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyRegistry")
            .field("memoized", &self.memo.lock().keys().cloned().collect::<Vec<_>>())
            .field("synthesized", &self.synthesis_count())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Support code for `#[spy]` expansions. Not public API.
#[doc(hidden)]
pub mod __private {
    use crate::convert::FromValue;
    use crate::error::{Error, Result};
    use crate::value::Value;

    pub use crate::contract::{ContractDescriptor, MethodSignature, Param};
    pub use crate::convert::ToValue;

    /// Converts a dispatch outcome for a method that does not return
    /// `Result`. Errors are raised as a panic carrying the [`Error`].
    #[track_caller]
    pub fn returned<T: FromValue>(outcome: Result<Value>) -> T {
        match outcome.and_then(|value| T::from_value(value).map_err(Error::from)) {
            Ok(value) => value,
            Err(err) => std::panic::panic_any(err),
        }
    }

    /// Converts a dispatch outcome for a method returning `Result<T, E>`.
    pub fn returned_result<T, E>(outcome: Result<Value>) -> core::result::Result<T, E>
    where
        T: FromValue,
        E: From<Error>,
    {
        outcome
            .and_then(|value| T::from_value(value).map_err(Error::from))
            .map_err(E::from)
    }
}
