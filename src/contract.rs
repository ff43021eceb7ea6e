//! Contract descriptors: the classes and interfaces a proxy can stand in for.
//!
//! A [`ContractDescriptor`] lists a contract's own method signatures and the
//! names of the contracts it extends or implements. A [`ContractCatalog`]
//! resolves names to descriptors and flattens inherited methods.

use crate::value::Value;
use std::collections::{BTreeMap, BTreeSet};

/// What kind of contract a descriptor describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    /// Only method signatures, no behavior.
    Interface,
    /// A class that cannot be instantiated directly.
    AbstractClass,
    /// A concrete class.
    Class,
}

/// Whether a method is called on an instance or on the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Receiver {
    /// Called on an instance.
    #[default]
    Instance,
    /// Called on the type itself.
    Static,
}

/// Whether a method may be overridden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Finality {
    /// Subtypes may override the method.
    #[default]
    Overridable,
    /// The method cannot be overridden, so it cannot be intercepted.
    Final,
}

/// Method visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Callable by anyone.
    #[default]
    Public,
    /// Callable by subtypes.
    Protected,
    /// Callable only by the declaring type.
    Private,
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Parameter name.
    pub name: String,
    /// Declared type, if any.
    pub type_name: Option<String>,
    /// Default value; a parameter with a default is optional.
    pub default: Option<Value>,
}

impl Param {
    /// A required, untyped parameter.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            default: None,
        }
    }

    /// Sets the declared type.
    #[must_use]
    pub fn typed(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Makes the parameter optional with `default`.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// True if the parameter has a default.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.default.is_some()
    }
}

/// One declared method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    /// Method name.
    pub name: String,
    /// Declared parameters in order.
    pub params: Vec<Param>,
    /// Instance or static.
    pub receiver: Receiver,
    /// Overridable or final.
    pub finality: Finality,
    /// Visibility.
    pub visibility: Visibility,
    /// True for constructors.
    pub is_constructor: bool,
}

impl MethodSignature {
    /// A public, overridable instance method with no parameters.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            receiver: Receiver::Instance,
            finality: Finality::Overridable,
            visibility: Visibility::Public,
            is_constructor: false,
        }
    }

    /// A constructor.
    #[must_use]
    pub fn constructor() -> Self {
        Self {
            is_constructor: true,
            ..Self::new("new")
        }
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Marks the method static.
    #[must_use]
    pub const fn static_method(mut self) -> Self {
        self.receiver = Receiver::Static;
        self
    }

    /// Marks the method final.
    #[must_use]
    pub const fn final_method(mut self) -> Self {
        self.finality = Finality::Final;
        self
    }

    /// Sets the visibility.
    #[must_use]
    pub const fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Number of leading parameters without defaults.
    #[must_use]
    pub fn required_arity(&self) -> usize {
        self.params
            .iter()
            .position(Param::is_optional)
            .unwrap_or(self.params.len())
    }

    /// True if a proxy can intercept this method.
    #[must_use]
    pub fn is_interceptable(&self) -> bool {
        self.visibility == Visibility::Public
            && self.finality == Finality::Overridable
            && !self.is_constructor
    }
}

/// A named class or interface and its own methods.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractDescriptor {
    name: String,
    kind: ContractKind,
    supertypes: Vec<String>,
    methods: Vec<MethodSignature>,
}

impl ContractDescriptor {
    fn new(name: impl Into<String>, kind: ContractKind) -> Self {
        Self {
            name: name.into(),
            kind,
            supertypes: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Describes an interface.
    #[must_use]
    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, ContractKind::Interface)
    }

    /// Describes an abstract class.
    #[must_use]
    pub fn abstract_class(name: impl Into<String>) -> Self {
        Self::new(name, ContractKind::AbstractClass)
    }

    /// Describes a concrete class.
    #[must_use]
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, ContractKind::Class)
    }

    /// Declares a supertype (extended class or implemented interface).
    #[must_use]
    pub fn extends(mut self, supertype: impl Into<String>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }

    /// Declares a method. A later declaration with the same name replaces
    /// the earlier one.
    #[must_use]
    pub fn method(mut self, method: MethodSignature) -> Self {
        self.methods.retain(|m| m.name != method.name);
        self.methods.push(method);
        self
    }

    /// Contract name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Contract kind.
    #[must_use]
    pub const fn kind(&self) -> ContractKind {
        self.kind
    }

    /// Direct supertypes.
    #[must_use]
    pub fn supertypes(&self) -> &[String] {
        &self.supertypes
    }

    /// Methods declared on this contract itself.
    #[must_use]
    pub fn methods(&self) -> &[MethodSignature] {
        &self.methods
    }
}

/// Name-indexed set of known contracts.
#[derive(Debug, Clone, Default)]
pub struct ContractCatalog {
    contracts: BTreeMap<String, ContractDescriptor>,
}

impl ContractCatalog {
    /// An empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a descriptor.
    pub fn insert(&mut self, descriptor: ContractDescriptor) {
        self.contracts.insert(descriptor.name.clone(), descriptor);
    }

    /// Looks up a descriptor.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ContractDescriptor> {
        self.contracts.get(name)
    }

    /// True if `name` is known.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.contracts.contains_key(name)
    }

    /// Every transitive supertype of `name` that the catalog knows, nearest
    /// first. Cycles are tolerated.
    #[must_use]
    pub fn ancestors(&self, name: &str) -> Vec<String> {
        let mut seen = BTreeSet::from([name.to_owned()]);
        let mut out = Vec::new();
        let mut queue: Vec<String> = self
            .get(name)
            .map(|d| d.supertypes.clone())
            .unwrap_or_default();
        queue.reverse();
        while let Some(next) = queue.pop() {
            if !seen.insert(next.clone()) {
                continue;
            }
            if let Some(descriptor) = self.get(&next) {
                queue.extend(descriptor.supertypes.iter().rev().cloned());
            }
            out.push(next);
        }
        out
    }

    /// Every method visible on `name`, own methods overriding inherited ones.
    ///
    /// Order: inherited methods in supertype declaration order, then own
    /// methods. Returns `None` if `name` is unknown.
    #[must_use]
    pub fn resolve_methods(&self, name: &str) -> Option<Vec<MethodSignature>> {
        let descriptor = self.get(name)?;
        let mut visiting = BTreeSet::new();
        let mut out = Vec::new();
        self.collect_methods(descriptor, &mut visiting, &mut out);
        Some(out)
    }

    fn collect_methods(
        &self,
        descriptor: &ContractDescriptor,
        visiting: &mut BTreeSet<String>,
        out: &mut Vec<MethodSignature>,
    ) {
        if !visiting.insert(descriptor.name.clone()) {
            return;
        }
        for supertype in &descriptor.supertypes {
            if let Some(parent) = self.get(supertype) {
                self.collect_methods(parent, visiting, out);
            }
        }
        for method in &descriptor.methods {
            if let Some(slot) = out.iter_mut().find(|m| m.name == method.name) {
                *slot = method.clone();
            } else {
                out.push(method.clone());
            }
        }
    }
}
