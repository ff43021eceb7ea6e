//! Proc macros for spyglass.
//!
//! - [`macro@spy`]: generate a spy proxy implementing a trait
//!
//! These macros are re-exported by the `spyglass` crate (feature
//! `proc-macros`, on by default). Depend on `spyglass` rather than on this
//! crate directly.

use proc_macro::TokenStream;

mod spy;

/// Generates a spy proxy for a trait.
///
/// For `trait Greeter`, the expansion keeps the trait and adds
/// `GreeterSpy`, a struct wrapping a `spyglass::Spy` that implements
/// `Greeter` by recording every call and answering through the bound
/// responders. Obtain instances through `ProxyRegistry::instance_of`.
///
/// # Options
///
/// - `#[spy(supertraits(Base, other::Trait))]`: the proxy also implements
///   these supertraits, each of which must itself carry `#[spy]`.
/// - `#[spy(passthrough)]` on a method with a default body: the method is
///   not intercepted and keeps its default behavior.
///
/// # Methods
///
/// - Arguments must implement `spyglass::ToValue`.
/// - Return types must implement `spyglass::FromValue`. For `Result<T, E>`
///   with `E: From<spyglass::Error>`, responder errors come back as `Err`;
///   for any other return type they are raised as a panic whose payload is
///   the `spyglass::Error`.
/// - Methods without a receiver need a default body and are not intercepted.
///
/// Generic traits, associated types and constants, async or unsafe methods,
/// generic methods and reference return types are rejected.
///
/// # Example
///
/// ```ignore
/// #[spyglass::spy]
/// pub trait Greeter {
///     fn greet(&self, name: &str) -> String;
/// }
///
/// let registry = spyglass::ProxyRegistry::new();
/// let greeter: GreeterSpy = registry
///     .instance_of([("greet", spyglass::responder::returns_static_value("hi"))])?;
/// assert_eq!(greeter.greet("ann"), "hi");
/// ```
#[proc_macro_attribute]
pub fn spy(attr: TokenStream, item: TokenStream) -> TokenStream {
    spy::spy_impl(attr, item)
}
