//! Responders: the behavior bound to a spied method.
//!
//! A [`Responder`] turns call arguments into a return value or an error. The
//! combinators here cover the usual stubbing needs: a fixed value, a
//! sequence of values, a raised error, and values computed from the
//! arguments.

use crate::error::{Error, Result};
use crate::value::Value;
use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

type RespondFn = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;

/// Cheap-clone handle to a response function.
#[derive(Clone)]
pub struct Responder {
    inner: Arc<RespondFn>,
    kind: &'static str,
}

impl Responder {
    /// Wraps a response function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self::with_kind("custom", f)
    }

    fn with_kind<F>(kind: &'static str, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(f),
            kind,
        }
    }

    /// Produces the response for `args`.
    ///
    /// # Errors
    ///
    /// Whatever error the response function raises.
    pub fn respond(&self, args: &[Value]) -> Result<Value> {
        (self.inner)(args)
    }

    /// Short label of the combinator that built this responder.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        self.kind
    }

    /// Wraps the responder as an opaque [`Value`], so it can travel through
    /// dynamically typed code and come back via [`try_value_returned_by`].
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::object(self)
    }
}

impl fmt::Debug for Responder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Responder").field(&self.kind).finish()
    }
}

impl From<Returnable> for Responder {
    fn from(returnable: Returnable) -> Self {
        match returnable {
            Returnable::Value(value) => returns_static_value(value),
            Returnable::Computed(responder) => responder,
        }
    }
}

/// One entry of a response sequence.
#[derive(Debug, Clone)]
pub enum Returnable {
    /// Returned verbatim.
    Value(Value),
    /// Invoked with the call arguments; its result is returned.
    Computed(Responder),
}

impl Returnable {
    fn produce(&self, args: &[Value]) -> Result<Value> {
        match self {
            Self::Value(value) => Ok(value.clone()),
            Self::Computed(responder) => responder.respond(args),
        }
    }
}

impl From<Value> for Returnable {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Responder> for Returnable {
    fn from(responder: Responder) -> Self {
        Self::Computed(responder)
    }
}

macro_rules! returnable_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Returnable {
                fn from(v: $ty) -> Self {
                    Self::Value(Value::from(v))
                }
            }
        )*
    };
}

returnable_from!(bool, i32, i64, u32, u64, usize, f64, &str, String, ());

/// Always returns `value`.
pub fn returns_static_value(value: impl Into<Value>) -> Responder {
    let value = value.into();
    Responder::with_kind("static", move |_| Ok(value.clone()))
}

/// Always returns `Null`. The default fallback of every spy.
#[must_use]
pub fn returns_null() -> Responder {
    Responder::with_kind("null", |_| Ok(Value::Null))
}

/// Returns each item in turn, then `Null` forever.
pub fn returns_in_sequence<I>(items: I) -> Responder
where
    I: IntoIterator,
    I::Item: Into<Returnable>,
{
    returns_in_sequence_with_fallback(items, Returnable::Value(Value::Null))
}

/// Returns each item in turn, then `fallback` forever.
///
/// [`Returnable::Computed`] entries are invoked with the call arguments.
pub fn returns_in_sequence_with_fallback<I>(items: I, fallback: impl Into<Returnable>) -> Responder
where
    I: IntoIterator,
    I::Item: Into<Returnable>,
{
    let items: Vec<Returnable> = items.into_iter().map(Into::into).collect();
    let fallback = fallback.into();
    let cursor = AtomicUsize::new(0);
    Responder::with_kind("sequence", move |args| {
        let index = cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| {
                Some(c.saturating_add(1))
            })
            .unwrap_or_else(|c| c);
        items.get(index).unwrap_or(&fallback).produce(args)
    })
}

/// Raises `error` on every call.
///
/// The caller sees an [`ErrorKind::Responder`](crate::ErrorKind::Responder)
/// whose source is `error`.
pub fn throws<E>(error: E) -> Responder
where
    E: std::error::Error + Send + Sync + 'static,
{
    let shared: Arc<dyn std::error::Error + Send + Sync> = Arc::new(error);
    Responder::with_kind("throws", move |_| {
        Err(Error::responder_shared(Arc::clone(&shared)))
    })
}

/// Marks `f` to be invoked with the call arguments instead of being
/// returned as a value.
pub fn value_returned_by<F>(f: F) -> Returnable
where
    F: Fn(&[Value]) -> Value + Send + Sync + 'static,
{
    Returnable::Computed(Responder::with_kind("computed", move |args| Ok(f(args))))
}

/// Dynamic form of [`value_returned_by`]: accepts a [`Value::Object`]
/// holding a [`Responder`].
///
/// # Errors
///
/// `InvalidArgument` if `value` is not callable.
pub fn try_value_returned_by(value: &Value) -> Result<Returnable> {
    match value {
        Value::Object(obj) => obj
            .downcast_ref::<Responder>()
            .cloned()
            .map(Returnable::Computed)
            .ok_or_else(|| {
                Error::invalid_argument(format!("{} is not callable", obj.type_name()))
            }),
        other => Err(Error::invalid_argument(format!(
            "a {} value is not callable",
            other.type_name()
        ))),
    }
}
