//! Argument matching.
//!
//! A recorded call matches a query call when the method names are equal
//! (case-sensitive), the argument counts are equal, and every position
//! matches. A position matches when:
//!
//! 1. the query-side value is a [`Value::Matcher`]: the query matcher is
//!    evaluated against the recorded value, even if the recorded value is
//!    itself a matcher;
//! 2. otherwise, the recorded value is a matcher: it is evaluated against the
//!    query value;
//! 3. otherwise, the two values are strictly equal.
//!
//! Matchers are never compared as literals. The query side always wins when
//! both sides carry a matcher.

use crate::record::Call;
use crate::value::{ObjectRef, Value};
use core::fmt;
use std::any::Any;
use std::sync::Arc;

/// A predicate over argument values.
pub trait Predicate: Send + Sync {
    /// Returns true if `value` satisfies the predicate.
    fn matches(&self, value: &Value) -> bool;

    /// Human-readable description, used in diagnostics.
    fn describe(&self) -> String;
}

/// Cheap-clone handle to a [`Predicate`].
#[derive(Clone)]
pub struct ArgMatcher {
    inner: Arc<dyn Predicate>,
}

impl ArgMatcher {
    /// Wraps a predicate.
    pub fn new(predicate: impl Predicate + 'static) -> Self {
        Self {
            inner: Arc::new(predicate),
        }
    }

    /// Evaluates the predicate.
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        self.inner.matches(value)
    }

    /// Describes the predicate.
    #[must_use]
    pub fn describe(&self) -> String {
        self.inner.describe()
    }

    /// Returns true if both handles share the same predicate.
    #[must_use]
    pub fn same_matcher(&self, other: &Self) -> bool {
        Arc::as_ptr(&self.inner).cast::<()>() == Arc::as_ptr(&other.inner).cast::<()>()
    }
}

impl fmt::Debug for ArgMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ArgMatcher").field(&self.describe()).finish()
    }
}

/// Compares two argument lists position by position.
///
/// `recorded` comes from the ledger, `query` from the caller. Lists of
/// different length never match.
#[must_use]
pub fn args_match(recorded: &[Value], query: &[Value]) -> bool {
    recorded.len() == query.len()
        && recorded
            .iter()
            .zip(query)
            .all(|(rec, q)| value_matches(rec, q))
}

/// Compares two calls: names first, then arity, then arguments.
#[must_use]
pub fn calls_match(recorded: &Call, query: &Call) -> bool {
    recorded.method_name() == query.method_name() && args_match(recorded.args(), query.args())
}

fn value_matches(recorded: &Value, query: &Value) -> bool {
    match (recorded, query) {
        (_, Value::Matcher(m)) => m.matches(recorded),
        (Value::Matcher(m), _) => m.matches(query),
        _ => recorded == query,
    }
}

// ── Built-in matchers ───────────────────────────────────────────────────

struct FnPredicate<F> {
    description: String,
    f: F,
}

impl<F> Predicate for FnPredicate<F>
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn matches(&self, value: &Value) -> bool {
        (self.f)(value)
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}

/// Builds a matcher from a description and a closure.
pub fn predicate<F>(description: impl Into<String>, f: F) -> Value
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Value::Matcher(ArgMatcher::new(FnPredicate {
        description: description.into(),
        f,
    }))
}

/// Matches any value.
#[must_use]
pub fn anything() -> Value {
    predicate("anything", |_| true)
}

/// Matches values strictly equal to `expected`.
pub fn equal_to(expected: impl Into<Value>) -> Value {
    let expected = expected.into();
    predicate(format!("equal to {expected}"), move |v| v == &expected)
}

/// Inverts a matcher. A literal is treated as `equal_to(literal)`.
pub fn not(inner: impl Into<Value>) -> Value {
    let inner = as_matcher(inner.into());
    predicate(format!("not {}", inner.describe()), move |v| !inner.matches(v))
}

/// Matches when every inner matcher matches.
pub fn all_of(matchers: impl IntoIterator<Item = Value>) -> Value {
    let inner: Vec<ArgMatcher> = matchers.into_iter().map(as_matcher).collect();
    let description = join_descriptions("all of", &inner);
    predicate(description, move |v| inner.iter().all(|m| m.matches(v)))
}

/// Matches when any inner matcher matches.
pub fn any_of(matchers: impl IntoIterator<Item = Value>) -> Value {
    let inner: Vec<ArgMatcher> = matchers.into_iter().map(as_matcher).collect();
    let description = join_descriptions("any of", &inner);
    predicate(description, move |v| inner.iter().any(|m| m.matches(v)))
}

fn numeric(description: String, bound: f64, cmp: fn(f64, f64) -> bool) -> Value {
    predicate(description, move |v| v.as_f64().is_some_and(|x| cmp(x, bound)))
}

/// Matches numbers strictly greater than `bound`.
#[must_use]
pub fn greater_than(bound: f64) -> Value {
    numeric(format!("greater than {bound}"), bound, |x, b| x > b)
}

/// Matches numbers greater than or equal to `bound`.
#[must_use]
pub fn greater_than_or_equal_to(bound: f64) -> Value {
    numeric(format!("greater than or equal to {bound}"), bound, |x, b| x >= b)
}

/// Matches numbers strictly less than `bound`.
#[must_use]
pub fn less_than(bound: f64) -> Value {
    numeric(format!("less than {bound}"), bound, |x, b| x < b)
}

/// Matches numbers less than or equal to `bound`.
#[must_use]
pub fn less_than_or_equal_to(bound: f64) -> Value {
    numeric(format!("less than or equal to {bound}"), bound, |x, b| x <= b)
}

/// Matches numbers within `delta` of `target`.
#[must_use]
pub fn close_to(target: f64, delta: f64) -> Value {
    predicate(format!("a number within {delta} of {target}"), move |v| {
        v.as_f64().is_some_and(|x| (x - target).abs() <= delta)
    })
}

/// Matches `Null`.
#[must_use]
pub fn null_value() -> Value {
    predicate("null", Value::is_null)
}

/// Matches anything but `Null`.
#[must_use]
pub fn not_null_value() -> Value {
    predicate("not null", |v| !v.is_null())
}

/// Matches the very same object instance.
#[must_use]
pub fn same_instance(object: &ObjectRef) -> Value {
    let object = object.clone();
    predicate(format!("same instance as {}", object.type_name()), move |v| {
        v.as_object().is_some_and(|o| o.same_instance(&object))
    })
}

/// Matches objects holding a `T`.
#[must_use]
pub fn instance_of<T: Any>() -> Value {
    predicate(
        format!("an instance of {}", std::any::type_name::<T>()),
        |v| v.as_object().is_some_and(ObjectRef::is::<T>),
    )
}

/// Matches lists containing an element that satisfies `item`.
pub fn has_item(item: impl Into<Value>) -> Value {
    let item = as_matcher(item.into());
    predicate(format!("a list containing {}", item.describe()), move |v| {
        v.as_list()
            .is_some_and(|items| items.iter().any(|x| item.matches(x)))
    })
}

/// Matches lists containing elements that satisfy every one of `items`.
pub fn has_items(items: impl IntoIterator<Item = Value>) -> Value {
    let inner: Vec<ArgMatcher> = items.into_iter().map(as_matcher).collect();
    let description = join_descriptions("a list containing", &inner);
    predicate(description, move |v| {
        v.as_list().is_some_and(|list| {
            inner
                .iter()
                .all(|m| list.iter().any(|x| m.matches(x)))
        })
    })
}

/// Matches strings equal to `expected` ignoring ASCII and Unicode case.
pub fn equal_to_ignoring_case(expected: impl Into<String>) -> Value {
    let expected = expected.into().to_lowercase();
    predicate(format!("equal to {expected:?} ignoring case"), move |v| {
        v.as_str().is_some_and(|s| s.to_lowercase() == expected)
    })
}

/// Matches strings equal to `expected` after collapsing whitespace runs.
pub fn equal_to_ignoring_white_space(expected: impl AsRef<str>) -> Value {
    let expected = collapse_white_space(expected.as_ref());
    predicate(
        format!("equal to {expected:?} ignoring white space"),
        move |v| {
            v.as_str()
                .is_some_and(|s| collapse_white_space(s) == expected)
        },
    )
}

/// Matches strings containing `needle`.
pub fn contains_string(needle: impl Into<String>) -> Value {
    let needle = needle.into();
    predicate(format!("a string containing {needle:?}"), move |v| {
        v.as_str().is_some_and(|s| s.contains(needle.as_str()))
    })
}

/// Matches strings starting with `prefix`.
pub fn starts_with(prefix: impl Into<String>) -> Value {
    let prefix = prefix.into();
    predicate(format!("a string starting with {prefix:?}"), move |v| {
        v.as_str().is_some_and(|s| s.starts_with(prefix.as_str()))
    })
}

/// Matches strings ending with `suffix`.
pub fn ends_with(suffix: impl Into<String>) -> Value {
    let suffix = suffix.into();
    predicate(format!("a string ending with {suffix:?}"), move |v| {
        v.as_str().is_some_and(|s| s.ends_with(suffix.as_str()))
    })
}

fn as_matcher(value: Value) -> ArgMatcher {
    match value {
        Value::Matcher(m) => m,
        literal => {
            let description = format!("equal to {literal}");
            ArgMatcher::new(FnPredicate {
                description,
                f: move |v: &Value| v == &literal,
            })
        }
    }
}

fn join_descriptions(prefix: &str, matchers: &[ArgMatcher]) -> String {
    let parts: Vec<String> = matchers.iter().map(ArgMatcher::describe).collect();
    format!("{prefix} ({})", parts.join(", "))
}

fn collapse_white_space(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
