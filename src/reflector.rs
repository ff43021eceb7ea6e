//! Query facade over a spy's ledger.
//!
//! A [`Reflector`] holds one ledger snapshot. Calls made to the spy after the
//! reflector was taken are not visible through it.

use crate::ledger::Ledger;
use crate::record::{InvocationRecord, RecordId};
use crate::value::Value;
use core::fmt;
use serde::Serialize;
use serde::ser::SerializeStruct;

/// Default number of records rendered by [`Reflector::describe`].
pub const DEFAULT_RENDER_LIMIT: usize = 50;

/// An ordered list of matched invocation records.
///
/// This is the input type of the causal queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Invocations(Vec<InvocationRecord>);

impl Invocations {
    /// Wraps a list of records.
    #[must_use]
    pub const fn new(records: Vec<InvocationRecord>) -> Self {
        Self(records)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no record matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the records in call order.
    pub fn iter(&self) -> std::slice::Iter<'_, InvocationRecord> {
        self.0.iter()
    }

    /// The earliest record.
    #[must_use]
    pub fn first(&self) -> Option<&InvocationRecord> {
        self.0.first()
    }

    /// The latest record.
    #[must_use]
    pub fn last(&self) -> Option<&InvocationRecord> {
        self.0.last()
    }

    /// The record at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&InvocationRecord> {
        self.0.get(index)
    }

    /// True if a record with `id` is in the list.
    #[must_use]
    pub fn contains(&self, id: RecordId) -> bool {
        self.0.iter().any(|r| r.id() == id)
    }

    /// Unwraps into the record list.
    #[must_use]
    pub fn into_vec(self) -> Vec<InvocationRecord> {
        self.0
    }
}

impl AsRef<[InvocationRecord]> for Invocations {
    fn as_ref(&self) -> &[InvocationRecord] {
        &self.0
    }
}

impl From<Vec<InvocationRecord>> for Invocations {
    fn from(records: Vec<InvocationRecord>) -> Self {
        Self(records)
    }
}

impl IntoIterator for Invocations {
    type Item = InvocationRecord;
    type IntoIter = std::vec::IntoIter<InvocationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Invocations {
    type Item = &'a InvocationRecord;
    type IntoIter = std::slice::Iter<'a, InvocationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Invocations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(no invocations)");
        }
        for (i, record) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{record}")?;
        }
        Ok(())
    }
}

/// Read-only queries over one ledger snapshot.
#[derive(Debug, Clone)]
pub struct Reflector {
    ledger: Ledger,
    render_limit: usize,
}

impl Reflector {
    /// Creates a reflector over `ledger`.
    #[must_use]
    pub const fn new(ledger: Ledger) -> Self {
        Self {
            ledger,
            render_limit: DEFAULT_RENDER_LIMIT,
        }
    }

    /// Sets how many records [`describe`](Self::describe) renders.
    #[must_use]
    pub const fn with_render_limit(mut self, limit: usize) -> Self {
        self.render_limit = limit;
        self
    }

    /// Every call to `method_name`, in call order.
    #[must_use]
    pub fn by_name(&self, method_name: &str) -> Invocations {
        Invocations(self.ledger.records_for(method_name))
    }

    /// Calls to `method_name` whose arguments match `args`.
    ///
    /// `args` may contain matchers.
    #[must_use]
    pub fn by_name_and_args(&self, method_name: &str, args: &[Value]) -> Invocations {
        Invocations(self.ledger.records_for_args(method_name, args))
    }

    /// Number of calls to `method_name`.
    #[must_use]
    pub fn call_count(&self, method_name: &str) -> usize {
        self.ledger.records_for(method_name).len()
    }

    /// Every call on every method, oldest first.
    #[must_use]
    pub fn history(&self) -> Invocations {
        Invocations(self.ledger.history())
    }

    /// The underlying snapshot.
    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Renders the call history for failure messages.
    #[must_use]
    pub fn describe(&self) -> String {
        use std::fmt::Write as _;

        let records = self.ledger.records();
        let mut out = format!("{} call(s) recorded", records.len());
        for record in records.iter().take(self.render_limit) {
            let _ = write!(out, "\n  {record}");
        }
        if records.len() > self.render_limit {
            let _ = write!(out, "\n  ... {} more", records.len() - self.render_limit);
        }
        out
    }

    /// Serializes the snapshot to JSON.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for Reflector {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut out = serializer.serialize_struct("Reflector", 2)?;
        out.serialize_field("ledger", &self.ledger.id())?;
        out.serialize_field("records", self.ledger.records())?;
        out.end()
    }
}

impl fmt::Display for Reflector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Timestamp;
    use crate::record::Call;

    fn sample() -> Reflector {
        let mut ledger = Ledger::new();
        let calls = [
            ("doFoo", vec![]),
            ("doFoo", vec![Value::Bool(true), Value::Int(10)]),
            ("doBar", vec![Value::Bool(false)]),
            ("doBar", vec![Value::Bool(true)]),
        ];
        for (t, (name, args)) in calls.into_iter().enumerate() {
            ledger = ledger.appended(name, Call::new(name, args), Timestamp::from_ticks(t as u64 + 1));
        }
        Reflector::new(ledger)
    }

    #[test]
    fn member_and_call_style_queries() {
        let reflector = sample();
        assert_eq!(reflector.by_name("doFoo").len(), 2);
        assert_eq!(reflector.call_count("doBar"), 2);
        assert_eq!(
            reflector
                .by_name_and_args("doFoo", &[Value::Bool(true), Value::Int(10)])
                .len(),
            1
        );
        let f = reflector.by_name_and_args("doBar", &[Value::Bool(false)]);
        let t = reflector.by_name_and_args("doBar", &[Value::Bool(true)]);
        assert_eq!(f.len(), 1);
        assert!(!t.contains(f.first().unwrap().id()));
        assert!(reflector.by_name("nothing").is_empty());
    }

    #[test]
    fn describe_truncates() {
        let reflector = sample().with_render_limit(2);
        let text = reflector.describe();
        assert!(text.starts_with("4 call(s) recorded"));
        assert!(text.contains("doFoo()"));
        assert!(text.contains("... 2 more"));
        assert!(!text.contains("doBar(true)"));
    }

    #[test]
    fn json_lists_every_record() {
        let json = sample().to_json();
        assert_eq!(json["records"].as_array().unwrap().len(), 4);
        assert_eq!(json["records"][2]["call"]["method_name"], "doBar");
    }

    #[test]
    fn invocations_display() {
        assert_eq!(Invocations::default().to_string(), "(no invocations)");
        let history = sample().history();
        assert_eq!(history.to_string().lines().count(), 4);
    }
}
