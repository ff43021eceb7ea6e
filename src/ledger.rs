//! The invocation ledger.
//!
//! A [`Ledger`] is an immutable snapshot of every call made to one spy. The
//! records sit in an arena in total call order; a per-method index maps each
//! method name to arena positions in insertion order. Appending never touches
//! an existing snapshot: storage is shared between snapshots and copied on
//! write only when another snapshot still holds it.
//!
//! # Invariants
//!
//! - `records[i].id().seq() == i`
//! - `records[i].previous()` is `records[i - 1].id()`, and `None` for `i == 0`
//! - each per-method index list is strictly increasing
//! - `last_record()` is the most recently appended record on any method

use crate::clock::Timestamp;
use crate::matcher::calls_match;
use crate::record::{Call, InvocationRecord, LedgerId, RecordId};
use crate::value::Value;
use core::fmt;
use std::collections::BTreeMap;
use std::sync::Arc;

/// An immutable snapshot of one spy's call history.
#[derive(Clone)]
pub struct Ledger {
    id: LedgerId,
    records: Arc<Vec<InvocationRecord>>,
    by_method: Arc<BTreeMap<String, Vec<usize>>>,
}

impl Ledger {
    /// Creates an empty ledger with a fresh identity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(LedgerId::next())
    }

    /// Empty placeholder held by a spy while it builds the next snapshot.
    /// Never observed by callers.
    pub(crate) fn detached() -> Self {
        Self::with_id(LedgerId::DETACHED)
    }

    fn with_id(id: LedgerId) -> Self {
        Self {
            id,
            records: Arc::new(Vec::new()),
            by_method: Arc::new(BTreeMap::new()),
        }
    }

    /// Returns the ledger's identity.
    #[must_use]
    pub const fn id(&self) -> LedgerId {
        self.id
    }

    /// Returns every record for `method_name`, in call order.
    ///
    /// Unknown names yield an empty list.
    #[must_use]
    pub fn records_for(&self, method_name: &str) -> Vec<InvocationRecord> {
        self.indices_for(method_name)
            .iter()
            .filter_map(|&seq| self.records.get(seq))
            .cloned()
            .collect()
    }

    /// Returns the records for `method_name` whose arguments match `args`.
    #[must_use]
    pub fn records_for_args(&self, method_name: &str, args: &[Value]) -> Vec<InvocationRecord> {
        let query = Call::new(method_name, args.to_vec());
        self.indices_for(method_name)
            .iter()
            .filter_map(|&seq| self.records.get(seq))
            .filter(|record| calls_match(record.call(), &query))
            .cloned()
            .collect()
    }

    /// Returns a new ledger with `call` appended under `method_name`.
    ///
    /// `self` is left unchanged.
    #[must_use]
    pub fn with_appended(&self, method_name: &str, call: Call, timestamp: Timestamp) -> Self {
        self.clone().appended(method_name, call, timestamp)
    }

    /// Consuming form of [`with_appended`](Self::with_appended).
    ///
    /// Storage is reused in place when no other snapshot shares it.
    #[must_use]
    pub fn appended(mut self, method_name: &str, call: Call, timestamp: Timestamp) -> Self {
        let seq = self.records.len();
        let previous = self.records.last().map(InvocationRecord::id);
        let record = InvocationRecord::new(RecordId::new(self.id, seq), call, timestamp, previous);
        Arc::make_mut(&mut self.records).push(record);
        Arc::make_mut(&mut self.by_method)
            .entry(method_name.to_owned())
            .or_default()
            .push(seq);
        self
    }

    /// Returns the most recently appended record.
    #[must_use]
    pub fn last_record(&self) -> Option<&InvocationRecord> {
        self.records.last()
    }

    /// Looks up a record by id. Ids from other ledgers yield `None`.
    #[must_use]
    pub fn record(&self, id: RecordId) -> Option<&InvocationRecord> {
        if id.ledger() != self.id {
            return None;
        }
        self.records.get(id.seq())
    }

    /// Returns all records in call order.
    #[must_use]
    pub fn records(&self) -> &[InvocationRecord] {
        &self.records
    }

    /// Returns the total number of recorded calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the names of every method called at least once, sorted.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.by_method.keys().map(String::as_str)
    }

    /// Rebuilds the total call order by following `previous` links back from
    /// the last record. Returned oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<InvocationRecord> {
        let mut out = Vec::with_capacity(self.records.len());
        let mut cursor = self.last_record();
        while let Some(record) = cursor {
            out.push(record.clone());
            cursor = record.previous().and_then(|prev| self.record(prev));
        }
        out.reverse();
        out
    }

    fn indices_for(&self, method_name: &str) -> &[usize] {
        self.by_method
            .get(method_name)
            .map_or(&[][..], Vec::as_slice)
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("id", &self.id)
            .field("len", &self.records.len())
            .field("methods", &self.by_method.keys().collect::<Vec<_>>())
            .finish()
    }
}
