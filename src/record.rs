//! Calls and invocation records.
//!
//! Records live in a ledger's arena and are addressed by [`RecordId`]. Each
//! record stores the id of the record appended immediately before it on the
//! same spy, across all methods, so following `previous` links reconstructs
//! the full call order.

use crate::clock::Timestamp;
use crate::value::Value;
use core::fmt;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_LEDGER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one spy's ledger.
///
/// Id 0 is reserved for the placeholder swapped in while a spy appends.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LedgerId(u64);

impl LedgerId {
    pub(crate) const DETACHED: Self = Self(0);

    /// Allocates a fresh, process-unique ledger id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_LEDGER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates a ledger id for testing purposes.
    #[doc(hidden)]
    #[must_use]
    pub const fn new_for_test(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for LedgerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LedgerId({})", self.0)
    }
}

impl fmt::Display for LedgerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Address of a record: its ledger plus its position in total call order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RecordId {
    ledger: LedgerId,
    seq: usize,
}

impl RecordId {
    /// Creates a record id.
    #[must_use]
    pub const fn new(ledger: LedgerId, seq: usize) -> Self {
        Self { ledger, seq }
    }

    /// Returns the owning ledger.
    #[must_use]
    pub const fn ledger(self) -> LedgerId {
        self.ledger
    }

    /// Returns the zero-based position in the ledger's call order.
    #[must_use]
    pub const fn seq(self) -> usize {
        self.seq
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({}:{})", self.ledger.0, self.seq)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.ledger, self.seq)
    }
}

/// A method name and its ordered arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Call {
    method_name: String,
    args: Vec<Value>,
}

impl Call {
    /// Creates a call.
    #[must_use]
    pub fn new(method_name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            method_name: method_name.into(),
            args,
        }
    }

    /// Returns the method name.
    #[must_use]
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// Returns the arguments.
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.method_name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

/// One recorded call.
///
/// Records are immutable and cheap to clone: the call is shared.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRecord {
    id: RecordId,
    call: Arc<Call>,
    timestamp: Timestamp,
    previous: Option<RecordId>,
}

impl InvocationRecord {
    /// Creates a record. Ledgers build these; tests may build them directly.
    #[must_use]
    pub fn new(id: RecordId, call: Call, timestamp: Timestamp, previous: Option<RecordId>) -> Self {
        Self {
            id,
            call: Arc::new(call),
            timestamp,
            previous,
        }
    }

    /// Returns the record's id.
    #[must_use]
    pub const fn id(&self) -> RecordId {
        self.id
    }

    /// Returns the recorded call.
    #[must_use]
    pub fn call(&self) -> &Call {
        &self.call
    }

    /// Returns the method name of the recorded call.
    #[must_use]
    pub fn method_name(&self) -> &str {
        self.call.method_name()
    }

    /// Returns the recorded arguments.
    #[must_use]
    pub fn args(&self) -> &[Value] {
        self.call.args()
    }

    /// Returns when the call was recorded.
    #[must_use]
    pub const fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Returns the record appended immediately before this one, on any method.
    #[must_use]
    pub const fn previous(&self) -> Option<RecordId> {
        self.previous
    }
}

impl Serialize for InvocationRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut out = serializer.serialize_struct("InvocationRecord", 4)?;
        out.serialize_field("id", &self.id)?;
        out.serialize_field("call", &*self.call)?;
        out.serialize_field("timestamp", &self.timestamp)?;
        out.serialize_field("previous", &self.previous)?;
        out.end()
    }
}

impl fmt::Display for InvocationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} @{}", self.id, self.call, self.timestamp)
    }
}
