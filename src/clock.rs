//! Timestamps and clock sources for invocation records.
//!
//! Causal queries compare timestamps, so every clock here is strictly
//! increasing per source: two calls in immediate succession never tie and
//! never appear out of order. The clocks built from [`ClockKind`] are
//! process-wide, so timestamps from different spies are comparable.

use core::fmt;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

/// A point on a clock, in ticks.
///
/// [`MonotonicClock`] ticks are nanoseconds since the first call in the
/// process. [`LogicalClock`] and [`SharedLogicalClock`] ticks are call
/// counts.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Creates a timestamp from raw ticks.
    #[must_use]
    pub const fn from_ticks(ticks: u64) -> Self {
        Self(ticks)
    }

    /// Returns the raw tick count.
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// A source of timestamps.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current timestamp.
    fn now(&self) -> Timestamp;
}

static MONOTONIC_EPOCH: OnceLock<Instant> = OnceLock::new();
static MONOTONIC_LAST: AtomicU64 = AtomicU64::new(0);

/// Process-wide high-resolution clock.
///
/// All instances share one sequence, so timestamps from different spies are
/// comparable and never equal.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        let epoch = MONOTONIC_EPOCH.get_or_init(Instant::now);
        let elapsed = u64::try_from(epoch.elapsed().as_nanos()).unwrap_or(u64::MAX);
        let mut last = MONOTONIC_LAST.load(Ordering::Relaxed);
        loop {
            let next = elapsed.max(last.saturating_add(1));
            match MONOTONIC_LAST.compare_exchange_weak(
                last,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Timestamp(next),
                Err(actual) => last = actual,
            }
        }
    }
}

/// Counter clock starting at 1.
///
/// Each instance counts on its own; use [`SharedLogicalClock`] when spies
/// must be compared with each other.
#[derive(Debug)]
pub struct LogicalClock {
    next: AtomicU64,
}

impl LogicalClock {
    /// Creates a counter whose first reading is 1.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }
}

impl Default for LogicalClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for LogicalClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

static SHARED_LOGICAL: LogicalClock = LogicalClock::new();

/// Process-wide counter clock.
///
/// All instances read one counter, so every reading in the process is
/// distinct and later calls always carry larger timestamps.
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedLogicalClock;

impl Clock for SharedLogicalClock {
    fn now(&self) -> Timestamp {
        SHARED_LOGICAL.now()
    }
}

/// A clock that only moves when told to. Used by tests to pin timestamps.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Creates a clock reading `start`.
    #[must_use]
    pub const fn new(start: u64) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    /// Sets the current reading.
    pub fn set(&self, ticks: u64) {
        self.now.store(ticks, Ordering::Relaxed);
    }

    /// Moves the reading forward by `ticks`.
    pub fn advance(&self, ticks: u64) {
        self.now.fetch_add(ticks, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.load(Ordering::Relaxed))
    }
}

/// Selects a clock source from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockKind {
    /// [`MonotonicClock`].
    #[default]
    Monotonic,
    /// [`SharedLogicalClock`].
    Logical,
}

impl ClockKind {
    /// Returns the configuration name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monotonic => "monotonic",
            Self::Logical => "logical",
        }
    }

    /// Builds a clock of this kind.
    #[must_use]
    pub fn build(self) -> Arc<dyn Clock> {
        match self {
            Self::Monotonic => Arc::new(MonotonicClock),
            Self::Logical => Arc::new(SharedLogicalClock),
        }
    }
}

impl FromStr for ClockKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monotonic" => Ok(Self::Monotonic),
            "logical" => Ok(Self::Logical),
            other => Err(format!("unknown clock kind: {other}")),
        }
    }
}

impl fmt::Display for ClockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
