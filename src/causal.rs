//! Causal queries over matched invocation lists.
//!
//! Both checks take one list per query, each already filtered by the ledger,
//! in the order the calls are expected to have happened.
//!
//! - [`occurred_chronologically`] looks for a thread of strictly increasing
//!   timestamps through the lists. Other calls may interleave.
//! - [`occurred_sequentially`] looks for an unbroken chain of `previous`
//!   links. Any call on any method between two links breaks the chain.

use crate::error::{Error, Result};
use crate::record::InvocationRecord;
use crate::tracing_compat::trace;

/// Returns true if some record of each list happened strictly after the
/// chosen record of the list before it.
///
/// The anchor is the first record of the first list; each later list
/// contributes its first record with a strictly greater timestamp.
///
/// # Errors
///
/// `InvalidArgument` if `lists` is empty.
pub fn occurred_chronologically<L>(lists: &[L]) -> Result<bool>
where
    L: AsRef<[InvocationRecord]>,
{
    let (first, rest) = lists.split_first().ok_or_else(|| {
        Error::invalid_argument("occurred_chronologically requires at least one list")
    })?;

    let Some(mut anchor) = first.as_ref().first() else {
        trace!(lists = lists.len(), "chronological check: first list empty");
        return Ok(false);
    };

    for (position, list) in rest.iter().enumerate() {
        let next = list
            .as_ref()
            .iter()
            .find(|record| record.timestamp() > anchor.timestamp());
        match next {
            Some(record) => anchor = record,
            None => {
                trace!(
                    lists = lists.len(),
                    failed_at = position + 1,
                    anchor = %anchor.timestamp(),
                    "chronological check failed"
                );
                return Ok(false);
            }
        }
    }

    trace!(lists = lists.len(), "chronological check passed");
    Ok(true)
}

/// Returns true if a record of the last list is reached, through
/// consecutive `previous` links, from one record of each earlier list in
/// order, with no other call in between.
///
/// # Errors
///
/// `InvalidArgument` if `lists` is empty.
pub fn occurred_sequentially<L>(lists: &[L]) -> Result<bool>
where
    L: AsRef<[InvocationRecord]>,
{
    sequential_chain(lists).map(|chain| chain.is_some())
}

/// Finds the chain witnessing [`occurred_sequentially`], oldest first.
///
/// Candidates from the last list are tried most recent first, so the
/// returned chain ends at the latest qualifying record.
///
/// # Errors
///
/// `InvalidArgument` if `lists` is empty.
pub fn sequential_chain<L>(lists: &[L]) -> Result<Option<Vec<InvocationRecord>>>
where
    L: AsRef<[InvocationRecord]>,
{
    let (last, prefix) = lists.split_last().ok_or_else(|| {
        Error::invalid_argument("occurred_sequentially requires at least one list")
    })?;

    let chain = last
        .as_ref()
        .iter()
        .rev()
        .find_map(|start| chain_from(start, prefix));

    trace!(
        lists = lists.len(),
        candidates = last.as_ref().len(),
        found = chain.is_some(),
        "sequential check"
    );
    Ok(chain)
}

/// Walks `previous` links back from `start`, requiring each link to be in
/// the corresponding list of `prefix`, last list first.
fn chain_from<L>(start: &InvocationRecord, prefix: &[L]) -> Option<Vec<InvocationRecord>>
where
    L: AsRef<[InvocationRecord]>,
{
    let mut chain = Vec::with_capacity(prefix.len() + 1);
    chain.push(start.clone());
    let mut current = start;
    for list in prefix.iter().rev() {
        let previous = current.previous()?;
        current = list.as_ref().iter().find(|r| r.id() == previous)?;
        chain.push(current.clone());
    }
    chain.reverse();
    Some(chain)
}

/// Checks chronological order across any number of invocation lists.
///
/// Each argument is anything that is `AsRef<[InvocationRecord]>`, such as
/// [`Invocations`](crate::Invocations).
#[macro_export]
macro_rules! occurred_chronologically {
    () => {
        $crate::causal::occurred_chronologically::<&[$crate::InvocationRecord]>(&[])
    };
    ($($list:expr),+ $(,)?) => {
        $crate::causal::occurred_chronologically(&[
            $(::core::convert::AsRef::<[$crate::InvocationRecord]>::as_ref(&$list)),+
        ])
    };
}

/// Checks strict sequential order across any number of invocation lists.
#[macro_export]
macro_rules! occurred_sequentially {
    () => {
        $crate::causal::occurred_sequentially::<&[$crate::InvocationRecord]>(&[])
    };
    ($($list:expr),+ $(,)?) => {
        $crate::causal::occurred_sequentially(&[
            $(::core::convert::AsRef::<[$crate::InvocationRecord]>::as_ref(&$list)),+
        ])
    };
}
