//! Chronological and strict sequential checks over real spies.
//!
//! Run with: `cargo test --test causal_queries`

mod common;

use common::init_test;
use spyglass::{
    Clock, InvocationRecord, Invocations, ManualClock, Spy, Value, occurred_chronologically,
    occurred_sequentially, sequential_chain,
};
use std::sync::Arc;

/// A spy whose timestamps are pinned by the returned clock.
fn pinned_spy() -> (Spy, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(0));
    let shared: Arc<dyn Clock> = Arc::clone(&clock) as Arc<dyn Clock>;
    (Spy::builder().clock(shared).build(), clock)
}

fn call_at(spy: &Spy, clock: &ManualClock, method: &str, ticks: u64) {
    clock.set(ticks);
    spy.handle(method, vec![]).unwrap();
}

#[test]
fn chronological_path_through_interleaved_spies() {
    init_test("chronological_path_through_interleaved_spies");
    let t0 = 1_000;
    let (a, a_clock) = pinned_spy();
    let (b, b_clock) = pinned_spy();
    let (c, c_clock) = pinned_spy();

    call_at(&a, &a_clock, "a", t0);
    call_at(&a, &a_clock, "a", t0 + 10);
    call_at(&b, &b_clock, "b", t0 + 30);
    call_at(&c, &c_clock, "c", t0 - 50);
    call_at(&c, &c_clock, "c", t0 + 35);

    let a_calls = a.reflector().by_name("a");
    let b_calls = b.reflector().by_name("b");
    let c_calls = c.reflector().by_name("c");
    let ordered = occurred_chronologically!(a_calls, b_calls, c_calls).unwrap();
    assert_with_log!(ordered, "a -> b -> c path", true, ordered);
}

#[test]
fn chronological_fails_when_middle_list_is_too_early() {
    init_test("chronological_fails_when_middle_list_is_too_early");
    let t0 = 1_000;
    let (a, a_clock) = pinned_spy();
    let (b, b_clock) = pinned_spy();
    let (c, c_clock) = pinned_spy();

    call_at(&a, &a_clock, "a", t0);
    call_at(&a, &a_clock, "a", t0 + 10);
    call_at(&b, &b_clock, "b", t0 - 100);
    call_at(&c, &c_clock, "c", t0 - 50);
    call_at(&c, &c_clock, "c", t0 + 35);

    let ordered = occurred_chronologically!(
        a.reflector().by_name("a"),
        b.reflector().by_name("b"),
        c.reflector().by_name("c")
    )
    .unwrap();
    assert_with_log!(!ordered, "b precedes every a", false, ordered);
}

#[test]
fn chronological_ignores_interleaved_calls() {
    init_test("chronological_ignores_interleaved_calls");
    let spy = Spy::anonymous();
    spy.handle("open", vec![]).unwrap();
    spy.handle("log", vec![]).unwrap();
    spy.handle("close", vec![]).unwrap();
    let calls = spy.reflector();

    assert!(occurred_chronologically!(calls.by_name("open"), calls.by_name("close")).unwrap());
    assert!(!occurred_chronologically!(calls.by_name("close"), calls.by_name("open")).unwrap());
}

#[test]
fn single_list_checks() {
    init_test("single_list_checks");
    let spy = Spy::anonymous();
    spy.handle("doFoo", vec![]).unwrap();
    let calls = spy.reflector();

    assert!(occurred_chronologically!(calls.by_name("doFoo")).unwrap());
    assert!(occurred_sequentially!(calls.by_name("doFoo")).unwrap());
    assert!(!occurred_chronologically!(calls.by_name("doBar")).unwrap());
    assert!(!occurred_sequentially!(calls.by_name("doBar")).unwrap());
}

#[test]
fn zero_lists_are_rejected() {
    init_test("zero_lists_are_rejected");
    assert!(occurred_chronologically!().unwrap_err().is_invalid_argument());
    assert!(occurred_sequentially!().unwrap_err().is_invalid_argument());
    let none: Vec<Invocations> = Vec::new();
    assert!(sequential_chain(&none).unwrap_err().is_invalid_argument());
}

#[test]
fn sequential_requires_adjacent_calls() {
    init_test("sequential_requires_adjacent_calls");
    let spy = Spy::anonymous();
    spy.handle("doFoo", vec![]).unwrap();
    spy.handle("doBar", vec![]).unwrap();
    spy.handle("doBaz", vec![]).unwrap();
    let calls = spy.reflector();

    assert!(
        occurred_sequentially!(calls.by_name("doFoo"), calls.by_name("doBar"), calls.by_name("doBaz"))
            .unwrap()
    );
    assert!(!occurred_sequentially!(calls.by_name("doFoo"), calls.by_name("doBaz")).unwrap());
    assert!(!occurred_sequentially!(calls.by_name("doBar"), calls.by_name("doFoo")).unwrap());
}

#[test]
fn interleaved_call_breaks_sequence() {
    init_test("interleaved_call_breaks_sequence");
    let spy = Spy::anonymous();
    spy.handle("doFoo", vec![]).unwrap();
    spy.handle("unrelated", vec![]).unwrap();
    spy.handle("doBar", vec![]).unwrap();
    let calls = spy.reflector();

    assert!(!occurred_sequentially!(calls.by_name("doFoo"), calls.by_name("doBar")).unwrap());
    assert!(occurred_chronologically!(calls.by_name("doFoo"), calls.by_name("doBar")).unwrap());
}

#[test]
fn later_repetition_restores_sequence() {
    init_test("later_repetition_restores_sequence");
    let spy = Spy::anonymous();
    spy.handle("doFoo", vec![]).unwrap();
    spy.handle("unrelated", vec![]).unwrap();
    spy.handle("doBar", vec![]).unwrap();
    spy.handle("doFoo", vec![]).unwrap();
    spy.handle("doBar", vec![]).unwrap();
    let calls = spy.reflector();

    let chain = sequential_chain(&[calls.by_name("doFoo"), calls.by_name("doBar")])
        .unwrap()
        .unwrap();
    let seqs: Vec<usize> = chain.iter().map(|r| r.id().seq()).collect();
    let all: Vec<usize> = calls.history().iter().map(|r| r.id().seq()).collect();
    assert_eq!(seqs, all[3..]);
}

#[test]
fn argument_filtered_lists_compose() {
    init_test("argument_filtered_lists_compose");
    let spy = Spy::anonymous();
    spy.handle("doBar", vec![Value::from(true)]).unwrap();
    spy.handle("doBar", vec![Value::from(false)]).unwrap();
    let calls = spy.reflector();

    let yes = calls.by_name_and_args("doBar", &[Value::from(true)]);
    let no = calls.by_name_and_args("doBar", &[Value::from(false)]);
    assert!(occurred_sequentially!(yes, no).unwrap());
    assert!(!occurred_sequentially!(no, yes).unwrap());
}

#[test]
fn separate_spies_never_chain() {
    init_test("separate_spies_never_chain");
    let first = Spy::anonymous();
    let second = Spy::anonymous();
    first.handle("doFoo", vec![]).unwrap();
    second.handle("doBar", vec![]).unwrap();

    let foo = first.reflector().by_name("doFoo");
    let bar = second.reflector().by_name("doBar");
    assert!(!occurred_sequentially!(foo, bar).unwrap());
    // Monotonic timestamps are comparable across spies.
    assert!(occurred_chronologically!(foo, bar).unwrap());
}

#[test]
fn plain_record_slices_are_accepted() {
    init_test("plain_record_slices_are_accepted");
    let spy = Spy::anonymous();
    spy.handle("a", vec![]).unwrap();
    spy.handle("b", vec![]).unwrap();

    let ledger = spy.ledger();
    let a: Vec<InvocationRecord> = ledger.records_for("a");
    let b: Vec<InvocationRecord> = ledger.records_for("b");
    assert!(occurred_sequentially(&[a.as_slice(), b.as_slice()]).unwrap());
    assert!(occurred_chronologically(&[a, b]).unwrap());
}
