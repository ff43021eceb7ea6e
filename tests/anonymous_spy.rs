//! Anonymous spy behavior: responder binding, fallback, error propagation.
//!
//! Run with: `cargo test --test anonymous_spy`

mod common;

use common::init_test;
use spyglass::responder::{
    returns_in_sequence, returns_in_sequence_with_fallback, returns_static_value, throws,
    try_value_returned_by, value_returned_by,
};
use spyglass::{ErrorKind, Responder, Spy, Value, create_anonymous_spy, reflector};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
#[error("disk full")]
struct DiskFull;

#[test]
fn unbound_methods_return_null() {
    init_test("unbound_methods_return_null");
    let spy = create_anonymous_spy(Vec::<(String, Responder)>::new());

    let result = spy.handle("anything", vec![Value::from(1)]).unwrap();
    assert_with_log!(result.is_null(), "unbound method result", Value::Null, result);
    assert_eq!(reflector(&spy).call_count("anything"), 1);
}

#[test]
fn static_value_is_returned_every_time() {
    init_test("static_value_is_returned_every_time");
    let spy = create_anonymous_spy([("doFoo", returns_static_value("foobar"))]);

    for _ in 0..3 {
        assert_eq!(spy.handle("doFoo", vec![]).unwrap(), Value::from("foobar"));
    }
    assert!(spy.handle("doBar", vec![]).unwrap().is_null());
    assert_eq!(reflector(&spy).call_count("doFoo"), 3);
}

#[test]
fn thrown_error_reaches_caller_and_call_is_recorded() {
    init_test("thrown_error_reaches_caller_and_call_is_recorded");
    let spy = create_anonymous_spy([("save", throws(DiskFull))]);

    let err = spy.handle("save", vec![Value::from("a.txt")]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Responder);
    assert!(err.is_responder_error());
    assert_eq!(err.downcast_source::<DiskFull>().map(ToString::to_string).as_deref(), Some("disk full"));

    let saves = reflector(&spy).by_name("save");
    assert_with_log!(saves.len() == 1, "recorded despite error", 1, saves.len());
    assert_eq!(saves.first().unwrap().args(), [Value::from("a.txt")]);
}

#[test]
fn sequences_fall_back_once_exhausted() {
    init_test("sequences_fall_back_once_exhausted");
    let spy = Spy::builder()
        .responder("next", returns_in_sequence([1, 2]))
        .responder("status", returns_in_sequence_with_fallback(["starting"], "ready"))
        .build();

    let next: Vec<Value> = (0..4).map(|_| spy.handle("next", vec![]).unwrap()).collect();
    assert_eq!(next, [Value::from(1), Value::from(2), Value::Null, Value::Null]);

    let status: Vec<Value> = (0..3).map(|_| spy.handle("status", vec![]).unwrap()).collect();
    assert_eq!(status, [Value::from("starting"), Value::from("ready"), Value::from("ready")]);
}

#[test]
fn computed_entries_see_call_arguments() {
    init_test("computed_entries_see_call_arguments");
    let double = value_returned_by(|args| {
        Value::from(args.first().and_then(Value::as_i64).unwrap_or_default() * 2)
    });
    let spy = create_anonymous_spy([
        ("double", Responder::from(double.clone())),
        ("mixed", returns_in_sequence([double, Value::from("literal").into()])),
    ]);

    assert_eq!(spy.handle("double", vec![Value::from(21)]).unwrap(), Value::from(42));
    assert_eq!(spy.handle("mixed", vec![Value::from(5)]).unwrap(), Value::from(10));
    assert_eq!(spy.handle("mixed", vec![Value::from(5)]).unwrap(), Value::from("literal"));
}

#[test]
fn non_callable_returnable_is_invalid_argument() {
    init_test("non_callable_returnable_is_invalid_argument");
    let err = try_value_returned_by(&Value::from("not callable")).unwrap_err();
    assert!(err.is_invalid_argument());

    let wrapped = Value::object(returns_static_value(7));
    let returnable = try_value_returned_by(&wrapped).unwrap();
    let spy = create_anonymous_spy([("seven", returnable)]);
    assert_eq!(spy.handle("seven", vec![]).unwrap(), Value::from(7));
}

#[test]
fn custom_fallback_replaces_null() {
    init_test("custom_fallback_replaces_null");
    let spy = Spy::builder()
        .responder("known", returns_static_value(true))
        .fallback(returns_static_value("default"))
        .build();

    assert_eq!(spy.handle("known", vec![]).unwrap(), Value::from(true));
    assert_eq!(spy.handle("unknown", vec![]).unwrap(), Value::from("default"));
    assert!(spy.has_responder("known"));
    assert!(!spy.has_responder("unknown"));
}

#[test]
fn spies_keep_separate_ledgers() {
    init_test("spies_keep_separate_ledgers");
    let a = Spy::anonymous();
    let b = Spy::anonymous();
    a.handle("ping", vec![]).unwrap();
    a.handle("ping", vec![]).unwrap();
    b.handle("ping", vec![]).unwrap();

    assert_ne!(a.id(), b.id());
    assert_eq!(reflector(&a).call_count("ping"), 2);
    assert_eq!(reflector(&b).call_count("ping"), 1);
    let first_b = reflector(&b).by_name("ping").first().cloned().unwrap();
    assert_eq!(first_b.previous(), None);
}

#[test]
fn shared_spy_records_every_thread() {
    init_test("shared_spy_records_every_thread");
    let spy = Arc::new(create_anonymous_spy([("tick", returns_static_value(1))]));

    std::thread::scope(|scope| {
        for worker in 0..4 {
            let spy = Arc::clone(&spy);
            scope.spawn(move || {
                for i in 0..25 {
                    spy.handle("tick", vec![Value::from(worker), Value::from(i)]).unwrap();
                }
            });
        }
    });

    let calls = reflector(&spy);
    assert_eq!(calls.call_count("tick"), 100);
    assert_eq!(calls.history().len(), 100);
    let stamps: Vec<_> = calls.history().iter().map(|r| r.timestamp()).collect();
    assert!(stamps.windows(2).all(|w| w[0] < w[1]));
}
