//! Ledger queries through the reflector facade.
//!
//! Run with: `cargo test --test reflector_queries`

mod common;

use common::init_test;
use spyglass::matcher::{
    anything, contains_string, greater_than, has_item, instance_of, not, null_value, predicate,
    same_instance,
};
use spyglass::responder::returns_static_value;
use spyglass::{ObjectRef, Reflector, Responder, Spy, Value, create_anonymous_spy, reflector};

fn foo_bar_spy() -> Spy {
    let spy = create_anonymous_spy(Vec::<(String, Responder)>::new());
    spy.handle("doFoo", vec![]).unwrap();
    spy.handle("doFoo", vec![Value::from(true), Value::from(10)]).unwrap();
    spy.handle("doBar", vec![Value::from(false)]).unwrap();
    spy.handle("doBar", vec![Value::from(true)]).unwrap();
    spy
}

#[test]
fn by_name_returns_calls_in_order() {
    init_test("by_name_returns_calls_in_order");
    let calls = reflector(&foo_bar_spy());

    let foos = calls.by_name("doFoo");
    assert_with_log!(foos.len() == 2, "doFoo count", 2, foos.len());
    assert!(foos.get(0).unwrap().args().is_empty());
    assert_eq!(foos.get(1).unwrap().args(), [Value::from(true), Value::from(10)]);
    assert!(foos.get(0).unwrap().timestamp() < foos.get(1).unwrap().timestamp());
    assert!(calls.by_name("doBaz").is_empty());
}

#[test]
fn by_name_and_args_filters_exact_values() {
    init_test("by_name_and_args_filters_exact_values");
    let calls = reflector(&foo_bar_spy());

    let exact = calls.by_name_and_args("doFoo", &[Value::from(true), Value::from(10)]);
    assert_eq!(exact.len(), 1);

    let bar_false = calls.by_name_and_args("doBar", &[Value::from(false)]);
    let bar_true = calls.by_name_and_args("doBar", &[Value::from(true)]);
    assert_eq!(bar_false.len(), 1);
    assert_eq!(bar_true.len(), 1);
    assert!(bar_false.iter().all(|r| !bar_true.contains(r.id())));

    assert!(calls.by_name_and_args("doFoo", &[Value::from(true)]).is_empty());
    assert!(calls.by_name_and_args("doFoo", &[Value::from(1), Value::from(10)]).is_empty());
}

#[test]
fn null_results_are_still_counted() {
    init_test("null_results_are_still_counted");
    let spy = create_anonymous_spy([("foobar", returns_static_value(()))]);
    spy.handle("foobar", vec![]).unwrap();
    spy.handle("doBar", vec![Value::Null]).unwrap();
    spy.handle("doBar", vec![]).unwrap();

    let calls = reflector(&spy);
    assert_eq!(calls.call_count("foobar"), 1);
    assert_eq!(calls.call_count("doBar"), 2);
    assert_eq!(calls.by_name_and_args("doBar", &[Value::Null]).len(), 1);
    assert_eq!(calls.by_name_and_args("doBar", &[]).len(), 1);
}

#[test]
fn method_names_are_case_sensitive() {
    init_test("method_names_are_case_sensitive");
    let calls = reflector(&foo_bar_spy());
    assert!(calls.by_name("dofoo").is_empty());
    assert!(calls.by_name("DOBAR").is_empty());
}

#[test]
fn matchers_in_queries() {
    init_test("matchers_in_queries");
    let spy = Spy::anonymous();
    spy.handle("log", vec![Value::from("connection refused"), Value::from(3)]).unwrap();
    spy.handle("log", vec![Value::from("retrying"), Value::from(12)]).unwrap();
    spy.handle("log", vec![Value::from("ok"), Value::Null]).unwrap();
    let calls = spy.reflector();

    assert_eq!(calls.by_name_and_args("log", &[anything(), anything()]).len(), 3);
    assert_eq!(calls.by_name_and_args("log", &[contains_string("re"), anything()]).len(), 2);
    assert_eq!(calls.by_name_and_args("log", &[anything(), greater_than(5.0)]).len(), 1);
    assert_eq!(calls.by_name_and_args("log", &[anything(), null_value()]).len(), 1);
    assert_eq!(calls.by_name_and_args("log", &[not("ok"), anything()]).len(), 2);

    let even = predicate("an even number", |v| v.as_i64().is_some_and(|n| n % 2 == 0));
    assert_eq!(calls.by_name_and_args("log", &[anything(), even]).len(), 1);
}

#[test]
fn matchers_see_lists_and_objects() {
    init_test("matchers_see_lists_and_objects");
    #[derive(Debug)]
    struct Connection;

    let conn = ObjectRef::new(Connection);
    let other = ObjectRef::new(Connection);
    let spy = Spy::anonymous();
    spy.handle("attach", vec![Value::from(conn.clone())]).unwrap();
    spy.handle("attach", vec![Value::from(other)]).unwrap();
    spy.handle("tags", vec![Value::from(vec!["a", "b"])]).unwrap();
    let calls = spy.reflector();

    assert_eq!(calls.by_name_and_args("attach", &[same_instance(&conn)]).len(), 1);
    assert_eq!(calls.by_name_and_args("attach", &[instance_of::<Connection>()]).len(), 2);
    assert_eq!(calls.by_name_and_args("attach", &[Value::from(conn)]).len(), 1);
    assert_eq!(calls.by_name_and_args("tags", &[has_item("b")]).len(), 1);
    assert!(calls.by_name_and_args("tags", &[has_item("z")]).is_empty());
}

#[test]
fn reflector_is_a_snapshot() {
    init_test("reflector_is_a_snapshot");
    let spy = foo_bar_spy();
    let before: Reflector = reflector(&spy);
    spy.handle("doFoo", vec![]).unwrap();

    assert_eq!(before.call_count("doFoo"), 2);
    assert_eq!(reflector(&spy).call_count("doFoo"), 3);
    assert_eq!(before.ledger().len(), 4);
}

#[test]
fn describe_truncates_at_render_limit() {
    init_test("describe_truncates_at_render_limit");
    let calls = reflector(&foo_bar_spy()).with_render_limit(2);
    let text = calls.describe();

    assert!(text.starts_with("4 call(s) recorded"));
    assert!(text.contains("doFoo()"));
    assert!(text.contains("doFoo(true, 10)"));
    assert!(!text.contains("doBar(false)"));
    assert!(text.ends_with("... 2 more"));
    assert_eq!(calls.to_string(), text);
}

#[test]
fn to_json_includes_calls() {
    init_test("to_json_includes_calls");
    let calls = reflector(&foo_bar_spy());
    let json = calls.to_json();

    let records = json["records"].as_array().unwrap();
    assert_eq!(records.len(), 4);
    assert_eq!(records[1]["call"]["method_name"], "doFoo");
    assert_eq!(records[1]["call"]["args"], serde_json::json!([true, 10]));
    assert!(records[0]["previous"].is_null());
    assert!(!records[1]["previous"].is_null());
}
