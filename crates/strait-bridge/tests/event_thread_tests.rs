//! End-to-end tests for event-thread affinity marshaling.

mod common;

use std::thread;

use strait_bridge::{Error, Value};

use common::demo_runtime;

#[test]
fn test_operations_run_on_the_event_thread() {
    let rt = demo_runtime();
    let widget = rt.instantiate("ui.Widget", &[]).unwrap();

    let name = rt.invoke(&widget, "threadName", &[]).unwrap();
    assert_eq!(name.value(), Some(&Value::Str("strait-event".into())));
}

#[test]
fn test_all_callers_share_one_event_thread() {
    let rt = demo_runtime();
    let widget = rt.instantiate("ui.Widget", &[]).unwrap();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let rt = rt.clone();
        let widget = widget.clone();
        handles.push(thread::spawn(move || {
            rt.invoke(&widget, "threadName", &[])
                .unwrap()
                .value()
                .unwrap()
                .as_str()
                .unwrap()
                .to_string()
        }));
    }
    for handle in handles {
        assert_eq!(handle.join().unwrap(), "strait-event");
    }
}

#[test]
fn test_event_thread_errors_reraise_on_the_caller() {
    let rt = demo_runtime();
    let widget = rt.instantiate("ui.Widget", &[]).unwrap();

    let err = rt.invoke(&widget, "oops", &[]).unwrap_err();
    match err {
        Error::Invocation(message) => {
            assert!(message.contains("widget failure on the event thread"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_field_access_is_marshaled_too() {
    let rt = demo_runtime();
    let widget = rt.instantiate("ui.Widget", &[]).unwrap();

    // Construction runs on the calling thread; only operations marshal.
    let label = rt.field(&widget, "label").unwrap();
    let text = label.value().unwrap().as_str().unwrap().to_string();
    assert!(text.starts_with("built on"));
    assert!(!text.contains("strait-event"));
}

#[test]
fn test_affinity_propagates_through_results() {
    let rt = demo_runtime();
    let widget = rt.instantiate("ui.Widget", &[]).unwrap();

    // A cast keeps the value and re-tags the declared type; the result of
    // casting to an Event-affine class is itself marshaled.
    let same = rt.cast(&widget, "ui.Widget").unwrap();
    let name = rt.invoke(&same, "threadName", &[]).unwrap();
    assert_eq!(name.value(), Some(&Value::Str("strait-event".into())));
}
