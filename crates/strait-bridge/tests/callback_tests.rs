//! End-to-end tests for flavor-A callback channels.

mod common;

use std::time::Duration;

use strait_bridge::{Error, InstanceReceiver, InvocationArg, Value};

use common::demo_runtime;

#[test]
fn test_invoke_to_channel_delivers_in_order() {
    let rt = demo_runtime();
    let counter = rt.instantiate("demo.Counter", &[]).unwrap();
    let (pointer, receiver) = InstanceReceiver::channel();

    rt.invoke_to_channel(
        &counter,
        pointer,
        "emit",
        &[InvocationArg::new(&3, "int").unwrap()],
    )
    .unwrap();

    for expected in 0..3 {
        let delivered = receiver.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(delivered.value(), Some(&Value::Int(expected)));
        assert_eq!(delivered.class_name(), "lang.Integer");
    }
    assert!(receiver.try_recv().is_none());
}

#[test]
fn test_initialize_then_invoke_separately() {
    let rt = demo_runtime();
    let counter = rt.instantiate("demo.Counter", &[]).unwrap();
    let (pointer, receiver) = InstanceReceiver::channel();

    rt.initialize_callback_channel(&counter, pointer).unwrap();
    rt.invoke(&counter, "emit", &[InvocationArg::new(&1, "int").unwrap()])
        .unwrap();

    let delivered = receiver.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(delivered.value(), Some(&Value::Int(0)));
}

#[test]
fn test_emit_before_initialization_fails() {
    let rt = demo_runtime();
    let counter = rt.instantiate("demo.Counter", &[]).unwrap();

    let err = rt
        .invoke(&counter, "emit", &[InvocationArg::new(&1, "int").unwrap()])
        .unwrap_err();
    match err {
        Error::Invocation(message) => assert!(message.contains("no native pointer")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_initialize_requires_channel_capability() {
    let rt = demo_runtime();
    let child = rt.instantiate("demo.Child", &[]).unwrap();
    let (pointer, _receiver) = InstanceReceiver::channel();

    let err = rt.initialize_callback_channel(&child, pointer).unwrap_err();
    match err {
        Error::Invocation(message) => {
            assert!(message.contains("does not support channel callbacks"));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // Future-capable classes do not satisfy the channel capability either.
    let fetcher = rt.instantiate("demo.Fetcher", &[]).unwrap();
    assert!(rt.initialize_callback_channel(&fetcher, pointer).is_err());
}

#[test]
fn test_initialize_on_static_view_fails() {
    let rt = demo_runtime();
    let view = rt.static_view("demo.Counter").unwrap();
    let (pointer, _receiver) = InstanceReceiver::channel();

    let err = rt.initialize_callback_channel(&view, pointer).unwrap_err();
    assert!(err.to_string().contains("not instantiated"));
}

#[test]
fn test_reinitialization_redirects_deliveries() {
    let rt = demo_runtime();
    let counter = rt.instantiate("demo.Counter", &[]).unwrap();

    let (first_pointer, first) = InstanceReceiver::channel();
    rt.initialize_callback_channel(&counter, first_pointer).unwrap();

    let (second_pointer, second) = InstanceReceiver::channel();
    rt.initialize_callback_channel(&counter, second_pointer).unwrap();

    rt.invoke(&counter, "emit", &[InvocationArg::new(&1, "int").unwrap()])
        .unwrap();

    // Last initialization wins.
    assert!(second.recv_timeout(Duration::from_secs(5)).is_ok());
    assert!(first.try_recv().is_none());
}
