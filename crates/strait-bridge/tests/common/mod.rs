//! Shared fixture hierarchy for the integration suites.
//!
//! ```text
//! lang.Object
//!   └── demo.Grandparent           legacy() -> lang.String
//!         └── demo.Parent          implements demo.Resettable
//!               └── demo.Child     implements demo.Speaker
//! demo.Counter                     channel callbacks
//! demo.Fetcher                     future callbacks
//! ui.Widget                        event-thread affinity
//! ```

use std::thread;
use std::time::Duration;

use strait_bridge::{
    names, CallError, CallbackCapability, ChannelBridge, ClassBuilder, FieldDef, FutureBridge,
    MethodDef, ParamSpec, ReturnSpec, Runtime, TaskHandle, ThreadAffinity, Value,
};

fn child_object(fields: Vec<(String, Value)>) -> Value {
    Value::object("demo.Child", fields)
}

pub fn demo_runtime() -> Runtime {
    let rt = Runtime::new();

    rt.register(
        ClassBuilder::interface("demo.Speaker").method(
            MethodDef::new("greet")
                .returns(ReturnSpec::of(names::STRING))
                .body(|_recv, _args| Ok(Value::Str("hello from a speaker".to_string()))),
        ),
    )
    .unwrap();

    rt.register(
        ClassBuilder::interface("demo.Resettable").method(MethodDef::new("reset")),
    )
    .unwrap();

    rt.register(
        ClassBuilder::new("demo.Grandparent").method(
            MethodDef::new("legacy")
                .returns(ReturnSpec::of(names::STRING))
                .body(|_recv, _args| Ok(Value::Str("from the grandparent".to_string()))),
        ),
    )
    .unwrap();

    rt.register(
        ClassBuilder::new("demo.Parent")
            .extends("demo.Grandparent")
            .implements("demo.Resettable"),
    )
    .unwrap();

    rt.register(
        ClassBuilder::new("demo.Child")
            .extends("demo.Parent")
            .implements("demo.Speaker")
            .field(FieldDef::new("value", "int"))
            .field(FieldDef::new("from", names::STRING))
            .field(FieldDef::new("secret", names::STRING).private())
            // Declaration order matters: with boxing equivalence both
            // constructors match an int argument, and the first one wins.
            .constructor(vec![ParamSpec::class("int")], |args| {
                Ok(child_object(vec![
                    ("value".to_string(), args[0].clone()),
                    ("from".to_string(), Value::Str("primitive".to_string())),
                ]))
            })
            .constructor(vec![ParamSpec::class(names::INTEGER)], |args| {
                Ok(child_object(vec![
                    ("value".to_string(), args[0].clone()),
                    ("from".to_string(), Value::Str("boxed".to_string())),
                ]))
            })
            .constructor(vec![], |_args| {
                Ok(child_object(vec![("value".to_string(), Value::Int(0))]))
            })
            .method(
                MethodDef::new("getValue")
                    .returns(ReturnSpec::of("int"))
                    .body(|recv, _args| {
                        let object = recv.and_then(Value::as_object).ok_or_else(|| {
                            CallError::new("getValue needs an instantiated receiver")
                        })?;
                        Ok(object.get_field("value").unwrap_or(Value::Null))
                    }),
            )
            .method(
                MethodDef::new("echo")
                    .param(ParamSpec::class("int"))
                    .returns(ReturnSpec::of("int"))
                    .body(|_recv, args| Ok(args[0].clone())),
            )
            .method(
                MethodDef::new("echo")
                    .param(ParamSpec::class(names::STRING))
                    .returns(ReturnSpec::of(names::STRING))
                    .body(|_recv, args| Ok(args[0].clone())),
            )
            .method(
                MethodDef::new("join")
                    .param(ParamSpec::GenericArray)
                    .returns(ReturnSpec::of(names::STRING))
                    .body(|_recv, args| {
                        let array = args[0]
                            .as_array()
                            .ok_or_else(|| CallError::new("join expects an array"))?;
                        let joined = array
                            .items()
                            .iter()
                            .filter_map(|item| item.as_str().map(str::to_string))
                            .collect::<Vec<_>>()
                            .join(",");
                        Ok(Value::Str(joined))
                    }),
            )
            .method(
                MethodDef::new("names")
                    .returns(ReturnSpec::parameterized(
                        names::LIST,
                        vec![names::STRING.to_string()],
                    ))
                    .body(|_recv, _args| {
                        Ok(Value::list(
                            names::STRING,
                            vec![Value::Str("a".to_string()), Value::Str("b".to_string())],
                        ))
                    }),
            )
            .method(
                MethodDef::new("zero")
                    .as_static()
                    .returns(ReturnSpec::of("int"))
                    .body(|_recv, _args| Ok(Value::Int(0))),
            )
            .method(
                MethodDef::new("explode").body(|_recv, _args| {
                    Err(CallError::with_cause(
                        "explode failed",
                        CallError::new("wired to fail"),
                    ))
                }),
            ),
    )
    .unwrap();

    rt.register(
        ClassBuilder::new("demo.Counter")
            .callbacks(CallbackCapability::Channel)
            .constructor(vec![], |_args| Ok(Value::object("demo.Counter", vec![])))
            .method(
                MethodDef::new("emit")
                    .param(ParamSpec::class("int"))
                    .body(|recv, args| {
                        let receiver =
                            recv.ok_or_else(|| CallError::new("emit needs a receiver"))?;
                        let bridge = ChannelBridge::of(receiver)
                            .map_err(|e| CallError::new(e.to_string()))?;
                        let count = args[0]
                            .as_int()
                            .ok_or_else(|| CallError::new("emit expects an int"))?;
                        for i in 0..count {
                            bridge
                                .deliver(Value::Int(i))
                                .map_err(|e| CallError::new(e.to_string()))?;
                        }
                        Ok(Value::Null)
                    }),
            ),
    )
    .unwrap();

    rt.register(
        ClassBuilder::new("demo.Fetcher")
            .callbacks(CallbackCapability::Future)
            .constructor(vec![], |_args| Ok(Value::object("demo.Fetcher", vec![])))
            .method(
                MethodDef::new("fetch")
                    .param(ParamSpec::class(names::STRING))
                    .returns(ReturnSpec::of(names::TASK))
                    .body(|_recv, args| {
                        let url = args[0]
                            .as_str()
                            .ok_or_else(|| CallError::new("fetch expects a url"))?
                            .to_string();
                        let task = TaskHandle::pending();
                        let work = task.clone();
                        thread::spawn(move || {
                            thread::sleep(Duration::from_millis(5));
                            work.complete(Value::Str(format!("fetched {}", url)));
                        });
                        Ok(Value::Task(task))
                    }),
            )
            .method(
                MethodDef::new("fetchBroken")
                    .returns(ReturnSpec::of(names::TASK))
                    .body(|_recv, _args| {
                        let task = TaskHandle::pending();
                        let work = task.clone();
                        thread::spawn(move || {
                            work.fail(CallError::new("the backend is down"));
                        });
                        Ok(Value::Task(task))
                    }),
            )
            .method(
                MethodDef::new("fetchAbandoned")
                    .returns(ReturnSpec::of(names::TASK))
                    .body(|_recv, _args| {
                        let task = TaskHandle::pending();
                        let work = task.clone();
                        thread::spawn(move || {
                            work.cancel();
                        });
                        Ok(Value::Task(task))
                    }),
            )
            .method(
                MethodDef::new("fetchEager").body(|recv, _args| {
                    // Completes the future itself instead of handing back
                    // a task handle.
                    let receiver =
                        recv.ok_or_else(|| CallError::new("fetchEager needs a receiver"))?;
                    FutureBridge::of(receiver)
                        .and_then(|bridge| bridge.succeed(Some(Value::Int(7))))
                        .map_err(|e| CallError::new(e.to_string()))?;
                    Ok(Value::Null)
                }),
            ),
    )
    .unwrap();

    rt.register(
        ClassBuilder::new("ui.Widget")
            .affinity(ThreadAffinity::Event)
            .field(FieldDef::new("label", names::STRING))
            .constructor(vec![], |_args| {
                Ok(Value::object(
                    "ui.Widget",
                    vec![(
                        "label".to_string(),
                        Value::Str(format!(
                            "built on {}",
                            thread::current().name().unwrap_or("unnamed")
                        )),
                    )],
                ))
            })
            .method(
                MethodDef::new("threadName")
                    .returns(ReturnSpec::of(names::STRING))
                    .body(|_recv, _args| {
                        Ok(Value::Str(
                            thread::current().name().unwrap_or("unnamed").to_string(),
                        ))
                    }),
            )
            .method(
                MethodDef::new("oops").body(|_recv, _args| {
                    Err(CallError::new("widget failure on the event thread"))
                }),
            ),
    )
    .unwrap();

    rt
}
