//! strait-bridge — invocation and marshaling bridge between a native host
//! and the Strait embedded runtime.
//!
//! The host and the managed runtime share one address space. The host
//! instantiates managed objects, invokes methods on them (overloads are
//! resolved from the runtime types of the materialized arguments), reads
//! fields, casts, and exchanges values either as live [`Instance`] handles
//! or as serialized payloads. Asynchronous results flow back over opaque
//! channel pointers.
//!
//! # Example
//!
//! ```ignore
//! use strait_bridge::{InvocationArg, Runtime};
//! use strait_core::{ClassBuilder, MethodDef, ParamSpec, ReturnSpec, Value};
//!
//! let rt = Runtime::new();
//! rt.register(
//!     ClassBuilder::new("demo.Greeter")
//!         .constructor(vec![], |_| Ok(Value::object("demo.Greeter", vec![])))
//!         .method(
//!             MethodDef::new("greet")
//!                 .param(ParamSpec::class("lang.String"))
//!                 .returns(ReturnSpec::of("lang.String"))
//!                 .body(|_recv, args| {
//!                     Ok(Value::Str(format!("hello, {}", args[0].as_str().unwrap())))
//!                 }),
//!         ),
//! )?;
//!
//! let greeter = rt.instantiate("demo.Greeter", &[])?;
//! let greeting = rt.invoke(&greeter, "greet", &[InvocationArg::new("world", "lang.String")?])?;
//! assert_eq!(greeting.value().unwrap().as_str(), Some("hello, world"));
//! ```

mod callback;
mod codec;
pub mod errors;
mod event;
mod instance;
mod invocation_arg;
mod poll;
mod resolve;
mod runtime;

pub use callback::{
    complete_future, deliver_to_channel, fail_future, ChannelBridge, FutureBridge, FutureReceiver,
    InstanceReceiver,
};
pub use codec::{Codec, DecodedSequence, JsonCodec};
pub use errors::{Error, Result};
pub use instance::Instance;
pub use invocation_arg::{materialize, ArgOrigin, GeneratedArg, InvocationArg, CONTENTS_ARRAY};
pub use poll::PolledFuture;
pub use resolve::{MethodResolver, ResolvedConstructor, ResolvedMethod};
pub use runtime::{Runtime, RuntimeBuilder};

// The core object model, re-exported for hosts that register classes.
pub use strait_core::{
    names, CallError, CallbackCapability, ClassBuilder, ClassRegistry, FieldDef, MethodDef,
    NativePointer, ParamSpec, ReturnSpec, TaskHandle, TaskState, ThreadAffinity, Value,
};
