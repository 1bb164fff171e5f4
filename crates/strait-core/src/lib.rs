//! strait-core — object model and class registry for the Strait embedded
//! runtime.
//!
//! This crate defines the managed side of the bridge: the dynamic
//! [`Value`] representation, the [`ClassRegistry`] with its explicit
//! class/method/constructor/field entries, the builders used to populate
//! it at startup, and the small pieces of state the invocation layer
//! threads through objects (callback slots, task handles).
//!
//! The invocation, marshaling, and callback machinery lives in
//! `strait-bridge`.

mod builder;
mod class;
mod error;
pub mod names;
mod pointer;
mod registry;
mod task;
mod value;

pub use builder::{ClassBuilder, FieldDef, MethodDef};
pub use class::{
    CallbackCapability, ClassEntry, ConstructorBody, ConstructorEntry, FieldEntry, MethodBody,
    MethodEntry, ParamSpec, ReturnSpec, ThreadAffinity, Visibility,
};
pub use error::{CallError, RegistryError};
pub use pointer::{CallbackSlot, NativePointer};
pub use registry::ClassRegistry;
pub use task::{TaskHandle, TaskState};
pub use value::{ArrayData, ObjectData, SequenceKind, Value};
