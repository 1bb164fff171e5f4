//! The embedded-runtime handle and its operations.
//!
//! A [`Runtime`] owns the class registry, the configured codec, and the
//! lazily started event thread. It is cheap to clone and safe to share
//! across threads. Every operation of the bridge — instantiation, method
//! invocation, field access, casting, callback wiring — is a method here
//! taking the target [`Instance`], so handles stay plain data.

use std::sync::Arc;

use log::debug;
use once_cell::sync::OnceCell;

use strait_core::{
    names, CallbackCapability, ClassBuilder, ClassRegistry, NativePointer, RegistryError,
    ReturnSpec, SequenceKind, ThreadAffinity, Value, Visibility,
};

use crate::codec::{Codec, JsonCodec};
use crate::errors::{Error, Result};
use crate::event::EventExecutor;
use crate::instance::Instance;
use crate::invocation_arg::{materialize, InvocationArg, CONTENTS_ARRAY};
use crate::poll::PolledFuture;
use crate::resolve::MethodResolver;

struct RuntimeInner {
    registry: Arc<ClassRegistry>,
    codec: Arc<dyn Codec>,
    event: OnceCell<EventExecutor>,
}

/// Handle to an embedded managed runtime.
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

/// Explicit startup configuration for a [`Runtime`].
pub struct RuntimeBuilder {
    registry: Arc<ClassRegistry>,
    codec: Option<Arc<dyn Codec>>,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        RuntimeBuilder {
            registry: Arc::new(ClassRegistry::with_builtins()),
            codec: None,
        }
    }

    /// Use a codec other than the default [`JsonCodec`].
    pub fn codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = Some(codec);
        self
    }

    pub fn build(self) -> Runtime {
        let codec = self
            .codec
            .unwrap_or_else(|| Arc::new(JsonCodec::new(self.registry.clone())));
        Runtime {
            inner: Arc::new(RuntimeInner {
                registry: self.registry,
                codec,
                event: OnceCell::new(),
            }),
        }
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// A runtime with the default configuration.
    pub fn new() -> Runtime {
        RuntimeBuilder::new().build()
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// The class registry.
    pub fn registry(&self) -> &ClassRegistry {
        &self.inner.registry
    }

    /// Register a class.
    pub fn register(&self, builder: ClassBuilder) -> std::result::Result<(), RegistryError> {
        builder.register(&self.inner.registry)
    }

    // ========================================================================
    // Instance factory
    // ========================================================================

    /// Construct an instance of `class_name`, resolving a constructor
    /// overload from the materialized argument types.
    pub fn instantiate(&self, class_name: &str, args: &[InvocationArg]) -> Result<Instance> {
        debug!("instantiating {}", class_name);
        let generated = materialize(args, self.inner.codec.as_ref(), &self.inner.registry)?;
        let arg_types: Vec<String> = generated.iter().map(|g| g.class_name.clone()).collect();
        let resolved =
            MethodResolver::new(&self.inner.registry).resolve_constructor(class_name, &arg_types)?;
        let values: Vec<Value> = generated.into_iter().map(|g| g.value).collect();
        let value = (resolved.constructor.body)(&values).map_err(|e| {
            Error::Instantiation(format!(
                "cannot create instance of {}: {}",
                class_name,
                e.trace()
            ))
        })?;
        Ok(Instance::new(
            Some(value),
            class_name,
            Vec::new(),
            self.inner.registry.affinity_of(class_name),
        ))
    }

    /// The static view of a class: no managed value, method calls resolve
    /// to static methods.
    pub fn static_view(&self, class_name: &str) -> Result<Instance> {
        if self.inner.registry.lookup(class_name).is_none() {
            return Err(Error::Instantiation(format!(
                "cannot create the static view of {}: the class is not registered",
                class_name
            )));
        }
        Ok(Instance::new(
            None,
            class_name,
            Vec::new(),
            self.inner.registry.affinity_of(class_name),
        ))
    }

    /// Create a managed array of `class_name` from the given arguments.
    /// All elements must materialize to exactly that class, unless
    /// `class_name` is the reserved [`CONTENTS_ARRAY`] marker, in which
    /// case the element class is taken from the decoded elements.
    pub fn create_array(&self, class_name: &str, args: &[InvocationArg]) -> Result<Instance> {
        self.create_sequence(class_name, args, SequenceKind::Array)
    }

    /// Create a managed list; same element rules as [`Runtime::create_array`].
    /// The resulting handle carries the element class as a generic type
    /// argument.
    pub fn create_list(&self, class_name: &str, args: &[InvocationArg]) -> Result<Instance> {
        self.create_sequence(class_name, args, SequenceKind::List)
    }

    fn create_sequence(
        &self,
        class_name: &str,
        args: &[InvocationArg],
        kind: SequenceKind,
    ) -> Result<Instance> {
        let generated = materialize(args, self.inner.codec.as_ref(), &self.inner.registry)?;
        let is_marker = class_name == CONTENTS_ARRAY;
        let element_class = if is_marker {
            generated
                .first()
                .map(|g| g.class_name.clone())
                .unwrap_or_else(|| names::OBJECT.to_string())
        } else {
            class_name.to_string()
        };

        if !is_marker {
            if !self.inner.registry.is_known(&element_class) {
                return Err(Error::Instantiation(format!(
                    "cannot create a sequence of {}: the class is not registered",
                    element_class
                )));
            }
            if let Some(mismatch) = generated.iter().find(|g| g.class_name != element_class) {
                return Err(Error::InvalidArgument(format!(
                    "cannot create a sequence of {}: an element of class {} does not match",
                    element_class, mismatch.class_name
                )));
            }
        }

        let items: Vec<Value> = generated.into_iter().map(|g| g.value).collect();
        Ok(match kind {
            SequenceKind::Array => Instance::new(
                Some(Value::array(element_class.clone(), items)),
                names::array_of(&element_class),
                Vec::new(),
                ThreadAffinity::Any,
            ),
            SequenceKind::List => Instance::new(
                Some(Value::list(element_class.clone(), items)),
                names::LIST,
                vec![element_class],
                ThreadAffinity::Any,
            ),
        })
    }

    // ========================================================================
    // Instance operations
    // ========================================================================

    /// Invoke a method on the instance's value, resolving the overload
    /// against the value's concrete runtime class.
    pub fn invoke(
        &self,
        target: &Instance,
        method_name: &str,
        args: &[InvocationArg],
    ) -> Result<Instance> {
        if target.affinity() == ThreadAffinity::Event {
            let rt = self.clone();
            let target = target.clone();
            let method_name = method_name.to_string();
            let args = args.to_vec();
            return self
                .event()?
                .run(move || rt.invoke_inline(&target, &method_name, &args))?;
        }
        self.invoke_inline(target, method_name, args)
    }

    /// Invoke a static method, resolving against the declared type. No
    /// managed value is required.
    pub fn invoke_static(
        &self,
        target: &Instance,
        method_name: &str,
        args: &[InvocationArg],
    ) -> Result<Instance> {
        if target.affinity() == ThreadAffinity::Event {
            let rt = self.clone();
            let target = target.clone();
            let method_name = method_name.to_string();
            let args = args.to_vec();
            return self
                .event()?
                .run(move || rt.invoke_static_inline(&target, &method_name, &args))?;
        }
        self.invoke_static_inline(target, method_name, args)
    }

    /// Read a public field, walking the hierarchy upward from the value's
    /// concrete class.
    pub fn field(&self, target: &Instance, field_name: &str) -> Result<Instance> {
        if target.affinity() == ThreadAffinity::Event {
            let rt = self.clone();
            let target = target.clone();
            let field_name = field_name.to_string();
            return self
                .event()?
                .run(move || rt.field_inline(&target, &field_name))?;
        }
        self.field_inline(target, field_name)
    }

    /// Check at runtime that the value can be viewed as `class_name` and
    /// return a handle re-declared as that type.
    pub fn cast(&self, target: &Instance, class_name: &str) -> Result<Instance> {
        if target.affinity() == ThreadAffinity::Event {
            let rt = self.clone();
            let target = target.clone();
            let class_name = class_name.to_string();
            return self
                .event()?
                .run(move || rt.cast_inline(&target, &class_name))?;
        }
        self.cast_inline(target, class_name)
    }

    /// Serialize the instance's current value through the codec.
    pub fn encode_instance(&self, target: &Instance) -> Result<String> {
        let value = target.value().cloned().unwrap_or(Value::Null);
        self.inner.codec.encode(&value)
    }

    /// Wire a callback channel pointer into the target value, then invoke
    /// the method, discarding its result; the real results arrive through
    /// the channel.
    pub fn invoke_to_channel(
        &self,
        target: &Instance,
        pointer: NativePointer,
        method_name: &str,
        args: &[InvocationArg],
    ) -> Result<()> {
        if target.affinity() == ThreadAffinity::Event {
            let rt = self.clone();
            let target = target.clone();
            let method_name = method_name.to_string();
            let args = args.to_vec();
            return self
                .event()?
                .run(move || rt.invoke_to_channel_inline(&target, pointer, &method_name, &args))?;
        }
        self.invoke_to_channel_inline(target, pointer, method_name, args)
    }

    /// Wire a callback channel pointer into the target value without
    /// invoking anything.
    pub fn initialize_callback_channel(
        &self,
        target: &Instance,
        pointer: NativePointer,
    ) -> Result<()> {
        if target.affinity() == ThreadAffinity::Event {
            let rt = self.clone();
            let target = target.clone();
            return self
                .event()?
                .run(move || rt.initialize_callback_channel_inline(&target, pointer))?;
        }
        self.initialize_callback_channel_inline(target, pointer)
    }

    /// Arm the target's future callback, invoke the method, and if it
    /// returns a task handle, poll it to completion in the background.
    /// The terminal result arrives through the future pointer.
    pub fn invoke_async(
        &self,
        target: &Instance,
        pointer: NativePointer,
        method_name: &str,
        args: &[InvocationArg],
    ) -> Result<()> {
        if target.affinity() == ThreadAffinity::Event {
            let rt = self.clone();
            let target = target.clone();
            let method_name = method_name.to_string();
            let args = args.to_vec();
            return self
                .event()?
                .run(move || rt.invoke_async_inline(&target, pointer, &method_name, &args))?;
        }
        self.invoke_async_inline(target, pointer, method_name, args)
    }

    // ========================================================================
    // Inline implementations (run on the calling or the event thread)
    // ========================================================================

    fn invoke_inline(
        &self,
        target: &Instance,
        method_name: &str,
        args: &[InvocationArg],
    ) -> Result<Instance> {
        let value = target.value().cloned().ok_or_else(|| {
            Error::Invocation(format!(
                "cannot invoke {} on {}: the handle is not instantiated",
                method_name,
                target.class_name()
            ))
        })?;
        // Resolution runs against the value's concrete runtime class; the
        // declared type only stands in when the value is the null sentinel.
        let owner = if value.is_null() {
            target.class_name().to_string()
        } else {
            value.concrete_class()
        };
        debug!("invoking {} on {}", method_name, owner);

        let generated = materialize(args, self.inner.codec.as_ref(), &self.inner.registry)?;
        let arg_types: Vec<String> = generated.iter().map(|g| g.class_name.clone()).collect();
        let resolved =
            MethodResolver::new(&self.inner.registry).resolve(&owner, method_name, &arg_types)?;
        let values: Vec<Value> = generated.into_iter().map(|g| g.value).collect();

        let result = (resolved.method.body)(Some(&value), &values).map_err(|e| {
            Error::Invocation(format!(
                "error while invoking {} of {}: {}",
                method_name,
                resolved.owner,
                e.trace()
            ))
        })?;
        Ok(self.wrap_result(result, &resolved.method.ret))
    }

    fn invoke_static_inline(
        &self,
        target: &Instance,
        method_name: &str,
        args: &[InvocationArg],
    ) -> Result<Instance> {
        let owner = target.class_name();
        debug!("invoking static {} on {}", method_name, owner);

        let generated = materialize(args, self.inner.codec.as_ref(), &self.inner.registry)?;
        let arg_types: Vec<String> = generated.iter().map(|g| g.class_name.clone()).collect();
        let resolved =
            MethodResolver::new(&self.inner.registry).resolve(owner, method_name, &arg_types)?;
        let values: Vec<Value> = generated.into_iter().map(|g| g.value).collect();

        let result = (resolved.method.body)(None, &values).map_err(|e| {
            Error::Invocation(format!(
                "error while invoking static {} of {}: {}",
                method_name,
                resolved.owner,
                e.trace()
            ))
        })?;
        Ok(self.wrap_result(result, &resolved.method.ret))
    }

    fn field_inline(&self, target: &Instance, field_name: &str) -> Result<Instance> {
        let value = target.value().cloned().ok_or_else(|| {
            Error::Invocation(format!(
                "cannot access field {} on the static view of {}",
                field_name,
                target.class_name()
            ))
        })?;
        let object = value.as_object().ok_or_else(|| {
            Error::Invocation(format!(
                "cannot access field {}: values of {} have no fields",
                field_name,
                value.concrete_class()
            ))
        })?;

        let mut current = object.class_name().to_string();
        while let Some(entry) = self.inner.registry.lookup(&current) {
            if let Some(field) = entry.field(field_name) {
                if field.visibility != Visibility::Public {
                    return Err(Error::Invocation(format!(
                        "field {} of {} is not accessible",
                        field_name, current
                    )));
                }
                let field_value = object.get_field(field_name).unwrap_or(Value::Null);
                let affinity = self.inner.registry.affinity_of(&field.class_name);
                return Ok(Instance::new(
                    Some(field_value),
                    field.class_name.clone(),
                    Vec::new(),
                    affinity,
                ));
            }
            match entry.superclass() {
                Some(superclass) => current = superclass.to_string(),
                None => break,
            }
        }
        Err(Error::Invocation(format!(
            "no field {} in {} or its ancestors",
            field_name,
            object.class_name()
        )))
    }

    fn cast_inline(&self, target: &Instance, class_name: &str) -> Result<Instance> {
        let value = target.value().cloned().ok_or_else(|| {
            Error::Invocation(format!(
                "cannot cast the static view of {}",
                target.class_name()
            ))
        })?;
        if !self.inner.registry.is_known(class_name) {
            return Err(Error::Invocation(format!(
                "cannot cast to {}: the class is not registered",
                class_name
            )));
        }
        // The null sentinel casts to any reference type.
        if value.is_null()
            || self
                .inner
                .registry
                .assignable_from(class_name, &value.concrete_class())
        {
            let affinity = self.inner.registry.affinity_of(class_name);
            Ok(Instance::new(Some(value), class_name, Vec::new(), affinity))
        } else {
            Err(Error::Invocation(format!(
                "cannot cast {} to {}",
                value.concrete_class(),
                class_name
            )))
        }
    }

    fn invoke_to_channel_inline(
        &self,
        target: &Instance,
        pointer: NativePointer,
        method_name: &str,
        args: &[InvocationArg],
    ) -> Result<()> {
        self.initialize_callback_channel_inline(target, pointer)?;
        self.invoke_inline(target, method_name, args)?;
        Ok(())
    }

    fn initialize_callback_channel_inline(
        &self,
        target: &Instance,
        pointer: NativePointer,
    ) -> Result<()> {
        if self.inner.registry.capability_of(target.class_name()) != CallbackCapability::Channel {
            return Err(Error::Invocation(format!(
                "cannot initialize a callback channel for {}: the class does not support channel callbacks",
                target.class_name()
            )));
        }
        let object = target.value().and_then(Value::as_object).ok_or_else(|| {
            Error::Invocation(format!(
                "cannot initialize a callback channel for {}: the handle is not instantiated",
                target.class_name()
            ))
        })?;
        object.channel_slot().arm(pointer);
        Ok(())
    }

    fn invoke_async_inline(
        &self,
        target: &Instance,
        pointer: NativePointer,
        method_name: &str,
        args: &[InvocationArg],
    ) -> Result<()> {
        if self.inner.registry.capability_of(target.class_name()) != CallbackCapability::Future {
            return Err(Error::Invocation(format!(
                "cannot invoke {} asynchronously: {} does not support future callbacks",
                method_name,
                target.class_name()
            )));
        }
        let value = target.value().cloned().ok_or_else(|| {
            Error::Invocation(format!(
                "cannot invoke {} asynchronously on {}: the handle is not instantiated",
                method_name,
                target.class_name()
            ))
        })?;
        let object = value.as_object().ok_or_else(|| {
            Error::Invocation(format!(
                "cannot invoke asynchronously: values of {} cannot complete futures",
                value.concrete_class()
            ))
        })?;
        object.future_slot().arm(pointer);

        let result = self.invoke_inline(target, method_name, args)?;
        if let Some(task) = result.value().and_then(Value::as_task) {
            // The method handed back a pull-style handle; poll it to
            // completion in the background.
            PolledFuture::bridge(task.clone(), value.clone());
        }
        Ok(())
    }

    fn wrap_result(&self, value: Value, ret: &ReturnSpec) -> Instance {
        if ret.class_name == "void" {
            return Instance::new(
                Some(Value::Null),
                names::NULL,
                Vec::new(),
                ThreadAffinity::Any,
            );
        }
        let affinity = self.inner.registry.affinity_of(&ret.class_name);
        Instance::new(
            Some(value),
            ret.class_name.clone(),
            ret.type_args.clone(),
            affinity,
        )
    }

    fn event(&self) -> Result<&EventExecutor> {
        self.inner.event.get_or_try_init(|| {
            EventExecutor::start().map_err(|e| {
                Error::Invocation(format!("could not start the event thread: {}", e))
            })
        })
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime::new()
    }
}
