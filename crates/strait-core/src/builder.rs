//! Fluent builders for registering classes.
//!
//! # Example
//!
//! ```
//! use strait_core::{ClassBuilder, ClassRegistry, MethodDef, ParamSpec, ReturnSpec, Value};
//!
//! let registry = ClassRegistry::with_builtins();
//! ClassBuilder::new("demo.Adder")
//!     .constructor(vec![], |_args| Ok(Value::object("demo.Adder", vec![])))
//!     .method(
//!         MethodDef::new("add")
//!             .param(ParamSpec::class("int"))
//!             .param(ParamSpec::class("int"))
//!             .returns(ReturnSpec::of("int"))
//!             .body(|_recv, args| {
//!                 Ok(Value::Int(args[0].as_int().unwrap() + args[1].as_int().unwrap()))
//!             }),
//!     )
//!     .register(&registry)
//!     .unwrap();
//! ```

use std::sync::Arc;

use crate::class::{
    CallbackCapability, ClassEntry, ConstructorEntry, FieldEntry, MethodBody, MethodEntry,
    ParamSpec, ReturnSpec, ThreadAffinity, Visibility,
};
use crate::error::{CallError, RegistryError};
use crate::names;
use crate::registry::ClassRegistry;
use crate::value::Value;

/// Builder for a [`FieldEntry`]. Fields are public unless marked private.
#[derive(Debug, Clone)]
pub struct FieldDef {
    name: String,
    class_name: String,
    visibility: Visibility,
}

impl FieldDef {
    /// A public field with the given declared class.
    pub fn new(name: impl Into<String>, class_name: impl Into<String>) -> Self {
        FieldDef {
            name: name.into(),
            class_name: class_name.into(),
            visibility: Visibility::Public,
        }
    }

    /// Mark the field private. Private fields are invisible to field
    /// access through the bridge.
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    fn build(self) -> FieldEntry {
        FieldEntry {
            name: self.name,
            class_name: self.class_name,
            visibility: self.visibility,
        }
    }
}

/// Builder for a [`MethodEntry`].
pub struct MethodDef {
    name: String,
    is_static: bool,
    params: Vec<ParamSpec>,
    ret: ReturnSpec,
    body: Option<MethodBody>,
}

impl MethodDef {
    /// A new instance method returning `void`.
    pub fn new(name: impl Into<String>) -> Self {
        MethodDef {
            name: name.into(),
            is_static: false,
            params: Vec::new(),
            ret: ReturnSpec::void(),
            body: None,
        }
    }

    /// Mark as a static method.
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Append a formal parameter.
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Set the declared return type.
    pub fn returns(mut self, ret: ReturnSpec) -> Self {
        self.ret = ret;
        self
    }

    /// Set the implementation.
    pub fn body(
        mut self,
        body: impl Fn(Option<&Value>, &[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    ) -> Self {
        self.body = Some(Arc::new(body));
        self
    }

    fn build(self) -> MethodEntry {
        let name = self.name.clone();
        // Interface methods may be declared without an implementation;
        // invoking one is a managed-side failure, not a resolution miss.
        let body = self.body.unwrap_or_else(|| {
            Arc::new(move |_recv, _args| {
                Err(CallError::new(format!(
                    "method {} has no implementation",
                    name
                )))
            })
        });
        MethodEntry {
            name: self.name,
            is_static: self.is_static,
            params: self.params,
            ret: self.ret,
            body,
        }
    }
}

/// Builder for a [`ClassEntry`].
pub struct ClassBuilder {
    entry: ClassEntry,
}

impl ClassBuilder {
    /// A new class extending `lang.Object`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        ClassBuilder {
            entry: ClassEntry {
                superclass: (name != names::OBJECT).then(|| names::OBJECT.to_string()),
                name,
                interfaces: Vec::new(),
                is_interface: false,
                affinity: ThreadAffinity::Any,
                callbacks: CallbackCapability::None,
                fields: Vec::new(),
                constructors: Vec::new(),
                methods: Vec::new(),
            },
        }
    }

    /// A new interface. Interfaces have no superclass and no constructors.
    pub fn interface(name: impl Into<String>) -> Self {
        let mut builder = ClassBuilder::new(name);
        builder.entry.is_interface = true;
        builder.entry.superclass = None;
        builder
    }

    /// Set the direct superclass.
    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.entry.superclass = Some(superclass.into());
        self
    }

    /// Add a directly implemented interface.
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.entry.interfaces.push(interface.into());
        self
    }

    /// Tag the class with a thread affinity.
    pub fn affinity(mut self, affinity: ThreadAffinity) -> Self {
        self.entry.affinity = affinity;
        self
    }

    /// Tag the class with a callback capability.
    pub fn callbacks(mut self, capability: CallbackCapability) -> Self {
        self.entry.callbacks = capability;
        self
    }

    /// Declare a field.
    pub fn field(mut self, field: FieldDef) -> Self {
        self.entry.fields.push(field.build());
        self
    }

    /// Declare a constructor.
    pub fn constructor(
        mut self,
        params: Vec<ParamSpec>,
        body: impl Fn(&[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    ) -> Self {
        self.entry.constructors.push(Arc::new(ConstructorEntry {
            params,
            body: Arc::new(body),
        }));
        self
    }

    /// Declare a method.
    pub fn method(mut self, def: MethodDef) -> Self {
        self.entry.methods.push(Arc::new(def.build()));
        self
    }

    /// Finish building without registering.
    pub fn build(self) -> ClassEntry {
        self.entry
    }

    /// Register the class with `registry`.
    pub fn register(self, registry: &ClassRegistry) -> Result<(), RegistryError> {
        registry.register(self.entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let entry = ClassBuilder::new("demo.Thing").build();
        assert_eq!(entry.name(), "demo.Thing");
        assert_eq!(entry.superclass(), Some(names::OBJECT));
        assert!(!entry.is_interface());
        assert_eq!(entry.affinity(), ThreadAffinity::Any);
        assert_eq!(entry.callbacks(), CallbackCapability::None);
    }

    #[test]
    fn test_interface_has_no_superclass() {
        let entry = ClassBuilder::interface("demo.Speaker").build();
        assert!(entry.is_interface());
        assert_eq!(entry.superclass(), None);
    }

    #[test]
    fn test_method_without_body_fails_when_called() {
        let entry = ClassBuilder::interface("demo.Speaker")
            .method(MethodDef::new("speak").returns(ReturnSpec::of(names::STRING)))
            .build();
        let method = &entry.methods()[0];
        let err = (method.body)(None, &[]).unwrap_err();
        assert!(err.message().contains("no implementation"));
    }
}
