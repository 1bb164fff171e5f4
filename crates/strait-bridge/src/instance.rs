//! The managed-object handle.
//!
//! An [`Instance`] is the universal currency of the bridge: every call
//! returns one and every non-primitive argument is one. It owns a managed
//! value (absent for the static view of a class), the declared type the
//! value was produced as, and the declared type's actual generic type
//! arguments when known. Cloning an Instance aliases the same managed
//! value.
//!
//! Operations on an Instance (`invoke`, `field`, `cast`, ...) live on
//! [`crate::Runtime`], which supplies the registry and codec.

use strait_core::{ThreadAffinity, Value};

/// A handle over a managed value and its declared type.
#[derive(Debug, Clone)]
pub struct Instance {
    value: Option<Value>,
    class_name: String,
    type_args: Vec<String>,
    affinity: ThreadAffinity,
}

impl Instance {
    pub(crate) fn new(
        value: Option<Value>,
        class_name: impl Into<String>,
        type_args: Vec<String>,
        affinity: ThreadAffinity,
    ) -> Self {
        Instance {
            value,
            class_name: class_name.into(),
            type_args,
            affinity,
        }
    }

    /// Wrap a value under its concrete runtime class, with no generic
    /// type information and no thread affinity. Used by callback
    /// deliveries, where no registry is in reach.
    pub fn wrap(value: Value) -> Self {
        let class_name = value.concrete_class();
        Instance::new(Some(value), class_name, Vec::new(), ThreadAffinity::Any)
    }

    /// The managed value, absent for a static view.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// The declared type of this handle.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Actual generic type arguments of the declared type, if the
    /// producing operation knew them (e.g. a list's element class).
    pub fn type_args(&self) -> &[String] {
        &self.type_args
    }

    /// Whether this handle is the static view of a class: no managed
    /// value, method calls resolve to static methods.
    pub fn is_static_view(&self) -> bool {
        self.value.is_none()
    }

    pub(crate) fn affinity(&self) -> ThreadAffinity {
        self.affinity
    }
}
