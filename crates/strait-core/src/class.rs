//! Class entries: the explicit registry records that replace open-ended
//! runtime reflection.
//!
//! A [`ClassEntry`] captures everything overload resolution and dispatch
//! need about a managed class: its place in the hierarchy, its declared
//! callables in declaration order, its fields, and the tags that control
//! thread affinity and callback capability. Bodies are plain closures
//! registered at build time.

use std::fmt;
use std::sync::Arc;

use crate::error::CallError;
use crate::value::Value;

/// Thread affinity tag, checked once at handle creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadAffinity {
    /// Operations run on the calling thread.
    #[default]
    Any,
    /// Every operation is marshaled onto the dedicated event thread and
    /// the caller blocks for the result.
    Event,
}

/// Which callback bridge flavor instances of a class support. Inherited
/// through the superclass chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallbackCapability {
    #[default]
    None,
    /// Repeatable fire-and-forget deliveries (flavor A).
    Channel,
    /// Terminal success/failure completion (flavor B).
    Future,
}

/// Field visibility. Field access only honors `Public`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// The kind of a formal parameter, as seen by overload resolution.
///
/// Generic positions carry no checkable structure after erasure, so they
/// match any argument; only concrete classes and generic arrays constrain
/// the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamSpec {
    /// A concrete class or primitive name; matched by assignability,
    /// including boxing equivalence.
    Class(String),
    /// A parameterized type such as a generic list; always matches.
    Parameterized,
    /// A wildcard; always matches.
    Wildcard,
    /// An array of a type variable; matches any array argument.
    GenericArray,
    /// A bare type variable; always matches.
    TypeVar,
}

impl ParamSpec {
    /// Shorthand for a concrete class parameter.
    pub fn class(name: impl Into<String>) -> ParamSpec {
        ParamSpec::Class(name.into())
    }
}

/// Declared return type of a method, with the actual type arguments when
/// the return type is parameterized (so element-type information can be
/// propagated to the next resolution step).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnSpec {
    pub class_name: String,
    pub type_args: Vec<String>,
}

impl ReturnSpec {
    /// A plain (non-parameterized) return type.
    pub fn of(class_name: impl Into<String>) -> ReturnSpec {
        ReturnSpec {
            class_name: class_name.into(),
            type_args: Vec::new(),
        }
    }

    /// A parameterized return type with its actual type arguments.
    pub fn parameterized(
        class_name: impl Into<String>,
        type_args: impl IntoIterator<Item = String>,
    ) -> ReturnSpec {
        ReturnSpec {
            class_name: class_name.into(),
            type_args: type_args.into_iter().collect(),
        }
    }

    /// A `void` return.
    pub fn void() -> ReturnSpec {
        ReturnSpec::of("void")
    }
}

/// A method implementation. Receives the receiver value (absent for
/// static dispatch) and the materialized arguments.
pub type MethodBody =
    Arc<dyn Fn(Option<&Value>, &[Value]) -> Result<Value, CallError> + Send + Sync>;

/// A constructor implementation. Receives the materialized arguments and
/// returns the new object value.
pub type ConstructorBody = Arc<dyn Fn(&[Value]) -> Result<Value, CallError> + Send + Sync>;

/// A declared method.
#[derive(Clone)]
pub struct MethodEntry {
    pub name: String,
    pub is_static: bool,
    pub params: Vec<ParamSpec>,
    pub ret: ReturnSpec,
    pub body: MethodBody,
}

impl fmt::Debug for MethodEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodEntry")
            .field("name", &self.name)
            .field("is_static", &self.is_static)
            .field("params", &self.params)
            .field("ret", &self.ret)
            .finish_non_exhaustive()
    }
}

/// A declared constructor.
#[derive(Clone)]
pub struct ConstructorEntry {
    pub params: Vec<ParamSpec>,
    pub body: ConstructorBody,
}

impl fmt::Debug for ConstructorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorEntry")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A declared field.
#[derive(Debug, Clone)]
pub struct FieldEntry {
    pub name: String,
    pub class_name: String,
    pub visibility: Visibility,
}

/// A registered class or interface.
#[derive(Debug)]
pub struct ClassEntry {
    pub(crate) name: String,
    pub(crate) superclass: Option<String>,
    pub(crate) interfaces: Vec<String>,
    pub(crate) is_interface: bool,
    pub(crate) affinity: ThreadAffinity,
    pub(crate) callbacks: CallbackCapability,
    pub(crate) fields: Vec<FieldEntry>,
    pub(crate) constructors: Vec<Arc<ConstructorEntry>>,
    pub(crate) methods: Vec<Arc<MethodEntry>>,
}

impl ClassEntry {
    /// The fully qualified class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The direct superclass, if any.
    pub fn superclass(&self) -> Option<&str> {
        self.superclass.as_deref()
    }

    /// Directly implemented interfaces, in declaration order.
    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    /// Whether this entry is an interface.
    pub fn is_interface(&self) -> bool {
        self.is_interface
    }

    /// The thread affinity tag.
    pub fn affinity(&self) -> ThreadAffinity {
        self.affinity
    }

    /// The callback capability tag declared on this entry (not walking
    /// the hierarchy; see `ClassRegistry::capability_of`).
    pub fn callbacks(&self) -> CallbackCapability {
        self.callbacks
    }

    /// Declared methods, in declaration order.
    pub fn methods(&self) -> &[Arc<MethodEntry>] {
        &self.methods
    }

    /// Declared constructors, in declaration order.
    pub fn constructors(&self) -> &[Arc<ConstructorEntry>] {
        &self.constructors
    }

    /// Declared fields.
    pub fn fields(&self) -> &[FieldEntry] {
        &self.fields
    }

    /// The declared field with the given name, if any.
    pub fn field(&self, name: &str) -> Option<&FieldEntry> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Declared methods with the given name, in declaration order.
    pub fn methods_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Arc<MethodEntry>> + 'a {
        self.methods.iter().filter(move |m| m.name == name)
    }
}
