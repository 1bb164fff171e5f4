//! Dynamic value representation of the managed runtime.
//!
//! Every value that crosses the bridge is a [`Value`]. Scalars are stored
//! inline; strings copy; arrays, objects, and tasks are reference-counted
//! so that cloning a handle aliases the same managed entity. Objects carry
//! two callback slots (one per bridge flavor) alongside their field map.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::names;
use crate::pointer::CallbackSlot;
use crate::task::TaskHandle;

/// Whether a sequence value is a plain array or a list.
///
/// The distinction only affects the concrete class reported for the
/// value: arrays are `Elem[]`, lists are `lang.List` with the element
/// class carried as a generic type argument by the owning handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    Array,
    List,
}

/// A managed array or list: element class plus shared, mutable contents.
#[derive(Debug)]
pub struct ArrayData {
    element_class: String,
    kind: SequenceKind,
    items: RwLock<Vec<Value>>,
}

impl ArrayData {
    /// The declared element class.
    pub fn element_class(&self) -> &str {
        &self.element_class
    }

    /// Array or list.
    pub fn kind(&self) -> SequenceKind {
        self.kind
    }

    /// Snapshot of the current contents.
    pub fn items(&self) -> Vec<Value> {
        self.items.read().clone()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Whether the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Element at `index`, if present.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.items.read().get(index).cloned()
    }

    /// Replace the element at `index`. Returns false when out of bounds.
    pub fn set(&self, index: usize, value: Value) -> bool {
        let mut items = self.items.write();
        match items.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

/// A managed object: concrete class, field map, and callback slots.
#[derive(Debug)]
pub struct ObjectData {
    class_name: String,
    fields: RwLock<FxHashMap<String, Value>>,
    channel_slot: CallbackSlot,
    future_slot: CallbackSlot,
}

impl ObjectData {
    /// The concrete runtime class of this object.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Current value of a field, if set.
    pub fn get_field(&self, name: &str) -> Option<Value> {
        self.fields.read().get(name).cloned()
    }

    /// Set a field value.
    pub fn set_field(&self, name: impl Into<String>, value: Value) {
        self.fields.write().insert(name.into(), value);
    }

    /// Snapshot of all currently set fields.
    pub fn fields_snapshot(&self) -> Vec<(String, Value)> {
        self.fields
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// The slot wired by `initialize_callback_channel` (flavor A).
    pub fn channel_slot(&self) -> &CallbackSlot {
        &self.channel_slot
    }

    /// The slot wired by `invoke_async` (flavor B).
    pub fn future_slot(&self) -> &CallbackSlot {
        &self.future_slot
    }
}

/// A managed runtime value.
#[derive(Clone)]
pub enum Value {
    /// The absent value. Reported as class `lang.Null`.
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    Str(String),
    /// Shared array or list.
    Array(Arc<ArrayData>),
    /// Shared object.
    Object(Arc<ObjectData>),
    /// Shared pull-based task handle.
    Task(TaskHandle),
}

impl Value {
    /// Build an object of `class_name` with the given initial fields.
    pub fn object(class_name: impl Into<String>, fields: Vec<(String, Value)>) -> Value {
        Value::Object(Arc::new(ObjectData {
            class_name: class_name.into(),
            fields: RwLock::new(fields.into_iter().collect()),
            channel_slot: CallbackSlot::new(),
            future_slot: CallbackSlot::new(),
        }))
    }

    /// Build an array value with the given element class.
    pub fn array(element_class: impl Into<String>, items: Vec<Value>) -> Value {
        Value::sequence(element_class, SequenceKind::Array, items)
    }

    /// Build a list value with the given element class.
    pub fn list(element_class: impl Into<String>, items: Vec<Value>) -> Value {
        Value::sequence(element_class, SequenceKind::List, items)
    }

    fn sequence(element_class: impl Into<String>, kind: SequenceKind, items: Vec<Value>) -> Value {
        Value::Array(Arc::new(ArrayData {
            element_class: element_class.into(),
            kind,
            items: RwLock::new(items),
        }))
    }

    /// Whether this is the null sentinel.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(l) => Some(*l),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Arc<ArrayData>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<ObjectData>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_task(&self) -> Option<&TaskHandle> {
        match self {
            Value::Task(t) => Some(t),
            _ => None,
        }
    }

    /// The concrete runtime class of this value. Scalars report their
    /// boxed wrapper class, since a wrapped value is always in an object
    /// position.
    pub fn concrete_class(&self) -> String {
        match self {
            Value::Null => names::NULL.to_string(),
            Value::Bool(_) => names::BOOLEAN.to_string(),
            Value::Byte(_) => names::BYTE.to_string(),
            Value::Short(_) => names::SHORT.to_string(),
            Value::Int(_) => names::INTEGER.to_string(),
            Value::Long(_) => names::LONG.to_string(),
            Value::Float(_) => names::FLOAT.to_string(),
            Value::Double(_) => names::DOUBLE.to_string(),
            Value::Char(_) => names::CHARACTER.to_string(),
            Value::Str(_) => names::STRING.to_string(),
            Value::Array(a) => match a.kind() {
                SequenceKind::Array => names::array_of(a.element_class()),
                SequenceKind::List => names::LIST.to_string(),
            },
            Value::Object(o) => o.class_name().to_string(),
            Value::Task(_) => names::TASK.to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            // Sequences compare by contents, objects and tasks by identity.
            (Value::Array(a), Value::Array(b)) => {
                a.element_class() == b.element_class()
                    && a.kind() == b.kind()
                    && a.items() == b.items()
            }
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Task(a), Value::Task(b)) => a.same_task(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Byte(b) => write!(f, "Byte({})", b),
            Value::Short(s) => write!(f, "Short({})", s),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Long(l) => write!(f, "Long({})", l),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::Double(x) => write!(f, "Double({})", x),
            Value::Char(c) => write!(f, "Char({:?})", c),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Array(a) => write!(
                f,
                "Array({}, {:?}, {} elements)",
                a.element_class(),
                a.kind(),
                a.len()
            ),
            Value::Object(o) => write!(f, "Object({})", o.class_name()),
            Value::Task(_) => write!(f, "Task"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concrete_class_of_scalars() {
        assert_eq!(Value::Null.concrete_class(), names::NULL);
        assert_eq!(Value::Int(1).concrete_class(), names::INTEGER);
        assert_eq!(Value::Str("x".into()).concrete_class(), names::STRING);
    }

    #[test]
    fn test_concrete_class_of_sequences() {
        let arr = Value::array("int", vec![Value::Int(1)]);
        assert_eq!(arr.concrete_class(), "int[]");

        let list = Value::list(names::STRING, vec![]);
        assert_eq!(list.concrete_class(), names::LIST);
    }

    #[test]
    fn test_object_fields_are_shared() {
        let obj = Value::object("demo.Point", vec![("x".to_string(), Value::Int(1))]);
        let alias = obj.clone();

        alias
            .as_object()
            .unwrap()
            .set_field("x", Value::Int(42));
        assert_eq!(
            obj.as_object().unwrap().get_field("x"),
            Some(Value::Int(42))
        );
        assert_eq!(obj, alias);
    }

    #[test]
    fn test_object_identity_equality() {
        let a = Value::object("demo.Point", vec![]);
        let b = Value::object("demo.Point", vec![]);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }
}
