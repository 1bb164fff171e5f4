//! Call arguments and their materialization.
//!
//! An [`InvocationArg`] reaches the runtime in one of two shapes: wrapping
//! an already-materialized [`Instance`] (handle origin), or carrying a
//! serialized payload that must be decoded before use. Materialization
//! turns either shape into a [`GeneratedArg`], the (runtime type, runtime
//! value) pair consumed by overload resolution.

use log::warn;
use serde::Serialize;

use strait_core::{names, ClassRegistry, Value};

use crate::codec::{
    Codec, ARG_FROM_FIELD, ARG_FROM_NATIVE, CLASS_NAME_FIELD, ENVELOPE_KEY, JSON_FIELD,
};
use crate::errors::{Error, Result};
use crate::instance::Instance;

/// Reserved type name marking a payload that is itself an encoded
/// sequence of further arguments (variadic/array construction).
pub const CONTENTS_ARRAY: &str = "strait.Array";

/// Where an argument came from.
#[derive(Debug, Clone)]
pub enum ArgOrigin {
    /// Created around a live handle; no decoding needed.
    Handle(Instance),
    /// Created from a serialized payload; decoded on materialization.
    Serialized(String),
}

/// A call argument.
#[derive(Debug, Clone)]
pub struct InvocationArg {
    class_name: String,
    origin: ArgOrigin,
}

impl InvocationArg {
    /// Serialize `value` into an argument declared as `class_name`.
    pub fn new<T: Serialize + ?Sized>(value: &T, class_name: impl Into<String>) -> Result<Self> {
        let class_name = class_name.into();
        let json = serde_json::to_string(value)
            .map_err(|e| Error::decode(class_name.clone(), "<serialize>", e.to_string()))?;
        Ok(InvocationArg {
            class_name,
            origin: ArgOrigin::Serialized(json),
        })
    }

    /// An argument carrying an already-serialized payload.
    pub fn serialized(class_name: impl Into<String>, json: impl Into<String>) -> Self {
        InvocationArg {
            class_name: class_name.into(),
            origin: ArgOrigin::Serialized(json.into()),
        }
    }

    /// An argument wrapping a live handle.
    pub fn from_instance(instance: Instance) -> Self {
        InvocationArg {
            class_name: instance.class_name().to_string(),
            origin: ArgOrigin::Handle(instance),
        }
    }

    /// Build an array-contents argument (declared [`CONTENTS_ARRAY`]) from
    /// serialized-origin arguments, preserving order. Handle-origin
    /// arguments cannot be re-serialized into an envelope list.
    pub fn from_values(args: &[InvocationArg]) -> Result<Self> {
        let mut elements = Vec::with_capacity(args.len());
        for arg in args {
            let payload = arg.json()?;
            let mut inner = serde_json::Map::new();
            inner.insert(JSON_FIELD.into(), serde_json::Value::String(payload.into()));
            inner.insert(
                CLASS_NAME_FIELD.into(),
                serde_json::Value::String(arg.class_name().into()),
            );
            inner.insert(
                ARG_FROM_FIELD.into(),
                serde_json::Value::String(ARG_FROM_NATIVE.into()),
            );
            let mut envelope = serde_json::Map::new();
            envelope.insert(ENVELOPE_KEY.into(), serde_json::Value::Object(inner));
            elements.push(serde_json::Value::Object(envelope));
        }
        let json = serde_json::to_string(&elements)
            .map_err(|e| Error::decode(CONTENTS_ARRAY, "<serialize>", e.to_string()))?;
        Ok(InvocationArg::serialized(CONTENTS_ARRAY, json))
    }

    /// The declared type of this argument.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Whether this argument carries a serialized payload.
    pub fn is_serialized(&self) -> bool {
        matches!(self.origin, ArgOrigin::Serialized(_))
    }

    /// The wrapped handle. Fails for serialized-origin arguments.
    pub fn instance(&self) -> Result<&Instance> {
        match &self.origin {
            ArgOrigin::Handle(instance) => Ok(instance),
            ArgOrigin::Serialized(_) => Err(Error::InvalidArgument(format!(
                "this argument of {} was created by the other side of the bridge",
                self.class_name
            ))),
        }
    }

    /// The serialized payload. Fails for handle-origin arguments.
    pub fn json(&self) -> Result<&str> {
        match &self.origin {
            ArgOrigin::Serialized(json) => Ok(json),
            ArgOrigin::Handle(_) => Err(Error::InvalidArgument(format!(
                "this argument of {} was created by the other side of the bridge",
                self.class_name
            ))),
        }
    }
}

/// A fully materialized argument: runtime type plus runtime value.
#[derive(Debug, Clone)]
pub struct GeneratedArg {
    pub class_name: String,
    pub value: Value,
}

/// Materialize a list of arguments.
///
/// Serialized payloads are decoded through the codec; the reserved
/// [`CONTENTS_ARRAY`] marker decodes as an envelope list and takes the
/// decoded elements' concrete class as its runtime type. Handle-origin
/// arguments are unwrapped directly.
pub fn materialize(
    args: &[InvocationArg],
    codec: &dyn Codec,
    registry: &ClassRegistry,
) -> Result<Vec<GeneratedArg>> {
    args.iter()
        .map(|arg| materialize_one(arg, codec, registry))
        .collect()
}

fn materialize_one(
    arg: &InvocationArg,
    codec: &dyn Codec,
    registry: &ClassRegistry,
) -> Result<GeneratedArg> {
    if arg.is_serialized() {
        let json = arg.json()?;
        if arg.class_name() == CONTENTS_ARRAY {
            let decoded = codec.decode_array_contents(json).map_err(|e| {
                Error::InvalidArgument(format!(
                    "cannot materialize array-contents argument: {}",
                    e
                ))
            })?;
            return Ok(GeneratedArg {
                class_name: names::array_of(&decoded.element_class),
                value: Value::array(decoded.element_class, decoded.items),
            });
        }
        let value = codec.decode(json, arg.class_name()).map_err(|e| {
            Error::InvalidArgument(format!(
                "cannot materialize argument of {}: {}",
                arg.class_name(),
                e
            ))
        })?;
        return Ok(GeneratedArg {
            class_name: arg.class_name().to_string(),
            value,
        });
    }

    let instance = arg.instance()?;
    let class_name = if registry.is_known(instance.class_name()) {
        instance.class_name().to_string()
    } else {
        warn!(
            "class {} of a handle argument is not registered; degrading to {}",
            instance.class_name(),
            names::OBJECT
        );
        names::OBJECT.to_string()
    };
    Ok(GeneratedArg {
        class_name,
        value: instance.value().cloned().unwrap_or(Value::Null),
    })
}
