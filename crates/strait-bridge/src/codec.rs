//! Conversion between serialized payloads and managed values.
//!
//! The codec is explicit configuration: `RuntimeBuilder` threads one
//! implementation through the runtime, and everything downstream receives
//! it as a dependency. [`JsonCodec`] is the default.
//!
//! Array-contents payloads are a list of envelope records, one per
//! element, each naming its own declared type:
//!
//! ```json
//! [
//!   {"Native": {"json": "\"a\"", "class_name": "lang.String", "arg_from": "native"}},
//!   {"Native": {"json": "\"b\"", "class_name": "lang.String", "arg_from": "native"}}
//! ]
//! ```

use std::sync::Arc;

use serde_json::Value as Json;

use strait_core::{names, ClassRegistry, Value};

use crate::errors::{Error, Result};
use crate::invocation_arg::CONTENTS_ARRAY;

/// Envelope key identifying the side that produced an array element.
pub const ENVELOPE_KEY: &str = "Native";
/// Envelope field carrying the element payload text.
pub const JSON_FIELD: &str = "json";
/// Envelope field carrying the element's declared type.
pub const CLASS_NAME_FIELD: &str = "class_name";
/// Envelope field recording the origin side.
pub const ARG_FROM_FIELD: &str = "arg_from";
/// Origin marker written by the native side.
pub const ARG_FROM_NATIVE: &str = "native";

/// A decoded array-contents payload: the materialized elements in their
/// original order, plus the element class used as the collection's
/// runtime type.
#[derive(Debug)]
pub struct DecodedSequence {
    pub element_class: String,
    pub items: Vec<Value>,
}

/// Serialization service of the bridge.
pub trait Codec: Send + Sync {
    /// Produce the canonical serialized form of a value. The absent value
    /// encodes as `null` under the `lang.Null` sentinel class.
    fn encode(&self, value: &Value) -> Result<String>;

    /// Decode `json` as an instance of `class_name`.
    fn decode(&self, json: &str, class_name: &str) -> Result<Value>;

    /// Decode an array-contents payload (a list of envelope records).
    fn decode_array_contents(&self, json: &str) -> Result<DecodedSequence>;
}

/// The default JSON codec.
pub struct JsonCodec {
    registry: Arc<ClassRegistry>,
}

impl JsonCodec {
    pub fn new(registry: Arc<ClassRegistry>) -> Self {
        JsonCodec { registry }
    }

    fn from_json(&self, parsed: &Json, class_name: &str) -> std::result::Result<Value, String> {
        match names::canonical(class_name) {
            "boolean" => parsed
                .as_bool()
                .map(Value::Bool)
                .ok_or_else(|| shape_error(parsed, "a boolean")),
            "byte" => integer_in_range(parsed, i8::MIN as i64, i8::MAX as i64)
                .map(|i| Value::Byte(i as i8)),
            "short" => integer_in_range(parsed, i16::MIN as i64, i16::MAX as i64)
                .map(|i| Value::Short(i as i16)),
            "int" => integer_in_range(parsed, i32::MIN as i64, i32::MAX as i64)
                .map(|i| Value::Int(i as i32)),
            "long" => parsed
                .as_i64()
                .map(Value::Long)
                .ok_or_else(|| shape_error(parsed, "an integer")),
            "float" => parsed
                .as_f64()
                .map(|f| Value::Float(f as f32))
                .ok_or_else(|| shape_error(parsed, "a number")),
            "double" => parsed
                .as_f64()
                .map(Value::Double)
                .ok_or_else(|| shape_error(parsed, "a number")),
            "char" => {
                let mut chars = parsed.as_str().map(str::chars);
                match chars.as_mut().map(|c| (c.next(), c.next())) {
                    Some((Some(c), None)) => Ok(Value::Char(c)),
                    _ => Err(shape_error(parsed, "a single-character string")),
                }
            }
            "void" => Err("void is not a decodable type".to_string()),
            names::STRING => parsed
                .as_str()
                .map(|s| Value::Str(s.to_string()))
                .ok_or_else(|| shape_error(parsed, "a string")),
            names::NULL => {
                if parsed.is_null() {
                    Ok(Value::Null)
                } else {
                    Err(shape_error(parsed, "null"))
                }
            }
            _ if parsed.is_null() => Ok(Value::Null),
            names::OBJECT => Ok(self.untyped(parsed)),
            names::LIST => {
                let items = parsed
                    .as_array()
                    .ok_or_else(|| shape_error(parsed, "an array"))?;
                Ok(Value::list(
                    names::OBJECT,
                    items.iter().map(|item| self.untyped(item)).collect(),
                ))
            }
            name => {
                if let Some(element) = names::element_of(name) {
                    let items = parsed
                        .as_array()
                        .ok_or_else(|| shape_error(parsed, "an array"))?;
                    let decoded = items
                        .iter()
                        .map(|item| self.from_json(item, element))
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    return Ok(Value::array(element, decoded));
                }
                self.typed_object(parsed, name)
            }
        }
    }

    /// Decode a JSON object into an instance of a registered class,
    /// checking each key against the declared fields. Unknown keys are a
    /// structural mismatch.
    fn typed_object(&self, parsed: &Json, class_name: &str) -> std::result::Result<Value, String> {
        if self.registry.lookup(class_name).is_none() {
            return Err(format!(
                "type {} is not visible to the runtime",
                class_name
            ));
        }
        let map = parsed
            .as_object()
            .ok_or_else(|| shape_error(parsed, "an object"))?;

        let mut fields = Vec::with_capacity(map.len());
        for (key, raw) in map {
            let field = self.field_in_hierarchy(class_name, key).ok_or_else(|| {
                format!("unknown field `{}` for class {}", key, class_name)
            })?;
            let value = self
                .from_json(raw, &field)
                .map_err(|detail| format!("field `{}`: {}", key, detail))?;
            fields.push((key.clone(), value));
        }
        Ok(Value::object(class_name, fields))
    }

    /// Declared class of `field`, searched through the superclass chain.
    fn field_in_hierarchy(&self, class_name: &str, field: &str) -> Option<String> {
        let mut current = class_name.to_string();
        loop {
            let entry = self.registry.lookup(&current)?;
            if let Some(found) = entry.field(field) {
                return Some(found.class_name.clone());
            }
            current = entry.superclass()?.to_string();
        }
    }

    /// Decode without a target type, mapping JSON shapes onto the closest
    /// managed value.
    fn untyped(&self, parsed: &Json) -> Value {
        match parsed {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    if i32::try_from(i).is_ok() {
                        Value::Int(i as i32)
                    } else {
                        Value::Long(i)
                    }
                } else {
                    Value::Double(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Json::String(s) => Value::Str(s.clone()),
            Json::Array(items) => Value::list(
                names::OBJECT,
                items.iter().map(|item| self.untyped(item)).collect(),
            ),
            Json::Object(map) => Value::object(
                names::OBJECT,
                map.iter()
                    .map(|(k, v)| (k.clone(), self.untyped(v)))
                    .collect(),
            ),
        }
    }

    fn to_json(&self, value: &Value) -> std::result::Result<Json, String> {
        Ok(match value {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Byte(b) => Json::from(*b),
            Value::Short(s) => Json::from(*s),
            Value::Int(i) => Json::from(*i),
            Value::Long(l) => Json::from(*l),
            Value::Float(f) => serde_json::Number::from_f64(*f as f64)
                .map(Json::Number)
                .ok_or("non-finite numbers have no canonical form")?,
            Value::Double(d) => serde_json::Number::from_f64(*d)
                .map(Json::Number)
                .ok_or("non-finite numbers have no canonical form")?,
            Value::Char(c) => Json::String(c.to_string()),
            Value::Str(s) => Json::String(s.clone()),
            Value::Array(array) => Json::Array(
                array
                    .items()
                    .iter()
                    .map(|item| self.to_json(item))
                    .collect::<std::result::Result<Vec<_>, _>>()?,
            ),
            Value::Object(object) => {
                let mut map = serde_json::Map::new();
                let mut fields = object.fields_snapshot();
                fields.sort_by(|(a, _), (b, _)| a.cmp(b));
                for (name, field_value) in fields {
                    map.insert(name, self.to_json(&field_value)?);
                }
                Json::Object(map)
            }
            Value::Task(_) => return Err("task handles have no serialized form".to_string()),
        })
    }
}

impl Codec for JsonCodec {
    fn encode(&self, value: &Value) -> Result<String> {
        let json = self
            .to_json(value)
            .map_err(|detail| Error::decode(value.concrete_class(), "<encode>", detail))?;
        serde_json::to_string(&json)
            .map_err(|e| Error::decode(value.concrete_class(), "<encode>", e.to_string()))
    }

    fn decode(&self, json: &str, class_name: &str) -> Result<Value> {
        let parsed: Json = serde_json::from_str(json)
            .map_err(|e| Error::decode(class_name, json, format!("malformed payload: {}", e)))?;
        self.from_json(&parsed, class_name)
            .map_err(|detail| Error::decode(class_name, json, detail))
    }

    fn decode_array_contents(&self, json: &str) -> Result<DecodedSequence> {
        let parsed: Json = serde_json::from_str(json)
            .map_err(|e| Error::decode(CONTENTS_ARRAY, json, format!("malformed payload: {}", e)))?;
        let elements = parsed
            .as_array()
            .ok_or_else(|| Error::decode(CONTENTS_ARRAY, json, "expected an envelope list"))?;

        let mut element_class: Option<String> = None;
        let mut items = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            let envelope = element
                .as_object()
                .and_then(|o| o.get(ENVELOPE_KEY))
                .and_then(Json::as_object)
                .ok_or_else(|| {
                    Error::decode(
                        CONTENTS_ARRAY,
                        json,
                        format!("element {} is missing its `{}` envelope", index, ENVELOPE_KEY),
                    )
                })?;
            let class_name = envelope
                .get(CLASS_NAME_FIELD)
                .and_then(Json::as_str)
                .ok_or_else(|| {
                    Error::decode(
                        CONTENTS_ARRAY,
                        json,
                        format!("element {} has no `{}`", index, CLASS_NAME_FIELD),
                    )
                })?;
            let payload = envelope
                .get(JSON_FIELD)
                .and_then(Json::as_str)
                .ok_or_else(|| {
                    Error::decode(
                        CONTENTS_ARRAY,
                        json,
                        format!("element {} has no `{}`", index, JSON_FIELD),
                    )
                })?;

            items.push(self.decode(payload, class_name)?);
            // TODO: converge to the common ancestor of all element classes
            // instead of taking the first one.
            element_class.get_or_insert_with(|| class_name.to_string());
        }

        Ok(DecodedSequence {
            element_class: element_class.unwrap_or_else(|| names::OBJECT.to_string()),
            items,
        })
    }
}

fn shape_error(parsed: &Json, expected: &str) -> String {
    format!("expected {}, got `{}`", expected, parsed)
}

fn integer_in_range(parsed: &Json, min: i64, max: i64) -> std::result::Result<i64, String> {
    let i = parsed
        .as_i64()
        .ok_or_else(|| shape_error(parsed, "an integer"))?;
    if i < min || i > max {
        return Err(format!("integer {} is out of range [{}, {}]", i, min, max));
    }
    Ok(i)
}
