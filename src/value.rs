//! Dynamic values passed between bound properties and encoders.

use std::collections::HashMap;

use serde_json::{Map, Value as JsonValue};

use crate::error::{SchemaError, ValueError};
use crate::schema::AvroSchema;

/// A dynamically typed value.
///
/// This is both what property getters hand to an encoder and what a decoder
/// hands to property setters. Converters map between the schema-side and
/// runtime-side shapes of the same value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 32-bit signed integer
    Int(i32),
    /// 64-bit signed integer
    Long(i64),
    /// 32-bit floating point
    Float(f32),
    /// 64-bit floating point
    Double(f64),
    /// Byte array
    Bytes(Vec<u8>),
    /// UTF-8 string
    String(String),
    /// Record with named fields, in schema order
    Record(Vec<(String, Value)>),
    /// Enum variant (index and symbol name)
    Enum(i32, String),
    /// Array of values
    Array(Vec<Value>),
    /// Map with string keys, in insertion order
    Map(Vec<(String, Value)>),
    /// Union variant (branch index and value)
    Union(i32, Box<Value>),
    /// Fixed-size byte array
    Fixed(Vec<u8>),
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Bytes(_) => "bytes",
            Value::String(_) => "string",
            Value::Record(_) => "record",
            Value::Enum(..) => "enum",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Union(..) => "union",
            Value::Fixed(_) => "fixed",
        }
    }

    /// Look up a field of a record value.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Strip any union wrappers.
    pub fn unwrap_union(self) -> Value {
        match self {
            Value::Union(_, inner) => inner.unwrap_union(),
            other => other,
        }
    }

    /// Convert the value to JSON.
    ///
    /// Bytes and fixed values are base64 encoded, enums become their symbol
    /// and unions their branch value.
    ///
    /// # Errors
    /// `ValueError::OutOfRange` for NaN or infinite floats, which JSON numbers
    /// cannot represent.
    pub fn to_json(&self) -> Result<JsonValue, ValueError> {
        match self {
            Value::Null => Ok(JsonValue::Null),
            Value::Boolean(b) => Ok(JsonValue::Bool(*b)),
            Value::Int(i) => Ok(JsonValue::Number((*i).into())),
            Value::Long(l) => Ok(JsonValue::Number((*l).into())),
            Value::Float(f) => finite_number(*f as f64),
            Value::Double(d) => finite_number(*d),
            Value::Bytes(b) | Value::Fixed(b) => Ok(JsonValue::String(base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                b,
            ))),
            Value::String(s) => Ok(JsonValue::String(s.clone())),
            Value::Record(fields) | Value::Map(fields) => {
                let mut map = Map::new();
                for (name, value) in fields {
                    map.insert(name.clone(), value.to_json()?);
                }
                Ok(JsonValue::Object(map))
            }
            Value::Enum(_index, symbol) => Ok(JsonValue::String(symbol.clone())),
            Value::Array(items) => items
                .iter()
                .map(Value::to_json)
                .collect::<Result<Vec<_>, _>>()
                .map(JsonValue::Array),
            Value::Union(_index, value) => value.to_json(),
        }
    }

    /// Build a value from a JSON default for the given schema.
    ///
    /// Follows the schema rules for defaults: bytes and fixed are ISO-8859-1
    /// strings, enums are symbols, and a union default belongs to the first
    /// branch. Named references fail; use
    /// [`from_json_with_types`](Self::from_json_with_types) to resolve them.
    pub fn from_json(json: &JsonValue, schema: &AvroSchema) -> Result<Value, SchemaError> {
        Value::from_json_with_types(json, schema, &HashMap::new())
    }

    /// Build a value from a JSON default, resolving named references through
    /// `named_types` (full name to definition).
    pub fn from_json_with_types(
        json: &JsonValue,
        schema: &AvroSchema,
        named_types: &HashMap<String, AvroSchema>,
    ) -> Result<Value, SchemaError> {
        let invalid = |reason: String| SchemaError::InvalidSchema(reason);

        match (json, schema) {
            (JsonValue::Null, AvroSchema::Null) => Ok(Value::Null),
            (JsonValue::Bool(b), AvroSchema::Boolean) => Ok(Value::Boolean(*b)),

            (JsonValue::Number(n), AvroSchema::Int) => {
                let v = n
                    .as_i64()
                    .ok_or_else(|| invalid(format!("Cannot convert {} to int", n)))?;
                i32::try_from(v)
                    .map(Value::Int)
                    .map_err(|_| invalid(format!("Value {} out of range for int", v)))
            }
            (JsonValue::Number(n), AvroSchema::Long) => n
                .as_i64()
                .map(Value::Long)
                .ok_or_else(|| invalid(format!("Cannot convert {} to long", n))),
            (JsonValue::Number(n), AvroSchema::Float) => n
                .as_f64()
                .map(|v| Value::Float(v as f32))
                .ok_or_else(|| invalid(format!("Cannot convert {} to float", n))),
            (JsonValue::Number(n), AvroSchema::Double) => n
                .as_f64()
                .map(Value::Double)
                .ok_or_else(|| invalid(format!("Cannot convert {} to double", n))),

            (JsonValue::String(s), AvroSchema::String) => Ok(Value::String(s.clone())),
            (JsonValue::String(s), AvroSchema::Bytes) => Ok(Value::Bytes(latin1_bytes(s)?)),
            (JsonValue::String(s), AvroSchema::Fixed(fixed)) => {
                let bytes = latin1_bytes(s)?;
                if bytes.len() != fixed.size {
                    return Err(invalid(format!(
                        "Fixed default has wrong size: expected {}, got {}",
                        fixed.size,
                        bytes.len()
                    )));
                }
                Ok(Value::Fixed(bytes))
            }
            (JsonValue::String(s), AvroSchema::Enum(enum_schema)) => {
                let index = enum_schema.symbol_index(s).ok_or_else(|| {
                    invalid(format!(
                        "Unknown enum symbol '{}' for enum '{}'",
                        s, enum_schema.name
                    ))
                })?;
                Ok(Value::Enum(index as i32, s.clone()))
            }

            (JsonValue::Array(arr), AvroSchema::Array(items)) => arr
                .iter()
                .map(|item| Value::from_json_with_types(item, items, named_types))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            (JsonValue::Object(obj), AvroSchema::Map(values)) => obj
                .iter()
                .map(|(k, v)| Ok((k.clone(), Value::from_json_with_types(v, values, named_types)?)))
                .collect::<Result<Vec<_>, SchemaError>>()
                .map(Value::Map),
            (JsonValue::Object(obj), AvroSchema::Record(record) | AvroSchema::Error(record)) => {
                let mut fields = Vec::with_capacity(record.fields.len());
                for field in &record.fields {
                    let json = obj
                        .get(field.name())
                        .or_else(|| field.default_value())
                        .ok_or_else(|| {
                            invalid(format!(
                                "Record default for '{}' is missing field '{}'",
                                record.name,
                                field.name()
                            ))
                        })?;
                    let value = Value::from_json_with_types(json, field.schema(), named_types)?;
                    fields.push((field.name().to_string(), value));
                }
                Ok(Value::Record(fields))
            }

            (json, AvroSchema::Union(variants)) => {
                let first = variants
                    .first()
                    .ok_or_else(|| invalid("Union has no branches".to_string()))?;
                Ok(Value::Union(
                    0,
                    Box::new(Value::from_json_with_types(json, first, named_types)?),
                ))
            }

            (json, AvroSchema::Named(r)) => match resolve(named_types, &r.fullname) {
                Some(definition) => Value::from_json_with_types(json, definition, named_types),
                None => Err(invalid(format!(
                    "Cannot build a default through unresolved reference to '{}'",
                    r.fullname
                ))),
            },

            (json, schema) => Err(invalid(format!(
                "Default {} does not match schema type {}",
                json,
                schema.kind()
            ))),
        }
    }

    /// Check that the value has the shape `schema` describes.
    ///
    /// Record values may omit fields that have a default. Named references
    /// are resolved through `named_types`; unresolved ones are accepted.
    pub fn conforms_to(
        &self,
        schema: &AvroSchema,
        named_types: &HashMap<String, AvroSchema>,
    ) -> bool {
        match (self, schema) {
            (_, AvroSchema::Named(r)) => match resolve(named_types, &r.fullname) {
                Some(definition) => self.conforms_to(definition, named_types),
                None => true,
            },
            (Value::Union(_, inner), AvroSchema::Union(variants)) => variants
                .iter()
                .any(|variant| inner.conforms_to(variant, named_types)),
            (value, AvroSchema::Union(variants)) => variants
                .iter()
                .any(|variant| value.conforms_to(variant, named_types)),
            (Value::Union(_, inner), schema) => inner.conforms_to(schema, named_types),

            (Value::Null, AvroSchema::Null)
            | (Value::Boolean(_), AvroSchema::Boolean)
            | (Value::Int(_), AvroSchema::Int)
            | (Value::Long(_), AvroSchema::Long)
            | (Value::Float(_), AvroSchema::Float)
            | (Value::Double(_), AvroSchema::Double)
            | (Value::Bytes(_), AvroSchema::Bytes)
            | (Value::String(_), AvroSchema::String) => true,

            (Value::Fixed(bytes), AvroSchema::Fixed(fixed)) => bytes.len() == fixed.size,
            (Value::Enum(_, symbol), AvroSchema::Enum(e)) => e.symbol_index(symbol).is_some(),
            (Value::Array(items), AvroSchema::Array(item_schema)) => items
                .iter()
                .all(|item| item.conforms_to(item_schema, named_types)),
            (Value::Map(entries), AvroSchema::Map(value_schema)) => entries
                .iter()
                .all(|(_, v)| v.conforms_to(value_schema, named_types)),
            (Value::Record(_), AvroSchema::Record(record) | AvroSchema::Error(record)) => {
                record.fields.iter().all(|field| match self.field(field.name()) {
                    Some(v) => v.conforms_to(field.schema(), named_types),
                    None => field.has_default_value(),
                })
            }
            _ => false,
        }
    }
}

/// Look up a complete definition; recursion placeholders do not count.
fn resolve<'a>(
    named_types: &'a HashMap<String, AvroSchema>,
    fullname: &str,
) -> Option<&'a AvroSchema> {
    named_types
        .get(fullname)
        .filter(|definition| !matches!(definition, AvroSchema::Named(_)))
}

fn finite_number(n: f64) -> Result<JsonValue, ValueError> {
    serde_json::Number::from_f64(n)
        .map(JsonValue::Number)
        .ok_or_else(|| ValueError::OutOfRange(format!("{} has no JSON representation", n)))
}

fn latin1_bytes(s: &str) -> Result<Vec<u8>, SchemaError> {
    s.chars()
        .map(|c| {
            u8::try_from(u32::from(c)).map_err(|_| {
                SchemaError::InvalidSchema(format!(
                    "Character '{}' is outside ISO-8859-1 in a bytes default",
                    c
                ))
            })
        })
        .collect()
}

macro_rules! value_conversions {
    ($($ty:ty => $variant:ident, $name:literal;)*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }

            impl TryFrom<Value> for $ty {
                type Error = ValueError;

                fn try_from(value: Value) -> Result<Self, Self::Error> {
                    match value.unwrap_union() {
                        Value::$variant(v) => Ok(v),
                        other => Err(ValueError::TypeMismatch {
                            expected: $name,
                            found: other.type_name(),
                        }),
                    }
                }
            }
        )*
    };
}

value_conversions! {
    bool => Boolean, "boolean";
    i32 => Int, "int";
    i64 => Long, "long";
    f32 => Float, "float";
    f64 => Double, "double";
    String => String, "string";
    Vec<u8> => Bytes, "bytes";
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

/// Convert an optional value: `Null` maps to `None`.
pub fn optional<T>(value: Value) -> Result<Option<T>, ValueError>
where
    T: TryFrom<Value, Error = ValueError>,
{
    match value.unwrap_union() {
        Value::Null => Ok(None),
        other => T::try_from(other).map(Some),
    }
}

/// Convert an array value element by element.
pub fn list<T>(value: Value) -> Result<Vec<T>, ValueError>
where
    T: TryFrom<Value, Error = ValueError>,
{
    match value.unwrap_union() {
        Value::Array(items) => items.into_iter().map(T::try_from).collect(),
        other => Err(ValueError::TypeMismatch {
            expected: "array",
            found: other.type_name(),
        }),
    }
}
