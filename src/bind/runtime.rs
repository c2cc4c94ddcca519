//! Structural descriptions of runtime property types.
//!
//! Rust has no runtime reflection, so a property declares the shape of the
//! value it holds with a [`RuntimeType`]. Binding compares that shape with the
//! schema type tag of the field it is bound to.

use std::fmt;

use crate::schema::SchemaKind;

/// Shape of a runtime property type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuntimeType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    /// Owned byte buffer.
    Bytes,
    /// Any string-like type.
    Text,
    /// Nullable wrapper around another type.
    Optional(Box<RuntimeType>),
    /// A named reference type with fields (heap allocated, may be absent).
    Class(String),
    /// A named value type with fields.
    Struct(String),
    /// A named enumeration.
    Enum(String),
    /// Indexable, growable list of elements.
    List(Box<RuntimeType>),
    /// String-keyed associative container.
    Map(Box<RuntimeType>),
}

/// Coarse category of a runtime type, used as the less specific key when
/// looking up converters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeFamily {
    Boolean,
    Integer,
    Float,
    Bytes,
    Text,
    Optional,
    Class,
    Struct,
    Enum,
    List,
    Map,
}

impl RuntimeType {
    pub fn optional(inner: RuntimeType) -> Self {
        RuntimeType::Optional(Box::new(inner))
    }

    pub fn list(element: RuntimeType) -> Self {
        RuntimeType::List(Box::new(element))
    }

    pub fn map(value: RuntimeType) -> Self {
        RuntimeType::Map(Box::new(value))
    }

    pub fn class(name: impl Into<String>) -> Self {
        RuntimeType::Class(name.into())
    }

    pub fn structure(name: impl Into<String>) -> Self {
        RuntimeType::Struct(name.into())
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        RuntimeType::Enum(name.into())
    }

    /// Whether values of this type are references that can be absent.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            RuntimeType::Class(_)
                | RuntimeType::Text
                | RuntimeType::Bytes
                | RuntimeType::List(_)
                | RuntimeType::Map(_)
        )
    }

    pub fn family(&self) -> RuntimeFamily {
        match self {
            RuntimeType::Bool => RuntimeFamily::Boolean,
            RuntimeType::I8
            | RuntimeType::I16
            | RuntimeType::I32
            | RuntimeType::I64
            | RuntimeType::U8
            | RuntimeType::U16
            | RuntimeType::U32
            | RuntimeType::U64 => RuntimeFamily::Integer,
            RuntimeType::F32 | RuntimeType::F64 => RuntimeFamily::Float,
            RuntimeType::Bytes => RuntimeFamily::Bytes,
            RuntimeType::Text => RuntimeFamily::Text,
            RuntimeType::Optional(_) => RuntimeFamily::Optional,
            RuntimeType::Class(_) => RuntimeFamily::Class,
            RuntimeType::Struct(_) => RuntimeFamily::Struct,
            RuntimeType::Enum(_) => RuntimeFamily::Enum,
            RuntimeType::List(_) => RuntimeFamily::List,
            RuntimeType::Map(_) => RuntimeFamily::Map,
        }
    }

    /// Check whether a value of this type can hold a value of the given
    /// schema type without conversion.
    ///
    /// | Schema type | Runtime shape |
    /// |---|---|
    /// | null | `Optional` or any reference type |
    /// | boolean | `Bool` |
    /// | int | `I32` |
    /// | long | `I64` |
    /// | float | `F32` |
    /// | double | `F64` |
    /// | bytes, fixed | `Bytes` |
    /// | string | `Text` |
    /// | record, error | `Class` |
    /// | enum | `Enum` |
    /// | array | `List` |
    /// | map | `Map` |
    /// | union | anything |
    pub fn is_compatible_with(&self, kind: SchemaKind) -> bool {
        match kind {
            SchemaKind::Null => matches!(self, RuntimeType::Optional(_)) || self.is_reference(),
            SchemaKind::Boolean => *self == RuntimeType::Bool,
            SchemaKind::Int => *self == RuntimeType::I32,
            SchemaKind::Long => *self == RuntimeType::I64,
            SchemaKind::Float => *self == RuntimeType::F32,
            SchemaKind::Double => *self == RuntimeType::F64,
            SchemaKind::Bytes | SchemaKind::Fixed => *self == RuntimeType::Bytes,
            SchemaKind::String => *self == RuntimeType::Text,
            SchemaKind::Record | SchemaKind::Error => matches!(self, RuntimeType::Class(_)),
            SchemaKind::Enumeration => matches!(self, RuntimeType::Enum(_)),
            SchemaKind::Array => matches!(self, RuntimeType::List(_)),
            SchemaKind::Map => matches!(self, RuntimeType::Map(_)),
            SchemaKind::Union => true,
        }
    }
}

impl fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeType::Bool => f.write_str("bool"),
            RuntimeType::I8 => f.write_str("i8"),
            RuntimeType::I16 => f.write_str("i16"),
            RuntimeType::I32 => f.write_str("i32"),
            RuntimeType::I64 => f.write_str("i64"),
            RuntimeType::U8 => f.write_str("u8"),
            RuntimeType::U16 => f.write_str("u16"),
            RuntimeType::U32 => f.write_str("u32"),
            RuntimeType::U64 => f.write_str("u64"),
            RuntimeType::F32 => f.write_str("f32"),
            RuntimeType::F64 => f.write_str("f64"),
            RuntimeType::Bytes => f.write_str("Vec<u8>"),
            RuntimeType::Text => f.write_str("String"),
            RuntimeType::Optional(inner) => write!(f, "Option<{}>", inner),
            RuntimeType::Class(name) | RuntimeType::Struct(name) | RuntimeType::Enum(name) => {
                f.write_str(name)
            }
            RuntimeType::List(element) => write!(f, "Vec<{}>", element),
            RuntimeType::Map(value) => write!(f, "Map<String, {}>", value),
        }
    }
}
