//! Avro schema types and representations.
//!
//! This module defines the schema type system fields are bound against:
//! primitives, named complex types (record, error, enum, fixed), containers,
//! unions and named type references.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde_json::{json, Map, Value};

use crate::error::SchemaError;
use crate::schema::SchemaField;

/// Represents an Avro schema.
#[derive(Debug, Clone, PartialEq)]
pub enum AvroSchema {
    // Primitive types
    /// Null type - no value.
    Null,
    /// Boolean type.
    Boolean,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    Long,
    /// 32-bit IEEE 754 floating-point.
    Float,
    /// 64-bit IEEE 754 floating-point.
    Double,
    /// Sequence of bytes.
    Bytes,
    /// Unicode string.
    String,

    // Complex types
    /// Record type with named fields.
    Record(RecordSchema),
    /// Error type, a record used in protocol messages.
    Error(RecordSchema),
    /// Enumeration type.
    Enum(EnumSchema),
    /// Array of items with a single schema.
    Array(Box<AvroSchema>),
    /// Map with string keys and values of a single schema.
    Map(Box<AvroSchema>),
    /// Union of multiple schemas.
    Union(Vec<AvroSchema>),
    /// Fixed-size byte array.
    Fixed(FixedSchema),

    /// Reference to a named type defined elsewhere, by full name.
    Named(NamedRef),
}

/// Reference to a previously defined named type.
///
/// The referenced kind is kept so bindings can be validated without
/// chasing the definition.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedRef {
    /// Fully qualified name of the referenced type.
    pub fullname: String,
    /// Kind of the referenced definition.
    pub kind: SchemaKind,
}

impl NamedRef {
    pub fn new(fullname: impl Into<String>, kind: SchemaKind) -> Self {
        Self {
            fullname: fullname.into(),
            kind,
        }
    }
}

/// The closed set of schema type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SchemaKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Record,
    Enumeration,
    Array,
    Map,
    Union,
    Fixed,
    Error,
}

impl SchemaKind {
    /// Every tag, in declaration order.
    pub const ALL: [SchemaKind; 15] = [
        SchemaKind::Null,
        SchemaKind::Boolean,
        SchemaKind::Int,
        SchemaKind::Long,
        SchemaKind::Float,
        SchemaKind::Double,
        SchemaKind::Bytes,
        SchemaKind::String,
        SchemaKind::Record,
        SchemaKind::Enumeration,
        SchemaKind::Array,
        SchemaKind::Map,
        SchemaKind::Union,
        SchemaKind::Fixed,
        SchemaKind::Error,
    ];

    /// The tag as it is spelled in schema JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::Null => "null",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Int => "int",
            SchemaKind::Long => "long",
            SchemaKind::Float => "float",
            SchemaKind::Double => "double",
            SchemaKind::Bytes => "bytes",
            SchemaKind::String => "string",
            SchemaKind::Record => "record",
            SchemaKind::Enumeration => "enum",
            SchemaKind::Array => "array",
            SchemaKind::Map => "map",
            SchemaKind::Union => "union",
            SchemaKind::Fixed => "fixed",
            SchemaKind::Error => "error",
        }
    }

    /// Check if this tag names a primitive type.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            SchemaKind::Null
                | SchemaKind::Boolean
                | SchemaKind::Int
                | SchemaKind::Long
                | SchemaKind::Float
                | SchemaKind::Double
                | SchemaKind::Bytes
                | SchemaKind::String
        )
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema for a record or error type.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    /// The name of the record.
    pub name: String,
    /// Optional namespace for the record.
    pub namespace: Option<String>,
    /// The fields of the record.
    pub fields: Vec<SchemaField>,
    /// Optional documentation.
    pub doc: Option<String>,
    /// Aliases for this record.
    pub aliases: Vec<String>,
}

impl RecordSchema {
    /// Create a new RecordSchema with the given name and fields.
    pub fn new(name: impl Into<String>, fields: Vec<SchemaField>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            fields,
            doc: None,
            aliases: Vec::new(),
        }
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the documentation.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Get the fully qualified name.
    pub fn fullname(&self) -> String {
        qualify(&self.name, self.namespace.as_deref())
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Every named type defined inside this record, itself included, keyed
    /// by full name. Registry references in the fields resolve against it.
    pub fn named_definitions(&self) -> HashMap<String, AvroSchema> {
        let mut definitions = HashMap::new();
        definitions.insert(self.fullname(), AvroSchema::Record(self.clone()));
        for field in &self.fields {
            collect_definitions(field.schema(), &mut definitions);
        }
        definitions
    }

    fn to_json_value(&self, type_name: &str) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_string(), json!(type_name));
        obj.insert("name".to_string(), json!(&self.name));

        if let Some(ns) = &self.namespace {
            obj.insert("namespace".to_string(), json!(ns));
        }

        if let Some(doc) = &self.doc {
            obj.insert("doc".to_string(), json!(doc));
        }

        if !self.aliases.is_empty() {
            obj.insert("aliases".to_string(), json!(&self.aliases));
        }

        let fields: Vec<Value> = self.fields.iter().map(|f| f.to_json_value()).collect();
        obj.insert("fields".to_string(), Value::Array(fields));

        Value::Object(obj)
    }
}

/// Field ordering for record comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldOrder {
    Ascending,
    Descending,
    Ignore,
}

impl FieldOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldOrder::Ascending => "ascending",
            FieldOrder::Descending => "descending",
            FieldOrder::Ignore => "ignore",
        }
    }
}

impl FromStr for FieldOrder {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ascending" => Ok(FieldOrder::Ascending),
            "descending" => Ok(FieldOrder::Descending),
            "ignore" => Ok(FieldOrder::Ignore),
            other => Err(SchemaError::InvalidOrder(other.to_string())),
        }
    }
}

impl fmt::Display for FieldOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema for an enumeration type.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumSchema {
    /// The name of the enum.
    pub name: String,
    /// Optional namespace for the enum.
    pub namespace: Option<String>,
    /// The symbols (variants) of the enum.
    pub symbols: Vec<String>,
    /// Optional documentation.
    pub doc: Option<String>,
    /// Default symbol.
    pub default: Option<String>,
}

impl EnumSchema {
    /// Create a new EnumSchema with the given name and symbols.
    pub fn new(name: impl Into<String>, symbols: Vec<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            symbols,
            doc: None,
            default: None,
        }
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Get the fully qualified name.
    pub fn fullname(&self) -> String {
        qualify(&self.name, self.namespace.as_deref())
    }

    /// Get the index of a symbol.
    pub fn symbol_index(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    /// Serialize the enum schema to a JSON Value.
    pub fn to_json_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_string(), json!("enum"));
        obj.insert("name".to_string(), json!(&self.name));

        if let Some(ns) = &self.namespace {
            obj.insert("namespace".to_string(), json!(ns));
        }

        if let Some(doc) = &self.doc {
            obj.insert("doc".to_string(), json!(doc));
        }

        obj.insert("symbols".to_string(), json!(&self.symbols));

        if let Some(default) = &self.default {
            obj.insert("default".to_string(), json!(default));
        }

        Value::Object(obj)
    }
}

/// Schema for a fixed-size byte array.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedSchema {
    /// The name of the fixed type.
    pub name: String,
    /// Optional namespace for the fixed type.
    pub namespace: Option<String>,
    /// The size in bytes.
    pub size: usize,
}

impl FixedSchema {
    /// Create a new FixedSchema with the given name and size.
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            size,
        }
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Get the fully qualified name.
    pub fn fullname(&self) -> String {
        qualify(&self.name, self.namespace.as_deref())
    }

    /// Serialize the fixed schema to a JSON Value.
    pub fn to_json_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_string(), json!("fixed"));
        obj.insert("name".to_string(), json!(&self.name));

        if let Some(ns) = &self.namespace {
            obj.insert("namespace".to_string(), json!(ns));
        }

        obj.insert("size".to_string(), json!(self.size));

        Value::Object(obj)
    }
}

fn qualify(name: &str, namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() && !name.contains('.') => format!("{}.{}", ns, name),
        _ => name.to_string(),
    }
}

impl AvroSchema {
    /// The type tag of this schema. Named references report the tag of
    /// the type they point to.
    pub fn kind(&self) -> SchemaKind {
        match self {
            AvroSchema::Null => SchemaKind::Null,
            AvroSchema::Boolean => SchemaKind::Boolean,
            AvroSchema::Int => SchemaKind::Int,
            AvroSchema::Long => SchemaKind::Long,
            AvroSchema::Float => SchemaKind::Float,
            AvroSchema::Double => SchemaKind::Double,
            AvroSchema::Bytes => SchemaKind::Bytes,
            AvroSchema::String => SchemaKind::String,
            AvroSchema::Record(_) => SchemaKind::Record,
            AvroSchema::Error(_) => SchemaKind::Error,
            AvroSchema::Enum(_) => SchemaKind::Enumeration,
            AvroSchema::Array(_) => SchemaKind::Array,
            AvroSchema::Map(_) => SchemaKind::Map,
            AvroSchema::Union(_) => SchemaKind::Union,
            AvroSchema::Fixed(_) => SchemaKind::Fixed,
            AvroSchema::Named(r) => r.kind,
        }
    }

    /// Check if this schema is a primitive type.
    pub fn is_primitive(&self) -> bool {
        self.kind().is_primitive() && !matches!(self, AvroSchema::Named(_))
    }

    /// Check if this schema is a named type definition (record, error, enum, or fixed).
    pub fn is_named(&self) -> bool {
        matches!(
            self,
            AvroSchema::Record(_) | AvroSchema::Error(_) | AvroSchema::Enum(_) | AvroSchema::Fixed(_)
        )
    }

    /// Get the fully qualified name of a named type or reference.
    pub fn fullname(&self) -> Option<String> {
        match self {
            AvroSchema::Record(r) | AvroSchema::Error(r) => Some(r.fullname()),
            AvroSchema::Enum(e) => Some(e.fullname()),
            AvroSchema::Fixed(f) => Some(f.fullname()),
            AvroSchema::Named(n) => Some(n.fullname.clone()),
            _ => None,
        }
    }

    /// Check if this schema is a union containing null.
    pub fn is_nullable(&self) -> bool {
        match self {
            AvroSchema::Union(variants) => variants.iter().any(|v| matches!(v, AvroSchema::Null)),
            _ => false,
        }
    }

    /// Serialize the schema to a JSON string.
    ///
    /// # Example
    /// ```
    /// use avro_bind::schema::AvroSchema;
    ///
    /// let schema = AvroSchema::String;
    /// assert_eq!(schema.to_json(), r#""string""#);
    /// ```
    pub fn to_json(&self) -> String {
        let value = self.to_json_value();
        serde_json::to_string(&value).unwrap_or_else(|_| "null".to_string())
    }

    /// Serialize the schema to a JSON Value.
    pub fn to_json_value(&self) -> Value {
        match self {
            AvroSchema::Null => json!("null"),
            AvroSchema::Boolean => json!("boolean"),
            AvroSchema::Int => json!("int"),
            AvroSchema::Long => json!("long"),
            AvroSchema::Float => json!("float"),
            AvroSchema::Double => json!("double"),
            AvroSchema::Bytes => json!("bytes"),
            AvroSchema::String => json!("string"),

            AvroSchema::Record(r) => r.to_json_value("record"),
            AvroSchema::Error(r) => r.to_json_value("error"),
            AvroSchema::Enum(e) => e.to_json_value(),
            AvroSchema::Array(items) => {
                json!({
                    "type": "array",
                    "items": items.to_json_value()
                })
            }
            AvroSchema::Map(values) => {
                json!({
                    "type": "map",
                    "values": values.to_json_value()
                })
            }
            AvroSchema::Union(variants) => {
                Value::Array(variants.iter().map(|v| v.to_json_value()).collect())
            }
            AvroSchema::Fixed(f) => f.to_json_value(),

            AvroSchema::Named(r) => json!(r.fullname),
        }
    }
}

fn collect_definitions(schema: &AvroSchema, definitions: &mut HashMap<String, AvroSchema>) {
    match schema {
        AvroSchema::Record(record) | AvroSchema::Error(record) => {
            if definitions.contains_key(&record.fullname()) {
                return;
            }
            definitions.insert(record.fullname(), schema.clone());
            for field in &record.fields {
                collect_definitions(field.schema(), definitions);
            }
        }
        AvroSchema::Enum(e) => {
            definitions.insert(e.fullname(), schema.clone());
        }
        AvroSchema::Fixed(f) => {
            definitions.insert(f.fullname(), schema.clone());
        }
        AvroSchema::Array(inner) | AvroSchema::Map(inner) => {
            collect_definitions(inner, definitions)
        }
        AvroSchema::Union(variants) => {
            for variant in variants {
                collect_definitions(variant, definitions);
            }
        }
        _ => {}
    }
}
