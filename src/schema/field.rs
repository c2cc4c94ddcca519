//! Record field definitions.

use serde_json::{json, Map, Value};

use crate::error::SchemaError;
use crate::schema::name::validate_name;
use crate::schema::{AvroSchema, FieldOrder, SchemaKind};

/// One named, typed member of a record schema.
///
/// Fields are validated when constructed and immutable afterwards. A field
/// that fails validation never exists, so every `SchemaField` carries a
/// well-formed name and a recognised sort order.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    name: String,
    schema: AvroSchema,
    /// The type was defined earlier in the same schema and is written back
    /// as a reference rather than inline.
    is_type_from_registry: bool,
    default: Option<Value>,
    order: Option<FieldOrder>,
}

impl SchemaField {
    /// Create a field.
    ///
    /// # Arguments
    /// * `name` - field name, must match `[A-Za-z_][A-Za-z0-9_]*`
    /// * `schema` - the field's type
    /// * `is_type_from_registry` - whether `schema` is a named type already registered
    ///   in the enclosing schema
    /// * `default` - the default value; `Some(Value::Null)` is a null default, `None` is
    ///   no default at all
    /// * `order` - optional sort order: `ascending`, `descending` or `ignore`
    ///
    /// # Errors
    /// `SchemaError::InvalidName` for a malformed name, `SchemaError::InvalidOrder` for
    /// an unrecognised order.
    ///
    /// # Example
    /// ```
    /// use avro_bind::schema::{AvroSchema, SchemaField};
    ///
    /// let field = SchemaField::new("age", AvroSchema::Int, false, None, Some("descending")).unwrap();
    /// assert_eq!(field.name(), "age");
    /// assert!(SchemaField::new("1bad", AvroSchema::Int, false, None, None).is_err());
    /// ```
    pub fn new(
        name: impl Into<String>,
        schema: AvroSchema,
        is_type_from_registry: bool,
        default: Option<Value>,
        order: Option<&str>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        validate_name(&name)?;
        let order = order.map(str::parse::<FieldOrder>).transpose()?;

        Ok(Self {
            name,
            schema,
            is_type_from_registry,
            default,
            order,
        })
    }

    /// Create a field with no default and no sort order.
    pub fn required(name: impl Into<String>, schema: AvroSchema) -> Result<Self, SchemaError> {
        Self::new(name, schema, false, None, None)
    }

    /// Create a field with a default value and no sort order.
    pub fn with_default(
        name: impl Into<String>,
        schema: AvroSchema,
        default: Value,
    ) -> Result<Self, SchemaError> {
        Self::new(name, schema, false, Some(default), None)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &AvroSchema {
        &self.schema
    }

    /// Type tag of the field's schema.
    pub fn kind(&self) -> SchemaKind {
        self.schema.kind()
    }

    /// The default value, if the field has one.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn has_default_value(&self) -> bool {
        self.default.is_some()
    }

    pub fn order(&self) -> Option<FieldOrder> {
        self.order
    }

    pub fn is_type_from_registry(&self) -> bool {
        self.is_type_from_registry
    }

    /// Serialize the field to its canonical JSON form.
    ///
    /// Keys are written in the order `name`, `type`, `default`, `order`. The type is
    /// written as its full name when it came from the registry, otherwise inline.
    /// `default` and `order` only appear when present.
    pub fn to_json_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("name".to_string(), json!(&self.name));

        let type_value = match (self.is_type_from_registry, self.schema.fullname()) {
            (true, Some(fullname)) => json!(fullname),
            _ => self.schema.to_json_value(),
        };
        obj.insert("type".to_string(), type_value);

        if let Some(default) = &self.default {
            obj.insert("default".to_string(), default.clone());
        }

        if let Some(order) = self.order {
            obj.insert("order".to_string(), json!(order.as_str()));
        }

        Value::Object(obj)
    }
}
