//! JSON schema parser.
//!
//! Parses schema JSON into the AvroSchema type hierarchy. Record fields are
//! always built through [`SchemaField::new`], so field names and sort orders
//! are validated regardless of the parser's strictness.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::SchemaError;
use crate::schema::name::{validate_fullname, validate_name};
use crate::schema::{
    AvroSchema, EnumSchema, FixedSchema, NamedRef, RecordSchema, SchemaField, SchemaKind,
};

/// Parse a schema from a JSON string.
///
/// # Example
/// ```
/// use avro_bind::schema::{parse_schema, AvroSchema};
///
/// let schema = parse_schema(r#""string""#).unwrap();
/// assert_eq!(schema, AvroSchema::String);
/// ```
pub fn parse_schema(json: &str) -> Result<AvroSchema, SchemaError> {
    parse_schema_with_options(json, false)
}

/// Parse a schema from a JSON string with validation options.
///
/// In strict mode type names, enum symbols and union rules (no duplicate
/// branches, no nested unions) are errors. In permissive mode they are logged
/// as warnings. Field names and orders are validated in both modes.
pub fn parse_schema_with_options(json: &str, strict: bool) -> Result<AvroSchema, SchemaError> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| SchemaError::ParseError(format!("Invalid JSON: {}", e)))?;

    let mut parser = SchemaParser::new().with_strict(strict);
    parser.parse(&value)
}

/// Schema parser with named type registry.
///
/// Named types (records, errors, enums, fixed) are registered by full name as
/// they are defined so later string references resolve to them.
#[derive(Debug, Default)]
pub struct SchemaParser {
    named_types: HashMap<String, AvroSchema>,
    current_namespace: Option<String>,
    strict_schema: bool,
}

impl SchemaParser {
    /// Create a new parser in permissive mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new parser in strict mode.
    pub fn new_strict() -> Self {
        Self::new().with_strict(true)
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict_schema = strict;
        self
    }

    /// Parse a JSON value into an AvroSchema.
    pub fn parse(&mut self, value: &Value) -> Result<AvroSchema, SchemaError> {
        match value {
            Value::String(s) => self.parse_string_schema(s),
            Value::Object(obj) => self.parse_object_schema(obj),
            Value::Array(arr) => self.parse_union_schema(arr),
            _ => Err(SchemaError::InvalidSchema(format!(
                "Expected string, object, or array, found: {}",
                value
            ))),
        }
    }

    /// Get a named type definition by full name.
    pub fn get_named_type(&self, fullname: &str) -> Option<&AvroSchema> {
        self.named_types.get(fullname)
    }

    pub fn named_types(&self) -> &HashMap<String, AvroSchema> {
        &self.named_types
    }

    fn parse_string_schema(&self, s: &str) -> Result<AvroSchema, SchemaError> {
        if let Some(primitive) = primitive(s) {
            return Ok(primitive);
        }
        self.resolve_reference(s)
    }

    fn parse_object_schema(&mut self, obj: &Map<String, Value>) -> Result<AvroSchema, SchemaError> {
        let type_value = obj
            .get("type")
            .ok_or_else(|| SchemaError::InvalidSchema("Missing 'type' field".to_string()))?;

        let type_str = match type_value {
            Value::String(s) => s.as_str(),
            // {"type": {...}} or {"type": [...]} wraps another schema
            other => return self.parse(other),
        };

        // Logical type annotations are carried by the base type only.
        if let Some(primitive) = primitive(type_str) {
            return Ok(primitive);
        }

        match type_str {
            "record" => self.parse_record_schema(obj, SchemaKind::Record),
            "error" => self.parse_record_schema(obj, SchemaKind::Error),
            "enum" => self.parse_enum_schema(obj),
            "array" => {
                let items = obj.get("items").ok_or_else(|| {
                    SchemaError::InvalidSchema("Array missing 'items' field".to_string())
                })?;
                Ok(AvroSchema::Array(Box::new(self.parse(items)?)))
            }
            "map" => {
                let values = obj.get("values").ok_or_else(|| {
                    SchemaError::InvalidSchema("Map missing 'values' field".to_string())
                })?;
                Ok(AvroSchema::Map(Box::new(self.parse(values)?)))
            }
            "fixed" => self.parse_fixed_schema(obj),
            other => self.resolve_reference(other),
        }
    }

    fn parse_union_schema(&mut self, arr: &[Value]) -> Result<AvroSchema, SchemaError> {
        if arr.is_empty() {
            return Err(SchemaError::InvalidSchema(
                "Union schema cannot be empty".to_string(),
            ));
        }

        let variants = arr
            .iter()
            .map(|v| self.parse(v))
            .collect::<Result<Vec<_>, _>>()?;

        self.validate_union(&variants)?;

        Ok(AvroSchema::Union(variants))
    }

    fn parse_record_schema(
        &mut self,
        obj: &Map<String, Value>,
        kind: SchemaKind,
    ) -> Result<AvroSchema, SchemaError> {
        let names = self.named_definition(obj, kind)?;

        // Register before parsing fields so recursive references resolve
        self.named_types.insert(
            names.fullname.clone(),
            AvroSchema::Named(NamedRef::new(names.fullname.clone(), kind)),
        );

        let fields_value = obj
            .get("fields")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                SchemaError::InvalidSchema(format!("{} missing 'fields' array", kind))
            })?;

        let prev_namespace = self.current_namespace.clone();
        self.current_namespace = names.namespace.clone();
        let fields = fields_value
            .iter()
            .map(|f| self.parse_field(f))
            .collect::<Result<Vec<_>, _>>();
        self.current_namespace = prev_namespace;
        let fields = fields?;

        let mut seen = HashSet::new();
        if let Some(dup) = fields.iter().find(|f| !seen.insert(f.name())) {
            return Err(SchemaError::InvalidSchema(format!(
                "Duplicate field '{}' in {}",
                dup.name(),
                names.fullname
            )));
        }

        let record = RecordSchema {
            name: names.name,
            namespace: names.namespace,
            fields,
            doc: string_attr(obj, "doc"),
            aliases: string_list_attr(obj, "aliases"),
        };

        let schema = match kind {
            SchemaKind::Error => AvroSchema::Error(record),
            _ => AvroSchema::Record(record),
        };
        self.named_types.insert(names.fullname, schema.clone());

        Ok(schema)
    }

    /// Parse one record field through the validating constructor.
    fn parse_field(&mut self, value: &Value) -> Result<SchemaField, SchemaError> {
        let obj = value
            .as_object()
            .ok_or_else(|| SchemaError::InvalidSchema("Field must be an object".to_string()))?;

        let name = obj
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SchemaError::InvalidSchema("Field requires a 'name' attribute".to_string()))?;

        let type_value = obj.get("type").ok_or_else(|| {
            SchemaError::InvalidSchema(format!("Field '{}' missing 'type'", name))
        })?;

        let schema = self.parse(type_value)?;
        let is_type_from_registry = matches!(schema, AvroSchema::Named(_));

        let order = match obj.get("order") {
            None => None,
            Some(Value::String(s)) => Some(s.as_str()),
            Some(other) => {
                return Err(SchemaError::InvalidOrder(other.to_string()));
            }
        };

        SchemaField::new(
            name,
            schema,
            is_type_from_registry,
            obj.get("default").cloned(),
            order,
        )
    }

    fn parse_enum_schema(&mut self, obj: &Map<String, Value>) -> Result<AvroSchema, SchemaError> {
        let names = self.named_definition(obj, SchemaKind::Enumeration)?;

        let symbols = obj
            .get("symbols")
            .and_then(|v| v.as_array())
            .ok_or_else(|| SchemaError::InvalidSchema("Enum missing 'symbols' array".to_string()))?
            .iter()
            .map(|v| {
                v.as_str().map(String::from).ok_or_else(|| {
                    SchemaError::InvalidSchema(format!("Enum symbol must be a string: {}", v))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if symbols.is_empty() {
            return Err(SchemaError::InvalidSchema(
                "Enum must have at least one symbol".to_string(),
            ));
        }

        for symbol in &symbols {
            self.check(validate_name(symbol))?;
        }

        let default = string_attr(obj, "default");
        if let Some(default) = &default {
            if !symbols.contains(default) {
                return Err(SchemaError::InvalidSchema(format!(
                    "Enum default '{}' is not one of its symbols",
                    default
                )));
            }
        }

        let schema = AvroSchema::Enum(EnumSchema {
            name: names.name,
            namespace: names.namespace,
            symbols,
            doc: string_attr(obj, "doc"),
            default,
        });
        self.named_types.insert(names.fullname, schema.clone());

        Ok(schema)
    }

    fn parse_fixed_schema(&mut self, obj: &Map<String, Value>) -> Result<AvroSchema, SchemaError> {
        let names = self.named_definition(obj, SchemaKind::Fixed)?;

        let size = obj
            .get("size")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| SchemaError::InvalidSchema("Fixed missing 'size' field".to_string()))?;

        let schema = AvroSchema::Fixed(FixedSchema {
            name: names.name,
            namespace: names.namespace,
            size: size as usize,
        });
        self.named_types.insert(names.fullname, schema.clone());

        Ok(schema)
    }

    /// Work out the simple name, namespace and full name of a named type
    /// definition, validating the name.
    fn named_definition(
        &self,
        obj: &Map<String, Value>,
        kind: SchemaKind,
    ) -> Result<DefinitionNames, SchemaError> {
        let raw = obj
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SchemaError::InvalidSchema(format!("{} missing 'name' field", kind)))?;

        let (name, namespace) = match raw.rsplit_once('.') {
            Some((ns, simple)) => (simple.to_string(), Some(ns.to_string())),
            None => {
                let ns = string_attr(obj, "namespace").or_else(|| self.current_namespace.clone());
                (raw.to_string(), ns.filter(|ns| !ns.is_empty()))
            }
        };

        let fullname = match &namespace {
            Some(ns) => format!("{}.{}", ns, name),
            None => name.clone(),
        };
        self.check(validate_fullname(&fullname))?;

        if self
            .named_types
            .get(&fullname)
            .is_some_and(|existing| !matches!(existing, AvroSchema::Named(_)))
        {
            return Err(SchemaError::InvalidSchema(format!(
                "Named type '{}' is defined more than once",
                fullname
            )));
        }

        Ok(DefinitionNames {
            name,
            namespace,
            fullname,
        })
    }

    /// Resolve a type name against the registry.
    fn resolve_reference(&self, name: &str) -> Result<AvroSchema, SchemaError> {
        let candidates = match (&self.current_namespace, name.contains('.')) {
            (Some(ns), false) => vec![format!("{}.{}", ns, name), name.to_string()],
            _ => vec![name.to_string()],
        };

        candidates
            .into_iter()
            .find_map(|fullname| {
                self.named_types
                    .get(&fullname)
                    .map(|schema| AvroSchema::Named(NamedRef::new(fullname, schema.kind())))
            })
            .ok_or_else(|| SchemaError::UnsupportedType(format!("Unknown type: {}", name)))
    }

    /// Validate union rules: no nested unions, no duplicate branches.
    fn validate_union(&self, variants: &[AvroSchema]) -> Result<(), SchemaError> {
        let mut seen = HashSet::new();
        for (i, variant) in variants.iter().enumerate() {
            if matches!(variant, AvroSchema::Union(_)) {
                self.report(format!(
                    "Union contains nested union at position {} (unions cannot be nested)",
                    i
                ))?;
            }

            let key = match variant.fullname() {
                Some(fullname) => format!("{}:{}", variant.kind(), fullname),
                None => variant.kind().to_string(),
            };
            if !seen.insert(key.clone()) {
                self.report(format!(
                    "Union contains duplicate type '{}' at position {}",
                    key, i
                ))?;
            }
        }
        Ok(())
    }

    fn check(&self, result: Result<(), SchemaError>) -> Result<(), SchemaError> {
        match result {
            Err(e) if !self.strict_schema => {
                warn!(error = %e, "Accepting schema violation in permissive mode");
                Ok(())
            }
            other => other,
        }
    }

    fn report(&self, msg: String) -> Result<(), SchemaError> {
        self.check(Err(SchemaError::InvalidSchema(msg)))
    }
}

struct DefinitionNames {
    name: String,
    namespace: Option<String>,
    fullname: String,
}

fn primitive(s: &str) -> Option<AvroSchema> {
    match s {
        "null" => Some(AvroSchema::Null),
        "boolean" => Some(AvroSchema::Boolean),
        "int" => Some(AvroSchema::Int),
        "long" => Some(AvroSchema::Long),
        "float" => Some(AvroSchema::Float),
        "double" => Some(AvroSchema::Double),
        "bytes" => Some(AvroSchema::Bytes),
        "string" => Some(AvroSchema::String),
        _ => None,
    }
}

fn string_attr(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(|v| v.as_str()).map(String::from)
}

fn string_list_attr(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    obj.get(key)
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}
