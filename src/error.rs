//! Error types for schema validation and property binding

use thiserror::Error;

use crate::schema::SchemaKind;

/// Errors that can occur while building or parsing schemas
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// Name does not follow the identifier grammar
    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },
    /// Field sort order is not one of ascending, descending, ignore
    #[error("Invalid field sort order '{0}' (expected ascending, descending or ignore)")]
    InvalidOrder(String),
    /// Invalid schema structure
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
    /// Unsupported or unknown type
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),
    /// Schema text is not valid JSON
    #[error("Parse error: {0}")]
    ParseError(String),
    /// A default value does not match its field type
    #[error("Invalid default for field '{field}': {reason}")]
    InvalidDefault { field: String, reason: String },
}

/// A dynamic value did not have the shape a typed accessor expected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    /// Value variant does not match
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// Value is well typed but outside the accepted range
    #[error("Value out of range: {0}")]
    OutOfRange(String),
    /// Value could not be converted for another reason
    #[error("Invalid value: {0}")]
    Invalid(String),
}

/// Errors that can occur when binding runtime properties to schema fields
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindingError {
    /// Property type is not compatible with the schema type and no converter applies
    #[error(
        "Property {property} in object {declaring_type} isn't compatible with schema type {kind}"
    )]
    Incompatible {
        property: String,
        declaring_type: String,
        kind: SchemaKind,
    },
    /// Record field has no runtime property with the same name
    #[error("Object {declaring_type} has no property for field '{field}'")]
    MissingProperty {
        field: String,
        declaring_type: String,
    },
    /// Property has no setter
    #[error("Property {property} in object {declaring_type} is read-only")]
    ReadOnly {
        property: String,
        declaring_type: String,
    },
    /// The property setter rejected the value
    #[error("Failed to write property {property} in object {declaring_type}: {source}")]
    Write {
        property: String,
        declaring_type: String,
        #[source]
        source: ValueError,
    },
    /// A converter failed to transform a value
    #[error("Conversion failed for property {property} in object {declaring_type}: {source}")]
    Conversion {
        property: String,
        declaring_type: String,
        #[source]
        source: ValueError,
    },
    /// Two converters were registered under the same key
    #[error("A converter for schema type {kind} and runtime type {runtime_type} is already registered")]
    DuplicateConverter {
        kind: SchemaKind,
        runtime_type: String,
    },
    /// Input record has no value for a field without a default
    #[error("No value and no default for field '{field}'")]
    MissingValue { field: String },
    /// Input value does not have the shape of the field's schema
    #[error("Value for field '{field}' does not match schema type {kind}, found {found}")]
    NonConforming {
        field: String,
        kind: SchemaKind,
        found: &'static str,
    },
    /// Input for a record was not a record value
    #[error("Expected a record value for {record}, found {found}")]
    NotARecord { record: String, found: &'static str },
    /// Field value could not be materialised
    #[error("Field '{field}': {source}")]
    Field {
        field: String,
        #[source]
        source: Box<BindingError>,
    },
    /// Sequence handling failed for an array field
    #[error("Sequence error: {0}")]
    Adapter(#[from] AdapterError),
    /// Field default could not be converted
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    /// Every field of a record that failed to bind
    #[error("Record {record} has {} incompatible field(s): {}", .errors.len(), join_errors(.errors))]
    Record {
        record: String,
        errors: Vec<BindingError>,
    },
}

impl BindingError {
    /// Name of the property or field this error is about, if it names one.
    pub fn property(&self) -> Option<&str> {
        match self {
            BindingError::Incompatible { property, .. }
            | BindingError::ReadOnly { property, .. }
            | BindingError::Write { property, .. }
            | BindingError::Conversion { property, .. } => Some(property),
            BindingError::MissingProperty { field, .. }
            | BindingError::MissingValue { field }
            | BindingError::NonConforming { field, .. }
            | BindingError::Field { field, .. } => Some(field),
            _ => None,
        }
    }
}

fn join_errors(errors: &[BindingError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A wrapped value lacks a sequence capability
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// The operation is not supported by the wrapped value
    #[error("{operation} is not supported on a {found} value")]
    Unsupported {
        operation: &'static str,
        found: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incompatible_message_names_property_type_and_kind() {
        let err = BindingError::Incompatible {
            property: "tags".to_string(),
            declaring_type: "Person".to_string(),
            kind: SchemaKind::Array,
        };
        let msg = err.to_string();
        assert!(msg.contains("tags"));
        assert!(msg.contains("Person"));
        assert!(msg.contains("array"));
        assert_eq!(err.property(), Some("tags"));
    }

    #[test]
    fn test_record_error_lists_every_field() {
        let err = BindingError::Record {
            record: "Person".to_string(),
            errors: vec![
                BindingError::MissingProperty {
                    field: "email".to_string(),
                    declaring_type: "Person".to_string(),
                },
                BindingError::Incompatible {
                    property: "age".to_string(),
                    declaring_type: "Person".to_string(),
                    kind: SchemaKind::Int,
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("2 incompatible field(s)"));
        assert!(msg.contains("email"));
        assert!(msg.contains("age"));
    }
}
