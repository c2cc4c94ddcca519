//! Avro schema fields bound to runtime object properties
//!
//! This library validates schema fields, checks that runtime properties can
//! hold the values of the fields they are bound to, converts between schema
//! and runtime shapes, and gives decoders and encoders uniform access to
//! sequence values.

pub mod bind;
pub mod error;
pub mod schema;
pub mod value;

// Re-export main types
pub use bind::{
    BindingConfig, BindingIdentity, ConverterRegistry, ConverterRegistryBuilder,
    EnumSymbolConverter, FieldBinding, FieldConverter, Property, PropertyAccessor,
    PropertyBinding, PropertySet, RecordBinding, RuntimeFamily, RuntimeType, SequenceAdapter,
    SequenceKind, TimestampMillisConverter,
};
pub use error::{AdapterError, BindingError, SchemaError, ValueError};
pub use schema::{
    parse_schema, parse_schema_with_options, AvroSchema, EnumSchema, FieldOrder, FixedSchema,
    NamedRef, RecordSchema, SchemaField, SchemaKind, SchemaParser,
};
pub use value::Value;
