//! Avro schema types and parsing.
//!
//! This module defines the schema type system, the validated [`SchemaField`]
//! record member, identifier rules and the JSON schema parser.

mod field;
pub mod name;
mod parser;
mod types;

pub use field::SchemaField;
pub use name::{is_well_formed_name, validate_fullname, validate_name};
pub use parser::{parse_schema, parse_schema_with_options, SchemaParser};
pub use types::*;
