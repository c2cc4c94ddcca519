//! Binding of runtime properties to schema fields.
//!
//! A [`PropertySet`] describes the properties a runtime type exposes. A
//! [`PropertyBinding`] ties one of them to a schema type tag, directly or
//! through a [`FieldConverter`], and a [`RecordBinding`] does this for every
//! field of a record schema.

mod binding;
mod config;
mod converter;
mod property;
mod record;
mod runtime;
mod sequence;

pub use binding::{BindingIdentity, PropertyBinding};
pub use config::BindingConfig;
pub use converter::{
    ConverterRegistry, ConverterRegistryBuilder, EnumSymbolConverter, FieldConverter,
    TimestampMillisConverter,
};
pub use property::{Property, PropertyAccessor, PropertySet};
pub use record::{FieldBinding, RecordBinding};
pub use runtime::{RuntimeFamily, RuntimeType};
pub use sequence::{SequenceAdapter, SequenceKind};
