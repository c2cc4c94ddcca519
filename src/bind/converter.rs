//! Pluggable value converters and the default converter registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::bind::runtime::{RuntimeFamily, RuntimeType};
use crate::error::{BindingError, ValueError};
use crate::schema::{EnumSchema, SchemaKind};
use crate::value::Value;

/// Bidirectional transform between a runtime representation and the
/// representation a schema type expects.
///
/// Implementations must not hold mutable state: the same converter is shared
/// by every binding that uses it and may be called from many threads at once.
/// `from_schema(to_schema(x))` must equal `x` for every valid runtime value
/// `x`; this is not checked.
pub trait FieldConverter: Send + Sync {
    /// Name used in logs and debug output.
    fn name(&self) -> &str;

    /// Schema type tag the converter produces.
    fn schema_kind(&self) -> SchemaKind;

    /// Runtime type the converter exposes to encoders and decoders.
    fn exposed_type(&self) -> RuntimeType;

    /// Convert a runtime value into its schema representation.
    fn to_schema(&self, value: Value) -> Result<Value, ValueError>;

    /// Convert a schema representation back into the runtime value.
    fn from_schema(&self, value: Value) -> Result<Value, ValueError>;
}

impl fmt::Debug for dyn FieldConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldConverter")
            .field("name", &self.name())
            .field("schema_kind", &self.schema_kind())
            .field("exposed_type", &self.exposed_type())
            .finish()
    }
}

/// Default converters, keyed by schema type tag and runtime type.
///
/// Built once with [`ConverterRegistry::builder`], then read-only. Lookups are
/// deterministic: a converter registered for the exact runtime type wins over
/// one registered for the type's [`RuntimeFamily`].
#[derive(Default)]
pub struct ConverterRegistry {
    exact: HashMap<(SchemaKind, RuntimeType), Arc<dyn FieldConverter>>,
    family: HashMap<(SchemaKind, RuntimeFamily), Arc<dyn FieldConverter>>,
}

impl ConverterRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> ConverterRegistryBuilder {
        ConverterRegistryBuilder::default()
    }

    /// A registry holding the built-in converters: millisecond timestamps as
    /// longs. Enum symbol converters need their symbol list, so they are
    /// added per enum with [`ConverterRegistryBuilder::register_enum`].
    pub fn with_defaults() -> Self {
        let mut registry = Self::default();
        registry.exact.insert(
            (SchemaKind::Long, TimestampMillisConverter::runtime_type()),
            Arc::new(TimestampMillisConverter),
        );
        registry
    }

    /// A builder seeded with the built-in converters.
    pub fn builder_with_defaults() -> ConverterRegistryBuilder {
        ConverterRegistryBuilder {
            registry: Self::with_defaults(),
        }
    }

    /// Find the converter for a schema type tag and runtime type.
    pub fn lookup(
        &self,
        kind: SchemaKind,
        runtime_type: &RuntimeType,
    ) -> Option<Arc<dyn FieldConverter>> {
        if let Some(found) = self.exact.get(&(kind, runtime_type.clone())) {
            debug!(
                kind = %kind,
                runtime_type = %runtime_type,
                converter = found.name(),
                "Exact converter match"
            );
            return Some(Arc::clone(found));
        }

        let family = runtime_type.family();
        self.family.get(&(kind, family)).map(|found| {
            debug!(
                kind = %kind,
                runtime_type = %runtime_type,
                ?family,
                converter = found.name(),
                "Family converter match"
            );
            Arc::clone(found)
        })
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.family.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("exact", &self.exact.len())
            .field("family", &self.family.len())
            .finish()
    }
}

/// Collects converters before freezing them into a [`ConverterRegistry`].
#[derive(Default)]
pub struct ConverterRegistryBuilder {
    registry: ConverterRegistry,
}

impl ConverterRegistryBuilder {
    /// Register a converter for one exact runtime type.
    ///
    /// # Errors
    /// `BindingError::DuplicateConverter` if a converter is already registered for the
    /// same schema type and runtime type.
    pub fn register(
        mut self,
        runtime_type: RuntimeType,
        converter: Arc<dyn FieldConverter>,
    ) -> Result<Self, BindingError> {
        let key = (converter.schema_kind(), runtime_type);
        if self.registry.exact.contains_key(&key) {
            return Err(BindingError::DuplicateConverter {
                kind: key.0,
                runtime_type: key.1.to_string(),
            });
        }
        self.registry.exact.insert(key, converter);
        Ok(self)
    }

    /// Register a converter for every runtime type of a family.
    pub fn register_family(
        mut self,
        family: RuntimeFamily,
        converter: Arc<dyn FieldConverter>,
    ) -> Result<Self, BindingError> {
        let key = (converter.schema_kind(), family);
        if self.registry.family.contains_key(&key) {
            return Err(BindingError::DuplicateConverter {
                kind: key.0,
                runtime_type: format!("any {:?}", family),
            });
        }
        self.registry.family.insert(key, converter);
        Ok(self)
    }

    /// Register an [`EnumSymbolConverter`] for the runtime enum `name`.
    pub fn register_enum<S>(
        self,
        name: impl Into<String>,
        symbols: impl IntoIterator<Item = S>,
    ) -> Result<Self, BindingError>
    where
        S: Into<String>,
    {
        self.register(
            RuntimeType::enumeration(name),
            Arc::new(EnumSymbolConverter::new(symbols)),
        )
    }

    pub fn build(self) -> ConverterRegistry {
        self.registry
    }
}

/// Maps an enum to its symbol text.
///
/// The symbol list is the enum's declaration order, so a symbol read back
/// from the schema recovers its index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSymbolConverter {
    symbols: Vec<String>,
}

impl EnumSymbolConverter {
    pub fn new<S: Into<String>>(symbols: impl IntoIterator<Item = S>) -> Self {
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }

    /// A converter using the symbols of a parsed enum schema.
    pub fn for_schema(schema: &EnumSchema) -> Self {
        Self::new(schema.symbols.iter().cloned())
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    fn index_of(&self, symbol: &str) -> Result<i32, ValueError> {
        self.symbols
            .iter()
            .position(|s| s == symbol)
            .and_then(|index| i32::try_from(index).ok())
            .ok_or_else(|| ValueError::Invalid(format!("Unknown enum symbol '{}'", symbol)))
    }
}

impl FieldConverter for EnumSymbolConverter {
    fn name(&self) -> &str {
        "enum-symbol"
    }

    fn schema_kind(&self) -> SchemaKind {
        SchemaKind::String
    }

    fn exposed_type(&self) -> RuntimeType {
        RuntimeType::Text
    }

    fn to_schema(&self, value: Value) -> Result<Value, ValueError> {
        match value {
            Value::Enum(index, symbol) => {
                if self.index_of(&symbol)? != index {
                    return Err(ValueError::Invalid(format!(
                        "Enum symbol '{}' is not at index {}",
                        symbol, index
                    )));
                }
                Ok(Value::String(symbol))
            }
            other => Err(ValueError::TypeMismatch {
                expected: "enum",
                found: other.type_name(),
            }),
        }
    }

    fn from_schema(&self, value: Value) -> Result<Value, ValueError> {
        match value.unwrap_union() {
            Value::String(symbol) => Ok(Value::Enum(self.index_of(&symbol)?, symbol)),
            other => Err(ValueError::TypeMismatch {
                expected: "string",
                found: other.type_name(),
            }),
        }
    }
}

/// Maps a `Timestamp { millis }` value type to a `long` of milliseconds
/// since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampMillisConverter;

impl TimestampMillisConverter {
    pub const TYPE_NAME: &'static str = "Timestamp";
    pub const MILLIS_FIELD: &'static str = "millis";

    /// Runtime type the converter is registered for.
    pub fn runtime_type() -> RuntimeType {
        RuntimeType::structure(Self::TYPE_NAME)
    }
}

impl FieldConverter for TimestampMillisConverter {
    fn name(&self) -> &str {
        "timestamp-millis"
    }

    fn schema_kind(&self) -> SchemaKind {
        SchemaKind::Long
    }

    fn exposed_type(&self) -> RuntimeType {
        RuntimeType::I64
    }

    fn to_schema(&self, value: Value) -> Result<Value, ValueError> {
        match value.field(Self::MILLIS_FIELD) {
            Some(Value::Long(millis)) => Ok(Value::Long(*millis)),
            Some(other) => Err(ValueError::TypeMismatch {
                expected: "long",
                found: other.type_name(),
            }),
            None => Err(ValueError::Invalid(format!(
                "{} value has no '{}' field",
                Self::TYPE_NAME,
                Self::MILLIS_FIELD
            ))),
        }
    }

    fn from_schema(&self, value: Value) -> Result<Value, ValueError> {
        let millis = i64::try_from(value)?;
        Ok(Value::Record(vec![(
            Self::MILLIS_FIELD.to_string(),
            Value::Long(millis),
        )]))
    }
}
