//! Validated binding of one runtime property to one schema type tag.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::bind::converter::{ConverterRegistry, FieldConverter};
use crate::bind::property::PropertyAccessor;
use crate::bind::runtime::RuntimeType;
use crate::error::{BindingError, ValueError};
use crate::schema::SchemaKind;
use crate::value::Value;

/// Identity of a binding: which property of which type is bound to which
/// schema type tag. Two bindings are equal when their identities are.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingIdentity {
    pub declaring_type: String,
    pub property: String,
    pub kind: SchemaKind,
}

/// A runtime property bound to a schema type tag, directly or through a
/// converter.
///
/// Compatibility is checked once, at construction. After that the binding is
/// immutable and can be shared across threads and reused for any number of
/// instances.
pub struct PropertyBinding<T> {
    property: Arc<dyn PropertyAccessor<T>>,
    kind: SchemaKind,
    converter: Option<Arc<dyn FieldConverter>>,
}

impl<T> PropertyBinding<T> {
    /// Bind `property` to `kind`.
    ///
    /// The effective runtime type is the converter's exposed type when a
    /// converter is given, otherwise the property's own type. If it is not
    /// compatible with `kind` and no converter was given, `registry` is asked
    /// for a default converter keyed by (`kind`, property type).
    ///
    /// # Errors
    /// `BindingError::Incompatible` naming the property, its declaring type and
    /// the schema type tag when neither a direct nor a converted binding exists.
    pub fn new(
        property: Arc<dyn PropertyAccessor<T>>,
        kind: SchemaKind,
        converter: Option<Arc<dyn FieldConverter>>,
        registry: &ConverterRegistry,
    ) -> Result<Self, BindingError> {
        if is_compatible(property.runtime_type(), kind, converter.as_deref()) {
            match &converter {
                Some(c) => debug!(
                    property = property.name(),
                    declaring_type = property.declaring_type(),
                    kind = %kind,
                    converter = c.name(),
                    "Bound property through explicit converter"
                ),
                None => trace!(
                    property = property.name(),
                    declaring_type = property.declaring_type(),
                    kind = %kind,
                    "Bound property directly"
                ),
            }
            return Ok(Self {
                property,
                kind,
                converter,
            });
        }

        if converter.is_none() {
            if let Some(found) = registry.lookup(kind, property.runtime_type()) {
                debug!(
                    property = property.name(),
                    declaring_type = property.declaring_type(),
                    kind = %kind,
                    converter = found.name(),
                    "Bound property through default converter"
                );
                return Ok(Self {
                    property,
                    kind,
                    converter: Some(found),
                });
            }
        }

        Err(BindingError::Incompatible {
            property: property.name().to_string(),
            declaring_type: property.declaring_type().to_string(),
            kind,
        })
    }

    /// Bind using the converter attached to the property, if any.
    pub fn bind(
        property: Arc<dyn PropertyAccessor<T>>,
        kind: SchemaKind,
        registry: &ConverterRegistry,
    ) -> Result<Self, BindingError> {
        let converter = property.converter().cloned();
        Self::new(property, kind, converter, registry)
    }

    /// Read the property in its schema representation.
    pub fn get(&self, instance: &T) -> Result<Value, BindingError> {
        let value = self.property.get(instance);
        match &self.converter {
            Some(converter) => converter
                .to_schema(value)
                .map_err(|e| self.conversion_error(e)),
            None => Ok(value),
        }
    }

    /// Write a schema-representation value into the property.
    pub fn set(&self, instance: &mut T, value: Value) -> Result<(), BindingError> {
        let value = self.from_schema(value)?;
        self.write(instance, value)
    }

    /// Turn a schema-representation value into the runtime value [`set`] would
    /// store, without touching any instance.
    ///
    /// [`set`]: PropertyBinding::set
    pub fn from_schema(&self, value: Value) -> Result<Value, BindingError> {
        if !self.property.is_writable() {
            return Err(BindingError::ReadOnly {
                property: self.property.name().to_string(),
                declaring_type: self.property.declaring_type().to_string(),
            });
        }

        match &self.converter {
            Some(converter) => converter
                .from_schema(value)
                .map_err(|e| self.conversion_error(e)),
            None => Ok(value),
        }
    }

    /// Store a runtime value produced by [`from_schema`].
    ///
    /// [`from_schema`]: PropertyBinding::from_schema
    pub(crate) fn write(&self, instance: &mut T, value: Value) -> Result<(), BindingError> {
        self.property
            .set(instance, value)
            .map_err(|source| BindingError::Write {
                property: self.property.name().to_string(),
                declaring_type: self.property.declaring_type().to_string(),
                source,
            })
    }

    /// The runtime type encoders and decoders see: the converter's exposed
    /// type, or the property's own type for direct bindings.
    pub fn effective_type(&self) -> RuntimeType {
        match &self.converter {
            Some(converter) => converter.exposed_type(),
            None => self.property.runtime_type().clone(),
        }
    }

    pub fn kind(&self) -> SchemaKind {
        self.kind
    }

    pub fn property_name(&self) -> &str {
        self.property.name()
    }

    pub fn declaring_type(&self) -> &str {
        self.property.declaring_type()
    }

    pub fn converter(&self) -> Option<&Arc<dyn FieldConverter>> {
        self.converter.as_ref()
    }

    pub fn is_converted(&self) -> bool {
        self.converter.is_some()
    }

    pub fn identity(&self) -> BindingIdentity {
        BindingIdentity {
            declaring_type: self.declaring_type().to_string(),
            property: self.property_name().to_string(),
            kind: self.kind,
        }
    }

    fn conversion_error(&self, source: ValueError) -> BindingError {
        BindingError::Conversion {
            property: self.property.name().to_string(),
            declaring_type: self.property.declaring_type().to_string(),
            source,
        }
    }
}

fn is_compatible(
    property_type: &RuntimeType,
    kind: SchemaKind,
    converter: Option<&dyn FieldConverter>,
) -> bool {
    match converter {
        None => property_type.is_compatible_with(kind),
        Some(c) => {
            (c.schema_kind() == kind || kind == SchemaKind::Union)
                && c.exposed_type().is_compatible_with(kind)
        }
    }
}

impl<T> Clone for PropertyBinding<T> {
    fn clone(&self) -> Self {
        Self {
            property: Arc::clone(&self.property),
            kind: self.kind,
            converter: self.converter.clone(),
        }
    }
}

impl<T> PartialEq for PropertyBinding<T> {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.property_name() == other.property_name()
            && self.declaring_type() == other.declaring_type()
    }
}

impl<T> Eq for PropertyBinding<T> {}

impl<T> fmt::Debug for PropertyBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyBinding")
            .field("declaring_type", &self.declaring_type())
            .field("property", &self.property_name())
            .field("kind", &self.kind)
            .field("converter", &self.converter.as_ref().map(|c| c.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::property::Property;

    #[derive(Debug, Default)]
    struct Person {
        age: i32,
        id: CustomerId,
        tags: Vec<String>,
        nickname: Option<String>,
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct CustomerId(u64);

    /// `CustomerId` as a `cust-<n>` string.
    struct CustomerIdConverter;

    impl FieldConverter for CustomerIdConverter {
        fn name(&self) -> &str {
            "customer-id"
        }
        fn schema_kind(&self) -> SchemaKind {
            SchemaKind::String
        }
        fn exposed_type(&self) -> RuntimeType {
            RuntimeType::Text
        }
        fn to_schema(&self, value: Value) -> Result<Value, ValueError> {
            let raw = value
                .field("raw")
                .cloned()
                .ok_or_else(|| ValueError::Invalid("missing raw".to_string()))?;
            Ok(Value::String(format!("cust-{}", i64::try_from(raw)?)))
        }
        fn from_schema(&self, value: Value) -> Result<Value, ValueError> {
            let text = String::try_from(value)?;
            let raw = text
                .strip_prefix("cust-")
                .and_then(|n| n.parse::<i64>().ok())
                .ok_or_else(|| ValueError::Invalid(text.clone()))?;
            Ok(Value::Record(vec![("raw".to_string(), Value::Long(raw))]))
        }
    }

    fn age() -> Arc<dyn PropertyAccessor<Person>> {
        Arc::new(
            Property::new("age", "Person", RuntimeType::I32, |p: &Person| p.age.into())
                .with_setter(|p, v| {
                    p.age = v.try_into()?;
                    Ok(())
                }),
        )
    }

    fn id() -> Arc<dyn PropertyAccessor<Person>> {
        Arc::new(
            Property::new("id", "Person", RuntimeType::class("CustomerId"), |p: &Person| {
                Value::Record(vec![("raw".to_string(), Value::Long(p.id.0 as i64))])
            })
            .with_setter(|p, v| {
                let raw = v
                    .field("raw")
                    .cloned()
                    .ok_or_else(|| ValueError::Invalid("missing raw".to_string()))?;
                p.id = CustomerId(i64::try_from(raw)? as u64);
                Ok(())
            }),
        )
    }

    fn tags() -> Arc<dyn PropertyAccessor<Person>> {
        Arc::new(Property::new(
            "tags",
            "Person",
            RuntimeType::list(RuntimeType::Text),
            |p: &Person| p.tags.iter().map(|t| Value::from(t.as_str())).collect::<Vec<_>>().into(),
        ))
    }

    fn registry_with_customer_id() -> ConverterRegistry {
        ConverterRegistry::builder()
            .register(RuntimeType::class("CustomerId"), Arc::new(CustomerIdConverter))
            .unwrap()
            .build()
    }

    #[test]
    fn test_direct_binding_round_trip() {
        let binding =
            PropertyBinding::new(age(), SchemaKind::Int, None, &ConverterRegistry::empty()).unwrap();
        let mut person = Person::default();
        binding.set(&mut person, Value::Int(42)).unwrap();
        assert_eq!(binding.get(&person).unwrap(), Value::Int(42));
        assert_eq!(binding.effective_type(), RuntimeType::I32);
        assert!(!binding.is_converted());
    }

    #[test]
    fn test_incompatible_without_converter() {
        let err = PropertyBinding::new(age(), SchemaKind::Long, None, &ConverterRegistry::empty())
            .unwrap_err();
        assert_eq!(
            err,
            BindingError::Incompatible {
                property: "age".to_string(),
                declaring_type: "Person".to_string(),
                kind: SchemaKind::Long,
            }
        );
    }

    #[test]
    fn test_registry_fallback() {
        let registry = registry_with_customer_id();
        let binding = PropertyBinding::new(id(), SchemaKind::String, None, &registry).unwrap();
        assert!(binding.is_converted());
        assert_eq!(binding.effective_type(), RuntimeType::Text);

        let mut person = Person {
            id: CustomerId(7),
            ..Default::default()
        };
        assert_eq!(binding.get(&person).unwrap(), Value::from("cust-7"));

        binding.set(&mut person, Value::from("cust-99")).unwrap();
        assert_eq!(person.id, CustomerId(99));
    }

    #[test]
    fn test_explicit_converter_skips_registry() {
        // Declared kind mismatch: explicit converters are never replaced by
        // registry lookups.
        let registry = registry_with_customer_id();
        let explicit: Arc<dyn FieldConverter> = Arc::new(CustomerIdConverter);
        let result = PropertyBinding::new(id(), SchemaKind::Bytes, Some(explicit), &registry);
        assert!(matches!(result, Err(BindingError::Incompatible { .. })));
    }

    #[test]
    fn test_explicit_converter_binds_union() {
        let explicit: Arc<dyn FieldConverter> = Arc::new(CustomerIdConverter);
        let binding = PropertyBinding::new(
            id(),
            SchemaKind::Union,
            Some(explicit),
            &ConverterRegistry::empty(),
        )
        .unwrap();
        assert!(binding.is_converted());
    }

    #[test]
    fn test_conversion_failure_on_set() {
        let binding =
            PropertyBinding::new(id(), SchemaKind::String, None, &registry_with_customer_id())
                .unwrap();
        let mut person = Person::default();
        let err = binding.set(&mut person, Value::from("nope")).unwrap_err();
        assert!(matches!(err, BindingError::Conversion { .. }));
    }

    #[test]
    fn test_set_read_only_property() {
        let binding =
            PropertyBinding::new(tags(), SchemaKind::Array, None, &ConverterRegistry::empty())
                .unwrap();
        let mut person = Person::default();
        let err = binding
            .set(&mut person, Value::Array(Vec::new()))
            .unwrap_err();
        assert!(matches!(err, BindingError::ReadOnly { ref property, .. } if property == "tags"));
    }

    #[test]
    fn test_write_failure_reported() {
        let binding =
            PropertyBinding::new(age(), SchemaKind::Int, None, &ConverterRegistry::empty()).unwrap();
        let mut person = Person::default();
        let err = binding.set(&mut person, Value::from("old")).unwrap_err();
        assert!(matches!(err, BindingError::Write { .. }));
    }

    #[test]
    fn test_array_to_scalar_fails() {
        let err = PropertyBinding::new(age(), SchemaKind::Array, None, &ConverterRegistry::empty())
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("age"));
        assert!(msg.contains("Person"));
        assert!(msg.contains("array"));
    }

    #[test]
    fn test_nullable_property_binds_null() {
        let nickname: Arc<dyn PropertyAccessor<Person>> = Arc::new(Property::new(
            "nickname",
            "Person",
            RuntimeType::optional(RuntimeType::Text),
            |p: &Person| p.nickname.clone().into(),
        ));
        assert!(PropertyBinding::new(
            nickname,
            SchemaKind::Null,
            None,
            &ConverterRegistry::empty()
        )
        .is_ok());
    }

    #[test]
    fn test_equality_is_identity() {
        let registry = ConverterRegistry::empty();
        let a = PropertyBinding::new(age(), SchemaKind::Int, None, &registry).unwrap();
        let b = PropertyBinding::new(age(), SchemaKind::Int, None, &registry).unwrap();
        let c = PropertyBinding::new(age(), SchemaKind::Union, None, &registry).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn test_binding_is_send_and_sync() {
        fn assert_send_sync<B: Send + Sync>() {}
        assert_send_sync::<PropertyBinding<Person>>();
    }
}
