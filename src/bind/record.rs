//! Binding of a whole record schema to the properties of a runtime type.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::bind::binding::PropertyBinding;
use crate::bind::config::BindingConfig;
use crate::bind::converter::ConverterRegistry;
use crate::bind::property::PropertySet;
use crate::bind::sequence::SequenceAdapter;
use crate::error::BindingError;
use crate::schema::{AvroSchema, RecordSchema, SchemaField, SchemaKind};
use crate::value::Value;

/// One schema field and the property bound to it.
///
/// `binding` is `None` only for fields left unbound because they have a
/// default and [`BindingConfig::allow_unbound_defaults`] is set.
pub struct FieldBinding<T> {
    field: SchemaField,
    binding: Option<PropertyBinding<T>>,
}

impl<T> FieldBinding<T> {
    pub fn field(&self) -> &SchemaField {
        &self.field
    }

    pub fn binding(&self) -> Option<&PropertyBinding<T>> {
        self.binding.as_ref()
    }

    fn default_value(
        &self,
        named_types: &HashMap<String, AvroSchema>,
    ) -> Result<Value, BindingError> {
        match self.field.default_value() {
            Some(json) => Value::from_json_with_types(json, self.field.schema(), named_types)
                .map_err(|e| BindingError::Field {
                    field: self.field.name().to_string(),
                    source: Box::new(e.into()),
                }),
            None => Err(BindingError::MissingValue {
                field: self.field.name().to_string(),
            }),
        }
    }
}

impl<T> Clone for FieldBinding<T> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            binding: self.binding.clone(),
        }
    }
}

impl<T> fmt::Debug for FieldBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBinding")
            .field("field", &self.field.name())
            .field("binding", &self.binding)
            .finish()
    }
}

/// Every field of a record schema bound to a property of `T`.
///
/// Binding validates the whole record up front and reports every failing
/// field at once. The result is immutable and can be reused to extract and
/// populate any number of instances.
///
/// # Example
/// ```
/// use avro_bind::bind::{
///     BindingConfig, ConverterRegistry, Property, PropertySet, RecordBinding, RuntimeType,
/// };
/// use avro_bind::schema::{AvroSchema, RecordSchema, SchemaField};
/// use avro_bind::Value;
///
/// #[derive(Default)]
/// struct Person {
///     age: i32,
/// }
///
/// let schema = RecordSchema::new(
///     "Person",
///     vec![SchemaField::required("age", AvroSchema::Int).unwrap()],
/// );
/// let properties = PropertySet::new("Person").with(
///     Property::new("age", "Person", RuntimeType::I32, |p: &Person| p.age.into()).with_setter(
///         |p, v| {
///             p.age = v.try_into()?;
///             Ok(())
///         },
///     ),
/// );
///
/// let binding = RecordBinding::bind(
///     &schema,
///     &properties,
///     &ConverterRegistry::default(),
///     &BindingConfig::default(),
/// )
/// .unwrap();
///
/// let mut person = Person::default();
/// binding
///     .populate(&mut person, &Value::Record(vec![("age".into(), Value::Int(42))]))
///     .unwrap();
/// assert_eq!(person.age, 42);
/// ```
pub struct RecordBinding<T> {
    record: String,
    fields: Vec<FieldBinding<T>>,
    named_types: Arc<HashMap<String, AvroSchema>>,
    config: BindingConfig,
}

impl<T> RecordBinding<T> {
    /// Bind every field of `schema` to the property with the same name.
    ///
    /// # Errors
    /// `BindingError::Record` listing every field that has no property or
    /// whose property is incompatible with the field type.
    pub fn bind(
        schema: &RecordSchema,
        properties: &PropertySet<T>,
        registry: &ConverterRegistry,
        config: &BindingConfig,
    ) -> Result<Self, BindingError> {
        let record = schema.fullname();
        let mut fields = Vec::with_capacity(schema.fields.len());
        let mut errors = Vec::new();

        for field in &schema.fields {
            match properties.get(field.name()) {
                Some(property) => {
                    match PropertyBinding::bind(Arc::clone(property), field.kind(), registry) {
                        Ok(binding) => fields.push(FieldBinding {
                            field: field.clone(),
                            binding: Some(binding),
                        }),
                        Err(e) => errors.push(e),
                    }
                }
                None if config.allow_unbound_defaults && field.has_default_value() => {
                    debug!(
                        record = %record,
                        field = field.name(),
                        "Leaving defaulted field unbound"
                    );
                    fields.push(FieldBinding {
                        field: field.clone(),
                        binding: None,
                    });
                }
                None => errors.push(BindingError::MissingProperty {
                    field: field.name().to_string(),
                    declaring_type: properties.type_name().to_string(),
                }),
            }
        }

        if !errors.is_empty() {
            warn!(
                record = %record,
                failed = errors.len(),
                "Record binding failed"
            );
            return Err(BindingError::Record { record, errors });
        }

        debug!(record = %record, fields = fields.len(), "Bound record");
        Ok(Self {
            record,
            fields,
            named_types: Arc::new(schema.named_definitions()),
            config: config.clone(),
        })
    }

    /// Bind a parsed schema, which must be a record or error type.
    pub fn bind_schema(
        schema: &AvroSchema,
        properties: &PropertySet<T>,
        registry: &ConverterRegistry,
        config: &BindingConfig,
    ) -> Result<Self, BindingError> {
        match schema {
            AvroSchema::Record(record) | AvroSchema::Error(record) => {
                Self::bind(record, properties, registry, config)
            }
            other => Err(BindingError::NotARecord {
                record: properties.type_name().to_string(),
                found: other.kind().as_str(),
            }),
        }
    }

    /// Full name of the bound record.
    pub fn record_name(&self) -> &str {
        &self.record
    }

    /// Binding for the field with the given name.
    pub fn binding(&self, field: &str) -> Option<&PropertyBinding<T>> {
        self.fields
            .iter()
            .find(|f| f.field.name() == field)
            .and_then(|f| f.binding.as_ref())
    }

    /// Field bindings in schema order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldBinding<T>> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Read every field of `instance` into a record value, in schema order.
    ///
    /// Unbound fields contribute their default. Array and map fields must
    /// produce a sequence value.
    pub fn extract(&self, instance: &T) -> Result<Value, BindingError> {
        let mut values = Vec::with_capacity(self.fields.len());
        for entry in &self.fields {
            let name = entry.field.name();
            let mut value = match &entry.binding {
                Some(binding) => binding.get(instance).map_err(|e| field_error(name, e))?,
                None => entry.default_value(&self.named_types)?,
            };
            if matches!(entry.field.kind(), SchemaKind::Array | SchemaKind::Map) {
                SequenceAdapter::new(&mut value)
                    .count()
                    .map_err(|e| field_error(name, e.into()))?;
            }
            values.push((name.to_string(), value));
        }
        Ok(Value::Record(values))
    }

    /// Write a record value into `instance`.
    ///
    /// Fields missing from `value` take their default. Array fields are
    /// rebuilt element by element into a sequence of the configured kind.
    ///
    /// Every field is resolved, checked against its schema and converted
    /// before the first setter runs, so a malformed record leaves `instance`
    /// untouched. A setter that rejects an already converted value can still
    /// fail part way, after earlier fields were written.
    ///
    /// # Errors
    /// `BindingError::NotARecord` when `value` is not a record, otherwise the
    /// first field that fails wrapped in `BindingError::Field`.
    pub fn populate(&self, instance: &mut T, value: &Value) -> Result<(), BindingError> {
        let input = match value {
            Value::Union(_, inner) => inner.as_ref(),
            other => other,
        };
        if !matches!(input, Value::Record(_)) {
            return Err(BindingError::NotARecord {
                record: self.record.clone(),
                found: input.type_name(),
            });
        }

        let mut resolved = Vec::with_capacity(self.fields.len());
        for entry in &self.fields {
            let Some(binding) = &entry.binding else {
                continue;
            };
            let name = entry.field.name();
            let field_value = match input.field(name) {
                Some(v) => v.clone(),
                None => entry.default_value(&self.named_types)?,
            };
            if !field_value.conforms_to(entry.field.schema(), &self.named_types) {
                return Err(field_error(
                    name,
                    BindingError::NonConforming {
                        field: name.to_string(),
                        kind: entry.field.kind(),
                        found: field_value.type_name(),
                    },
                ));
            }
            let field_value = if entry.field.kind() == SchemaKind::Array {
                self.rebuild_sequence(field_value)
                    .map_err(|e| field_error(name, e))?
            } else {
                field_value
            };
            let runtime_value = binding
                .from_schema(field_value)
                .map_err(|e| field_error(name, e))?;
            resolved.push((binding, runtime_value));
        }

        trace!(record = %self.record, fields = resolved.len(), "Writing resolved fields");
        for (binding, runtime_value) in resolved {
            binding
                .write(instance, runtime_value)
                .map_err(|e| field_error(binding.property_name(), e))?;
        }
        Ok(())
    }

    fn rebuild_sequence(&self, mut source: Value) -> Result<Value, BindingError> {
        let items: Vec<Value> = SequenceAdapter::new(&mut source).iter()?.cloned().collect();
        let kind = self.config.default_sequence_kind;
        let mut sequence = kind.instantiate();
        let mut adapter = SequenceAdapter::with_kind(&mut sequence, kind);
        adapter.clear()?;
        for item in items {
            adapter.append(item)?;
        }
        Ok(sequence)
    }
}

fn field_error(field: &str, source: BindingError) -> BindingError {
    BindingError::Field {
        field: field.to_string(),
        source: Box::new(source),
    }
}

impl<T> Clone for RecordBinding<T> {
    fn clone(&self) -> Self {
        Self {
            record: self.record.clone(),
            fields: self.fields.clone(),
            named_types: Arc::clone(&self.named_types),
            config: self.config.clone(),
        }
    }
}

impl<T> fmt::Debug for RecordBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordBinding")
            .field("record", &self.record)
            .field("fields", &self.fields)
            .finish()
    }
}
