//! Property-based tests for field validation, compatibility and binding.
//!
//! These tests use proptest to verify universal properties across many generated inputs.

use std::sync::Arc;

use proptest::prelude::*;

use avro_bind::bind::*;
use avro_bind::schema::*;
use avro_bind::{SchemaError, Value, ValueError};

// ============================================================================
// Generators
// ============================================================================

/// Generate valid names (must start with [A-Za-z_] and contain only [A-Za-z0-9_]).
fn arb_avro_name() -> impl Strategy<Value = String> {
    "[A-Za-z_][A-Za-z0-9_]{0,15}"
}

/// Generate names that break the identifier grammar.
fn arb_invalid_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[0-9][A-Za-z0-9_]{0,8}",
        "[A-Za-z_]{1,4}[-. $][A-Za-z0-9_]{0,4}",
    ]
}

/// Generate order strings that are not ascending, descending or ignore.
fn arb_invalid_order() -> impl Strategy<Value = String> {
    "[a-z]{0,12}".prop_filter("must not be a valid order", |s| {
        !matches!(s.as_str(), "ascending" | "descending" | "ignore")
    })
}

fn arb_kind() -> impl Strategy<Value = SchemaKind> {
    prop::sample::select(SchemaKind::ALL.to_vec())
}

fn arb_scalar_runtime_type() -> impl Strategy<Value = RuntimeType> {
    prop_oneof![
        Just(RuntimeType::Bool),
        Just(RuntimeType::I8),
        Just(RuntimeType::I16),
        Just(RuntimeType::I32),
        Just(RuntimeType::I64),
        Just(RuntimeType::U8),
        Just(RuntimeType::U16),
        Just(RuntimeType::U32),
        Just(RuntimeType::U64),
        Just(RuntimeType::F32),
        Just(RuntimeType::F64),
        Just(RuntimeType::Bytes),
        Just(RuntimeType::Text),
        arb_avro_name().prop_map(RuntimeType::Class),
        arb_avro_name().prop_map(RuntimeType::Struct),
        arb_avro_name().prop_map(RuntimeType::Enum),
    ]
}

fn arb_runtime_type() -> impl Strategy<Value = RuntimeType> {
    arb_scalar_runtime_type().prop_recursive(2, 8, 1, |inner| {
        prop_oneof![
            inner.clone().prop_map(RuntimeType::optional),
            inner.clone().prop_map(RuntimeType::list),
            inner.prop_map(RuntimeType::map),
        ]
    })
}

// ============================================================================
// Field Validation Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_valid_names_construct_fields(name in arb_avro_name()) {
        let field = SchemaField::required(name.clone(), AvroSchema::Int).unwrap();
        prop_assert_eq!(field.name(), name.as_str());
    }

    #[test]
    fn prop_invalid_names_are_rejected(name in arb_invalid_name()) {
        let is_invalid_name = matches!(
            SchemaField::required(name, AvroSchema::Int),
            Err(SchemaError::InvalidName { .. })
        );
        prop_assert!(is_invalid_name);
    }

    #[test]
    fn prop_invalid_orders_are_rejected(order in arb_invalid_order()) {
        let result = SchemaField::new("f", AvroSchema::Int, false, None, Some(order.as_str()));
        prop_assert_eq!(result, Err(SchemaError::InvalidOrder(order.clone())));
    }

    #[test]
    fn prop_field_json_starts_with_name_and_type(name in arb_avro_name()) {
        let field = SchemaField::new(name, AvroSchema::Long, false, Some(serde_json::json!(1)), Some("ascending"))
            .unwrap();
        let json = field.to_json_value();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        prop_assert_eq!(keys, vec!["name", "type", "default", "order"]);
    }
}

// ============================================================================
// Compatibility Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_union_accepts_every_runtime_type(ty in arb_runtime_type()) {
        prop_assert!(ty.is_compatible_with(SchemaKind::Union));
    }

    #[test]
    fn prop_direct_binding_follows_table(ty in arb_runtime_type(), kind in arb_kind()) {
        let property = Property::new("p", "Holder", ty.clone(), |_: &()| Value::Null);
        let result = PropertyBinding::<()>::bind(Arc::new(property), kind, &ConverterRegistry::empty());
        prop_assert_eq!(result.is_ok(), ty.is_compatible_with(kind));
        if let Err(e) = result {
            prop_assert_eq!(e.property(), Some("p"));
        }
    }

    #[test]
    fn prop_reference_types_accept_null(ty in arb_runtime_type()) {
        if ty.is_reference() || matches!(ty, RuntimeType::Optional(_)) {
            prop_assert!(ty.is_compatible_with(SchemaKind::Null));
        } else {
            prop_assert!(!ty.is_compatible_with(SchemaKind::Null));
        }
    }
}

// ============================================================================
// Binding Round-Trip Properties
// ============================================================================

#[derive(Debug, Default)]
struct Counter {
    count: i64,
}

/// Stores a count as its decimal text.
struct DecimalText;

impl FieldConverter for DecimalText {
    fn name(&self) -> &str {
        "decimal-text"
    }

    fn schema_kind(&self) -> SchemaKind {
        SchemaKind::String
    }

    fn exposed_type(&self) -> RuntimeType {
        RuntimeType::Text
    }

    fn to_schema(&self, value: Value) -> Result<Value, ValueError> {
        Ok(Value::String(i64::try_from(value)?.to_string()))
    }

    fn from_schema(&self, value: Value) -> Result<Value, ValueError> {
        let text = String::try_from(value)?;
        text.parse::<i64>()
            .map(Value::Long)
            .map_err(|e| ValueError::Invalid(e.to_string()))
    }
}

fn count_property() -> Property<Counter> {
    Property::new("count", "Counter", RuntimeType::I64, |c: &Counter| {
        c.count.into()
    })
    .with_setter(|c, v| {
        c.count = v.try_into()?;
        Ok(())
    })
}

proptest! {
    #[test]
    fn prop_direct_round_trip(n in any::<i64>()) {
        let binding = PropertyBinding::<Counter>::bind(
            Arc::new(count_property()),
            SchemaKind::Long,
            &ConverterRegistry::empty(),
        )
        .unwrap();
        let mut counter = Counter::default();
        binding.set(&mut counter, Value::Long(n)).unwrap();
        prop_assert_eq!(binding.get(&counter).unwrap(), Value::Long(n));
    }

    #[test]
    fn prop_converter_round_trip(n in any::<i64>()) {
        let binding = PropertyBinding::<Counter>::new(
            Arc::new(count_property()),
            SchemaKind::String,
            Some(Arc::new(DecimalText)),
            &ConverterRegistry::empty(),
        )
        .unwrap();
        let original = Counter { count: n };
        let written = binding.get(&original).unwrap();
        prop_assert_eq!(&written, &Value::String(n.to_string()));

        let mut decoded = Counter::default();
        binding.set(&mut decoded, written).unwrap();
        prop_assert_eq!(decoded.count, n);
    }
}

// ============================================================================
// Sequence Adapter Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_clear_then_append(
        initial in prop::collection::vec(any::<i32>(), 0..16),
        appended in prop::collection::vec(any::<i32>(), 0..16),
    ) {
        let mut value = Value::Array(initial.into_iter().map(Value::Int).collect());
        let mut adapter = SequenceAdapter::new(&mut value);
        adapter.clear().unwrap();
        prop_assert_eq!(adapter.count().unwrap(), 0);
        for n in &appended {
            adapter.append(Value::Int(*n)).unwrap();
        }
        prop_assert_eq!(adapter.count().unwrap(), appended.len());
        let items: Vec<_> = adapter.iter().unwrap().cloned().collect();
        prop_assert_eq!(items, appended.iter().copied().map(Value::Int).collect::<Vec<_>>());
    }

    #[test]
    fn prop_scalars_are_not_sequences(n in any::<i64>()) {
        let mut value = Value::Long(n);
        let mut adapter = SequenceAdapter::new(&mut value);
        prop_assert!(adapter.count().is_err());
        prop_assert!(adapter.append(Value::Null).is_err());
        prop_assert!(adapter.clear().is_err());
    }
}
