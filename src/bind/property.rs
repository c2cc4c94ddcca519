//! Runtime property accessors.
//!
//! A property is the get/set capability over one member of a runtime type.
//! Accessors are registered explicitly (by hand or by generated code) instead
//! of being discovered by reflection.

use std::fmt;
use std::sync::Arc;

use crate::bind::converter::FieldConverter;
use crate::bind::runtime::RuntimeType;
use crate::error::ValueError;
use crate::value::Value;

/// Get/set access to one property of instances of `T`.
pub trait PropertyAccessor<T>: Send + Sync {
    /// Property name, matched against schema field names.
    fn name(&self) -> &str;

    /// Name of the type that declares the property.
    fn declaring_type(&self) -> &str;

    /// Shape of the value the property holds.
    fn runtime_type(&self) -> &RuntimeType;

    /// Read the property.
    fn get(&self, instance: &T) -> Value;

    /// Whether the property can be written.
    fn is_writable(&self) -> bool;

    /// Write the property. Only called when [`is_writable`](Self::is_writable)
    /// returns true.
    fn set(&self, instance: &mut T, value: Value) -> Result<(), ValueError>;

    /// Converter attached to the property itself, if any.
    fn converter(&self) -> Option<&Arc<dyn FieldConverter>> {
        None
    }
}

type Getter<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;
type Setter<T> = Arc<dyn Fn(&mut T, Value) -> Result<(), ValueError> + Send + Sync>;

/// Closure-backed property accessor.
///
/// # Example
/// ```
/// use avro_bind::bind::{Property, PropertyAccessor, RuntimeType};
///
/// struct Person {
///     age: i32,
/// }
///
/// let age = Property::new("age", "Person", RuntimeType::I32, |p: &Person| p.age.into())
///     .with_setter(|p, v| {
///         p.age = v.try_into()?;
///         Ok(())
///     });
///
/// let mut person = Person { age: 30 };
/// age.set(&mut person, 31.into()).unwrap();
/// assert_eq!(person.age, 31);
/// ```
pub struct Property<T> {
    name: String,
    declaring_type: String,
    runtime_type: RuntimeType,
    getter: Getter<T>,
    setter: Option<Setter<T>>,
    converter: Option<Arc<dyn FieldConverter>>,
}

impl<T> Property<T> {
    /// Create a read-only property.
    pub fn new<G>(
        name: impl Into<String>,
        declaring_type: impl Into<String>,
        runtime_type: RuntimeType,
        getter: G,
    ) -> Self
    where
        G: Fn(&T) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            declaring_type: declaring_type.into(),
            runtime_type,
            getter: Arc::new(getter),
            setter: None,
            converter: None,
        }
    }

    /// Make the property writable.
    pub fn with_setter<S>(mut self, setter: S) -> Self
    where
        S: Fn(&mut T, Value) -> Result<(), ValueError> + Send + Sync + 'static,
    {
        self.setter = Some(Arc::new(setter));
        self
    }

    /// Attach an explicit converter to the property.
    pub fn with_converter(mut self, converter: Arc<dyn FieldConverter>) -> Self {
        self.converter = Some(converter);
        self
    }
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            declaring_type: self.declaring_type.clone(),
            runtime_type: self.runtime_type.clone(),
            getter: Arc::clone(&self.getter),
            setter: self.setter.clone(),
            converter: self.converter.clone(),
        }
    }
}

impl<T> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("declaring_type", &self.declaring_type)
            .field("runtime_type", &self.runtime_type)
            .field("writable", &self.setter.is_some())
            .field("converter", &self.converter.as_ref().map(|c| c.name()))
            .finish()
    }
}

impl<T> PropertyAccessor<T> for Property<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    fn runtime_type(&self) -> &RuntimeType {
        &self.runtime_type
    }

    fn get(&self, instance: &T) -> Value {
        (self.getter)(instance)
    }

    fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    fn set(&self, instance: &mut T, value: Value) -> Result<(), ValueError> {
        match &self.setter {
            Some(setter) => setter(instance, value),
            None => Err(ValueError::Invalid(format!(
                "property {} has no setter",
                self.name
            ))),
        }
    }

    fn converter(&self) -> Option<&Arc<dyn FieldConverter>> {
        self.converter.as_ref()
    }
}

/// The properties a runtime type exposes, looked up by name.
pub struct PropertySet<T> {
    type_name: String,
    properties: Vec<Arc<dyn PropertyAccessor<T>>>,
}

impl<T: 'static> PropertySet<T> {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            properties: Vec::new(),
        }
    }

    /// Add a closure-backed property. A property with the same name replaces
    /// the earlier one.
    pub fn with(self, property: Property<T>) -> Self {
        self.with_accessor(Arc::new(property))
    }

    /// Add any accessor implementation.
    pub fn with_accessor(mut self, accessor: Arc<dyn PropertyAccessor<T>>) -> Self {
        self.properties.retain(|p| p.name() != accessor.name());
        self.properties.push(accessor);
        self
    }
}

impl<T> PropertySet<T> {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn PropertyAccessor<T>>> {
        self.properties.iter().find(|p| p.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn PropertyAccessor<T>>> {
        self.properties.iter()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl<T> Clone for PropertySet<T> {
    fn clone(&self) -> Self {
        Self {
            type_name: self.type_name.clone(),
            properties: self.properties.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Point {
        x: i32,
        label: String,
    }

    fn x() -> Property<Point> {
        Property::new("x", "Point", RuntimeType::I32, |p: &Point| p.x.into()).with_setter(
            |p, v| {
                p.x = v.try_into()?;
                Ok(())
            },
        )
    }

    #[test]
    fn test_get_and_set() {
        let prop = x();
        let mut point = Point::default();
        prop.set(&mut point, Value::Int(4)).unwrap();
        assert_eq!(prop.get(&point), Value::Int(4));
        assert!(prop.is_writable());
    }

    #[test]
    fn test_setter_rejects_wrong_shape() {
        let prop = x();
        let mut point = Point::default();
        assert!(prop.set(&mut point, Value::from("four")).is_err());
        assert_eq!(point.x, 0);
    }

    #[test]
    fn test_read_only_property() {
        let prop = Property::new("label", "Point", RuntimeType::Text, |p: &Point| {
            p.label.clone().into()
        });
        let mut point = Point::default();
        assert!(!prop.is_writable());
        assert!(prop.set(&mut point, Value::from("x")).is_err());
    }

    #[test]
    fn test_property_set_replaces_by_name() {
        let set = PropertySet::new("Point")
            .with(x())
            .with(Property::new("x", "Point", RuntimeType::I64, |p: &Point| {
                Value::Long(p.x as i64)
            }));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("x").unwrap().runtime_type(), &RuntimeType::I64);
        assert!(set.get("y").is_none());
    }
}
