//! Uniform count/append/clear access over sequence-like values.

use crate::error::AdapterError;
use crate::value::Value;

/// The kind of sequence a decoder creates when an array value has to be
/// built from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequenceKind {
    /// Growable list starting empty.
    #[default]
    List,
    /// Growable list with room reserved for the given number of elements.
    Preallocated(usize),
}

impl SequenceKind {
    /// Create a new, empty sequence value of this kind.
    pub fn instantiate(&self) -> Value {
        match self {
            SequenceKind::List => Value::Array(Vec::new()),
            SequenceKind::Preallocated(capacity) => Value::Array(Vec::with_capacity(*capacity)),
        }
    }
}

/// Wraps a sequence value so decoders and encoders can treat every
/// collection the same way.
///
/// The adapter borrows the wrapped value mutably and never copies it. Arrays
/// support every operation; maps can be counted and cleared but not appended
/// to by position. Anything else fails with [`AdapterError::Unsupported`].
///
/// # Example
/// ```
/// use avro_bind::bind::SequenceAdapter;
/// use avro_bind::Value;
///
/// let mut tags = Value::Array(vec![Value::from("stale")]);
/// let mut adapter = SequenceAdapter::new(&mut tags);
/// adapter.clear().unwrap();
/// adapter.append(Value::from("a")).unwrap();
/// adapter.append(Value::from("b")).unwrap();
/// assert_eq!(adapter.count().unwrap(), 2);
/// ```
#[derive(Debug)]
pub struct SequenceAdapter<'a> {
    sequence: &'a mut Value,
    kind: SequenceKind,
}

impl<'a> SequenceAdapter<'a> {
    /// Wrap a sequence value, creating new sequences as [`SequenceKind::List`].
    pub fn new(sequence: &'a mut Value) -> Self {
        Self::with_kind(sequence, SequenceKind::default())
    }

    /// Wrap a sequence value with an explicit sequence kind.
    pub fn with_kind(sequence: &'a mut Value, kind: SequenceKind) -> Self {
        Self { sequence, kind }
    }

    /// Number of elements in the wrapped sequence.
    pub fn count(&self) -> Result<usize, AdapterError> {
        match &*self.sequence {
            Value::Array(items) => Ok(items.len()),
            Value::Map(entries) => Ok(entries.len()),
            other => Err(unsupported("count", other)),
        }
    }

    /// Append an element at the end of the wrapped sequence.
    pub fn append(&mut self, value: Value) -> Result<(), AdapterError> {
        match &mut *self.sequence {
            Value::Array(items) => {
                items.push(value);
                Ok(())
            }
            other => Err(unsupported("append", other)),
        }
    }

    /// Remove every element from the wrapped sequence.
    pub fn clear(&mut self) -> Result<(), AdapterError> {
        match &mut *self.sequence {
            Value::Array(items) => {
                items.clear();
                Ok(())
            }
            Value::Map(entries) => {
                entries.clear();
                Ok(())
            }
            other => Err(unsupported("clear", other)),
        }
    }

    /// Iterate over the elements in order.
    pub fn iter(&self) -> Result<std::slice::Iter<'_, Value>, AdapterError> {
        match &*self.sequence {
            Value::Array(items) => Ok(items.iter()),
            other => Err(unsupported("iterate", other)),
        }
    }

    /// The sequence kind to instantiate when no sequence exists yet.
    pub fn element_addition_type(&self) -> SequenceKind {
        self.kind
    }
}

fn unsupported(operation: &'static str, value: &Value) -> AdapterError {
    AdapterError::Unsupported {
        operation,
        found: value.type_name(),
    }
}
