//! Binding configuration.

use crate::bind::sequence::SequenceKind;

/// Configuration for record binding.
///
/// Built once alongside the converter registry and passed to
/// [`RecordBinding::bind`](crate::bind::RecordBinding::bind).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingConfig {
    /// Sequence kind decoders instantiate for array fields (default: list).
    pub default_sequence_kind: SequenceKind,
    /// Leave fields that have a default but no matching property unbound
    /// instead of failing (default: false).
    pub allow_unbound_defaults: bool,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            default_sequence_kind: SequenceKind::List,
            allow_unbound_defaults: false,
        }
    }
}

impl BindingConfig {
    /// Create a new BindingConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sequence kind used for new array values.
    pub fn with_sequence_kind(mut self, kind: SequenceKind) -> Self {
        self.default_sequence_kind = kind;
        self
    }

    /// Allow defaulted fields without a property.
    pub fn allow_unbound_defaults(mut self) -> Self {
        self.allow_unbound_defaults = true;
        self
    }
}
