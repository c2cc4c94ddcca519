//! Identifier validation for field and type names.

use crate::error::SchemaError;

/// Check whether `name` is a well-formed simple name.
///
/// Names must:
/// - Start with [A-Za-z_]
/// - Contain only [A-Za-z0-9_]
pub fn is_well_formed_name(name: &str) -> bool {
    validate_name(name).is_ok()
}

/// Validate a simple (unqualified) name, describing the first violation.
pub fn validate_name(name: &str) -> Result<(), SchemaError> {
    let invalid = |reason: String| SchemaError::InvalidName {
        name: name.to_string(),
        reason,
    };

    let mut chars = name.chars();
    let first = chars
        .next()
        .ok_or_else(|| invalid("name cannot be empty".to_string()))?;

    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(invalid(
            "must start with a letter or underscore".to_string(),
        ));
    }

    if let Some(ch) = chars.find(|ch| !ch.is_ascii_alphanumeric() && *ch != '_') {
        return Err(invalid(format!(
            "contains invalid character '{}' (only alphanumeric and underscore allowed)",
            ch
        )));
    }

    Ok(())
}

/// Validate a possibly dotted full name; every component must be a
/// well-formed simple name.
pub fn validate_fullname(fullname: &str) -> Result<(), SchemaError> {
    for part in fullname.split('.') {
        validate_name(part).map_err(|e| match e {
            SchemaError::InvalidName { reason, .. } => SchemaError::InvalidName {
                name: fullname.to_string(),
                reason: format!("component '{}' {}", part, reason),
            },
            other => other,
        })?;
    }
    Ok(())
}
