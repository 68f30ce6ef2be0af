//! # Value-Type Rules
//!
//! Validation of a runtime `ConfigValue` against a slot's allowed
//! `ValueType` set, and synthesis of a placeholder value when a slot marked
//! `default` is absent from the document.

use std::fmt;

use kdlconf_core::{ConfigValue, ValueType};

use crate::error::SchemaError;

/// A value whose runtime kind is outside the allowed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMismatch {
    /// The allowed set, in declaration order.
    pub expected: Vec<ValueType>,
    /// The kind actually found.
    pub actual: ValueType,
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expected = self
            .expected
            .iter()
            .map(ValueType::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "Expected type {expected}, got {} instead", self.actual)
    }
}

/// Check `value` against `allowed`.
///
/// Returns `None` when the value's kind is allowed.
pub fn validate(value: &ConfigValue, allowed: &[ValueType]) -> Option<TypeMismatch> {
    let actual = value.kind();
    if allowed.contains(&actual) {
        None
    } else {
        Some(TypeMismatch {
            expected: allowed.to_vec(),
            actual,
        })
    }
}

/// The placeholder for an absent slot that is marked `default`.
///
/// `Null` stands in for absence whenever `Null` or `String` is allowed;
/// otherwise `0` for numbers, then `false` for booleans.
///
/// # Errors
///
/// Returns `SchemaError::EmptyTypeSet` if `allowed` is empty. This is a
/// defect in the schema, not in the document.
pub fn default_for(allowed: &[ValueType]) -> Result<ConfigValue, SchemaError> {
    if allowed.contains(&ValueType::Null) || allowed.contains(&ValueType::String) {
        Ok(ConfigValue::Null)
    } else if allowed.contains(&ValueType::Number) {
        Ok(ConfigValue::Number(0.0))
    } else if allowed.contains(&ValueType::Boolean) {
        Ok(ConfigValue::Boolean(false))
    } else {
        Err(SchemaError::EmptyTypeSet)
    }
}
