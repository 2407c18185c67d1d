//! Field-level validation errors and the raw-record field readers.

use serde_json::{Map, Value};
use thiserror::Error;

/// A single invariant violation, naming the offending field.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid field '{field}': {rule}")]
pub struct ValidationError {
    /// Attribute name as it appears on the wire (e.g. "age")
    pub field: &'static str,
    /// Human-readable description of the broken rule
    pub rule: String,
}

pub type ValidationResult<T> = Result<T, ValidationError>;

impl ValidationError {
    pub fn new(field: &'static str, rule: impl Into<String>) -> Self {
        Self {
            field,
            rule: rule.into(),
        }
    }

    pub fn missing(field: &'static str) -> Self {
        Self::new(field, "field required")
    }
}

fn require<'a>(raw: &'a Map<String, Value>, field: &'static str) -> ValidationResult<&'a Value> {
    match raw.get(field) {
        None | Some(Value::Null) => Err(ValidationError::missing(field)),
        Some(value) => Ok(value),
    }
}

/// Read a required, non-empty string attribute.
pub(crate) fn read_text(raw: &Map<String, Value>, field: &'static str) -> ValidationResult<String> {
    let text = require(raw, field)?
        .as_str()
        .ok_or_else(|| ValidationError::new(field, "must be a string"))?;
    check_text(field, text)?;
    Ok(text.to_string())
}

/// Read a required integer attribute. Floats with no fractional part are accepted.
pub(crate) fn read_integer(raw: &Map<String, Value>, field: &'static str) -> ValidationResult<i64> {
    let value = require(raw, field)?;
    if let Some(n) = value.as_i64() {
        return Ok(n);
    }
    match value.as_f64() {
        Some(f) if f.fract() == 0.0 && f.is_finite() => Ok(f as i64),
        _ => Err(ValidationError::new(field, "must be an integer")),
    }
}

/// Read a required numeric attribute.
pub(crate) fn read_number(raw: &Map<String, Value>, field: &'static str) -> ValidationResult<f64> {
    require(raw, field)?
        .as_f64()
        .ok_or_else(|| ValidationError::new(field, "must be a number"))
}

pub(crate) fn check_text(field: &'static str, text: &str) -> ValidationResult<()> {
    if text.is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(())
}

/// Strictly positive and finite.
pub(crate) fn check_positive(field: &'static str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::new(field, "must be greater than 0"));
    }
    Ok(())
}
