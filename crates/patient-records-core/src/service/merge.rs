//! Merging a partial update into a stored record.

use serde_json::{Map, Value};

use crate::models::{Patient, PatientUpdate, ValidationResult};

/// Attributes that are computed on read and must never be merged or stored.
const DERIVED_FIELDS: [&str; 2] = ["bmi", "verdict"];

/// Merge `update` over the stored attributes of `id` and re-validate the
/// whole result.
///
/// The stored value is not touched; on success the caller receives the
/// merged patient to persist in its place.
pub fn merge_update(id: &str, stored: &Value, update: &PatientUpdate) -> ValidationResult<Patient> {
    let mut working: Map<String, Value> = stored.as_object().cloned().unwrap_or_default();
    for field in DERIVED_FIELDS {
        working.remove(field);
    }
    for (field, value) in update.present_fields() {
        working.insert(field.to_string(), value);
    }
    Patient::from_raw(id, &Value::Object(working))
}
