//! Partial updates to an existing patient.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::patient::Gender;

/// A partial update. `None` leaves the stored value unchanged.
///
/// Presence is tracked by `Option` alone: an empty string or a zero is a
/// provided value and goes through validation like any other.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PatientUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl PatientUpdate {
    /// True when no field is present.
    pub fn is_empty(&self) -> bool {
        self.present_fields().is_empty()
    }

    /// The present fields as stored attribute name/value pairs.
    pub fn present_fields(&self) -> Vec<(&'static str, Value)> {
        let mut fields = Vec::new();
        if let Some(name) = &self.name {
            fields.push(("name", json!(name)));
        }
        if let Some(city) = &self.city {
            fields.push(("city", json!(city)));
        }
        if let Some(age) = self.age {
            fields.push(("age", json!(age)));
        }
        if let Some(gender) = self.gender {
            fields.push(("gender", json!(gender.as_str())));
        }
        if let Some(height) = self.height {
            fields.push(("height", json!(height)));
        }
        if let Some(weight) = self.weight {
            fields.push(("weight", json!(weight)));
        }
        fields
    }
}
