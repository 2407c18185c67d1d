//! Patient models and derived body-mass fields.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::validation::{
    check_positive, check_text, read_integer, read_number, read_text, ValidationError,
    ValidationResult,
};

/// Exclusive upper bound for a patient's age in years.
pub const MAX_AGE: i64 = 120;

/// BMI below this is underweight.
pub const UNDERWEIGHT_BELOW: f64 = 18.5;
/// BMI at or above this is obese.
pub const OBESE_FROM: f64 = 30.0;

/// Gender as recorded at registration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
    Other,
    #[serde(rename = "Prefer not to say", alias = "Prefer-not-to-say")]
    PreferNotToSay,
}

impl Gender {
    pub const ALL: [Gender; 4] = [
        Gender::Male,
        Gender::Female,
        Gender::Other,
        Gender::PreferNotToSay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
            Gender::PreferNotToSay => "Prefer not to say",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" => Ok(Gender::Male),
            "Female" => Ok(Gender::Female),
            "Other" => Ok(Gender::Other),
            "Prefer not to say" | "Prefer-not-to-say" => Ok(Gender::PreferNotToSay),
            _ => Err(ValidationError::new(
                "gender",
                "must be one of 'Male', 'Female', 'Other', 'Prefer not to say'",
            )),
        }
    }
}

/// Weight-category verdict derived from BMI.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Verdict {
    Underweight,
    Normal,
    Obese,
}

impl Verdict {
    /// Classify a BMI value.
    ///
    /// The 25–30 band is reported as `Normal`, matching the records already
    /// issued to clients; there is no `Overweight` category.
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < UNDERWEIGHT_BELOW {
            Verdict::Underweight
        } else if bmi < OBESE_FROM {
            Verdict::Normal
        } else {
            Verdict::Obese
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Underweight => "Underweight",
            Verdict::Normal => "Normal",
            Verdict::Obese => "Obese",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body-mass index rounded to two decimals.
pub fn bmi(height_m: f64, weight_kg: f64) -> f64 {
    round2(weight_kg / (height_m * height_m))
}

/// Round to two decimals against the exact binary value, ties to even.
///
/// `value * 100.0` can land on an exact `.5` when the true product is just
/// above or below it; the fused residual tells those cases apart.
fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    let floor = scaled.floor();
    let rounded = if scaled - floor == 0.5 {
        let residual = value.mul_add(100.0, -scaled);
        if residual > 0.0 {
            floor + 1.0
        } else if residual < 0.0 {
            floor
        } else {
            scaled.round_ties_even()
        }
    } else {
        scaled.round()
    };
    rounded / 100.0
}

/// A patient record.
///
/// `bmi` and `verdict` are never stored; they are recomputed from
/// `height` and `weight` on every access.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Caller-assigned identifier (e.g. "P001"), immutable once created
    pub id: String,
    /// Full name
    pub name: String,
    /// City of residence
    pub city: String,
    /// Age in whole years
    pub age: u32,
    pub gender: Gender,
    /// Height in metres
    pub height: f64,
    /// Weight in kilograms
    pub weight: f64,
}

impl Patient {
    /// Check every field invariant, returning the first violation.
    pub fn validate(&self) -> ValidationResult<()> {
        check_text("id", &self.id)?;
        check_text("name", &self.name)?;
        check_text("city", &self.city)?;
        check_age(i64::from(self.age))?;
        check_positive("height", self.height)?;
        check_positive("weight", self.weight)?;
        Ok(())
    }

    /// Decode and validate a stored record. The id is the store key and is
    /// not read from the object; derived fields in the object are ignored.
    pub fn from_raw(id: &str, raw: &Value) -> ValidationResult<Self> {
        let raw = raw
            .as_object()
            .ok_or_else(|| ValidationError::new("record", "must be an object"))?;

        let age = read_integer(raw, "age")?;
        check_age(age)?;
        let gender: Gender = read_text(raw, "gender")?.parse()?;

        let patient = Self {
            id: id.to_string(),
            name: read_text(raw, "name")?,
            city: read_text(raw, "city")?,
            age: age as u32,
            gender,
            height: read_number(raw, "height")?,
            weight: read_number(raw, "weight")?,
        };
        patient.validate()?;
        Ok(patient)
    }

    /// Stored form: every attribute except the id and derived fields.
    pub fn to_raw(&self) -> Value {
        json!({
            "name": self.name,
            "city": self.city,
            "age": self.age,
            "gender": self.gender.as_str(),
            "height": self.height,
            "weight": self.weight,
        })
    }

    pub fn bmi(&self) -> f64 {
        bmi(self.height, self.weight)
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::from_bmi(self.bmi())
    }
}

fn check_age(age: i64) -> ValidationResult<()> {
    if age <= 0 || age >= MAX_AGE {
        return Err(ValidationError::new(
            "age",
            format!("must be greater than 0 and less than {}", MAX_AGE),
        ));
    }
    Ok(())
}

/// A patient together with its derived fields, as returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientView {
    #[serde(flatten)]
    pub patient: Patient,
    pub bmi: f64,
    pub verdict: Verdict,
}

impl From<Patient> for PatientView {
    fn from(patient: Patient) -> Self {
        let bmi = patient.bmi();
        Self {
            bmi,
            verdict: Verdict::from_bmi(bmi),
            patient,
        }
    }
}
