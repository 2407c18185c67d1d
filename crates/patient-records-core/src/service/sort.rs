//! Sort engine: stable ordering of records by a numeric field.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ServiceError;
use crate::models::{Patient, PatientView};

/// Field a collection can be ordered by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Height,
    Weight,
    Bmi,
}

impl SortField {
    pub const ALL: [SortField; 3] = [SortField::Height, SortField::Weight, SortField::Bmi];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Height => "height",
            SortField::Weight => "weight",
            SortField::Bmi => "bmi",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| {
                ServiceError::InvalidArgument(format!(
                    "invalid sort field '{}', select from height, weight, bmi",
                    s
                ))
            })
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ServiceError::InvalidArgument(format!(
                "invalid sort order '{}', select between asc and desc",
                s
            ))),
        }
    }
}

/// Anything that can yield a numeric sort key.
pub trait SortKey {
    fn sort_key(&self, field: SortField) -> f64;
}

impl SortKey for Patient {
    fn sort_key(&self, field: SortField) -> f64 {
        match field {
            SortField::Height => self.height,
            SortField::Weight => self.weight,
            SortField::Bmi => self.bmi(),
        }
    }
}

impl SortKey for PatientView {
    fn sort_key(&self, field: SortField) -> f64 {
        match field {
            SortField::Bmi => self.bmi,
            _ => self.patient.sort_key(field),
        }
    }
}

/// Stable in-place sort. Equal keys keep their original relative order in
/// both directions.
pub fn sort_records<T: SortKey>(records: &mut [T], field: SortField, order: SortOrder) {
    records.sort_by(|a, b| match order {
        SortOrder::Asc => compare(a, b, field),
        SortOrder::Desc => compare(a, b, field).reverse(),
    });
}

/// Ascending comparison by `field`.
pub fn compare<T: SortKey>(a: &T, b: &T, field: SortField) -> Ordering {
    a.sort_key(field).total_cmp(&b.sort_key(field))
}
