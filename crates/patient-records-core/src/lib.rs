//! Patient Records Core Library
//!
//! Record management for patients with derived body-mass fields.
//!
//! # Architecture
//!
//! ```text
//!   Transport / FFI caller
//!            │
//!            ▼
//!   ┌─────────────────────┐     ┌──────────────────────┐
//!   │    RecordService    │────▶│  Patient model       │
//!   │ create/get/update/  │     │  validate, bmi,      │
//!   │ delete/list/sort    │     │  verdict             │
//!   └─────────┬───────────┘     └──────────────────────┘
//!             │  load() / save()  (whole collection)
//!             ▼
//!   ┌─────────────────────┐
//!   │    RecordStore      │  json file | sqlite | memory
//!   └─────────────────────┘
//! ```
//!
//! # Core Principle
//!
//! **Derived fields are never stored.** BMI and verdict are recomputed from
//! height and weight every time a record is read.
//!
//! # Modules
//!
//! - [`models`]: Domain types (Patient, PatientUpdate, PatientView, etc.)
//! - [`store`]: Record store contract and providers
//! - [`service`]: Record service, update merger and sort engine
//! - [`settings`]: Layered configuration for choosing a store

pub mod models;
pub mod service;
pub mod settings;
pub mod store;

// Re-export commonly used types
pub use models::{Gender, Patient, PatientUpdate, PatientView, ValidationError, Verdict};
pub use service::{RecordService, ServiceError, SortField, SortOrder};
pub use settings::Settings;
pub use store::{JsonFileStore, MemoryStore, RecordSet, RecordStore, SqliteStore, StoreError};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::path::Path;
use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum PatientRecordsError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<ServiceError> for PatientRecordsError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(v) => PatientRecordsError::ValidationError(v.to_string()),
            ServiceError::NotFound(id) => PatientRecordsError::NotFound(id),
            ServiceError::AlreadyExists(id) => PatientRecordsError::AlreadyExists(id),
            ServiceError::InvalidArgument(msg) => PatientRecordsError::InvalidArgument(msg),
            ServiceError::Store(e) => PatientRecordsError::StorageError(e.to_string()),
            ServiceError::Internal(msg) => PatientRecordsError::InternalError(msg),
        }
    }
}

impl From<ValidationError> for PatientRecordsError {
    fn from(e: ValidationError) -> Self {
        PatientRecordsError::ValidationError(e.to_string())
    }
}

impl From<StoreError> for PatientRecordsError {
    fn from(e: StoreError) -> Self {
        PatientRecordsError::StorageError(e.to_string())
    }
}

impl From<settings::SettingsError> for PatientRecordsError {
    fn from(e: settings::SettingsError) -> Self {
        PatientRecordsError::ConfigError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for PatientRecordsError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        PatientRecordsError::InternalError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

fn wrap(store: Box<dyn RecordStore>) -> Arc<PatientRecordsCore> {
    Arc::new(PatientRecordsCore {
        service: Arc::new(Mutex::new(RecordService::new(store))),
    })
}

/// Open (or lazily create) a JSON document store at the given path.
#[uniffi::export]
pub fn open_json_store(path: String) -> Arc<PatientRecordsCore> {
    wrap(Box::new(JsonFileStore::new(path)))
}

/// Open or create a SQLite store at the given path.
#[uniffi::export]
pub fn open_sqlite_store(path: String) -> Result<Arc<PatientRecordsCore>, PatientRecordsError> {
    Ok(wrap(Box::new(SqliteStore::open(&path)?)))
}

/// Create an in-memory store (for testing).
#[uniffi::export]
pub fn open_in_memory() -> Arc<PatientRecordsCore> {
    wrap(Box::new(MemoryStore::new()))
}

/// Open the store described by a settings file (and environment overrides).
#[uniffi::export]
pub fn open_from_settings(path: Option<String>) -> Result<Arc<PatientRecordsCore>, PatientRecordsError> {
    let settings = Settings::load(path.as_deref().map(Path::new))?;
    Ok(wrap(settings.open_store()?))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe record service wrapper for FFI.
///
/// The mutex only serialises calls made through this handle; other
/// processes writing the same store are not coordinated with.
#[derive(uniffi::Object)]
pub struct PatientRecordsCore {
    service: Arc<Mutex<RecordService<Box<dyn RecordStore>>>>,
}

#[uniffi::export]
impl PatientRecordsCore {
    /// List all patients.
    pub fn list_patients(&self) -> Result<Vec<FfiPatient>, PatientRecordsError> {
        let service = self.service.lock()?;
        let patients = service.list()?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: String) -> Result<FfiPatient, PatientRecordsError> {
        let service = self.service.lock()?;
        Ok(service.get(&id)?.into())
    }

    /// Create a new patient.
    pub fn create_patient(&self, patient: FfiNewPatient) -> Result<(), PatientRecordsError> {
        let service = self.service.lock()?;
        service.create(patient.try_into()?)?;
        Ok(())
    }

    /// Apply a partial update to an existing patient.
    pub fn update_patient(
        &self,
        id: String,
        update: FfiPatientUpdate,
    ) -> Result<(), PatientRecordsError> {
        let service = self.service.lock()?;
        service.update(&id, &update.try_into()?)?;
        Ok(())
    }

    /// Delete a patient.
    pub fn delete_patient(&self, id: String) -> Result<(), PatientRecordsError> {
        let service = self.service.lock()?;
        service.delete(&id)?;
        Ok(())
    }

    /// Sort patients by "height", "weight" or "bmi"; order is "asc" (default) or "desc".
    pub fn sort_patients(
        &self,
        sort_by: String,
        order: Option<String>,
    ) -> Result<Vec<FfiPatient>, PatientRecordsError> {
        let service = self.service.lock()?;
        let patients = service.sort(&sort_by, order.as_deref().unwrap_or("asc"))?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient, including derived fields.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub name: String,
    pub city: String,
    pub age: u32,
    pub gender: String,
    pub height: f64,
    pub weight: f64,
    pub bmi: f64,
    pub verdict: String,
}

impl From<PatientView> for FfiPatient {
    fn from(view: PatientView) -> Self {
        let patient = view.patient;
        Self {
            id: patient.id,
            name: patient.name,
            city: patient.city,
            age: patient.age,
            gender: patient.gender.to_string(),
            height: patient.height,
            weight: patient.weight,
            bmi: view.bmi,
            verdict: view.verdict.to_string(),
        }
    }
}

/// FFI-safe input for creating a patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewPatient {
    pub id: String,
    pub name: String,
    pub city: String,
    pub age: u32,
    pub gender: String,
    pub height: f64,
    pub weight: f64,
}

impl TryFrom<FfiNewPatient> for Patient {
    type Error = ValidationError;

    fn try_from(p: FfiNewPatient) -> Result<Self, Self::Error> {
        Ok(Patient {
            id: p.id,
            name: p.name,
            city: p.city,
            age: p.age,
            gender: p.gender.parse()?,
            height: p.height,
            weight: p.weight,
        })
    }
}

/// FFI-safe partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiPatientUpdate {
    pub name: Option<String>,
    pub city: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
}

impl TryFrom<FfiPatientUpdate> for PatientUpdate {
    type Error = ValidationError;

    fn try_from(u: FfiPatientUpdate) -> Result<Self, Self::Error> {
        Ok(PatientUpdate {
            name: u.name,
            city: u.city,
            age: u.age,
            gender: u.gender.map(|g| g.parse()).transpose()?,
            height: u.height,
            weight: u.weight,
        })
    }
}
