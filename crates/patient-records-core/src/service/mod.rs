//! Record service: the create/get/update/delete/sort operations.
//!
//! Every operation is one load → modify → save cycle against the store.
//! Nothing is cached between calls, and nothing serialises two calls made
//! through different handles to the same store: the last save wins.

mod merge;
mod sort;

pub use merge::*;
pub use sort::*;

use log::{debug, error, info, warn};
use serde_json::Value;
use thiserror::Error;

use crate::models::{Patient, PatientUpdate, PatientView, ValidationError};
use crate::store::{RecordStore, StoreError};

/// Service errors.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Patient not found: {0}")]
    NotFound(String),

    #[error("Patient already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Patient record service over an injected store.
pub struct RecordService<S> {
    store: S,
}

impl<S: RecordStore> RecordService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// All patients in store order, with derived fields.
    pub fn list(&self) -> ServiceResult<Vec<PatientView>> {
        debug!("listing patients");
        self.load_patients()
            .map(|patients| patients.into_iter().map(PatientView::from).collect())
    }

    /// A single patient, with derived fields.
    pub fn get(&self, id: &str) -> ServiceResult<PatientView> {
        debug!("fetching patient {}", id);
        let records = self.store.load()?;
        let raw = records.get(id).ok_or_else(|| not_found(id))?;
        Ok(decode(id, raw)?.into())
    }

    /// Add a new patient. The id must not be in use.
    pub fn create(&self, patient: Patient) -> ServiceResult<()> {
        debug!("creating patient {}", patient.id);
        patient.validate().map_err(|e| {
            warn!("rejected patient {}: {}", patient.id, e);
            e
        })?;

        let mut records = self.store.load()?;
        if records.contains_key(&patient.id) {
            warn!("patient {} already exists", patient.id);
            return Err(ServiceError::AlreadyExists(patient.id));
        }

        records.insert(patient.id.clone(), patient.to_raw());
        self.store.save(&records)?;
        info!("created patient {}", patient.id);
        Ok(())
    }

    /// Merge a partial update into an existing patient.
    ///
    /// The merged record is validated as a whole before anything is saved;
    /// a rejected update leaves the stored record exactly as it was.
    pub fn update(&self, id: &str, update: &PatientUpdate) -> ServiceResult<()> {
        debug!("updating patient {}", id);
        let mut records = self.store.load().map_err(|e| internal(id, e))?;
        let stored = records.get(id).ok_or_else(|| not_found(id))?;

        let merged = merge_update(id, stored, update).map_err(|e| {
            warn!("rejected update to patient {}: {}", id, e);
            e
        })?;

        // Same key, so the record keeps its position in the collection.
        records.insert(id.to_string(), merged.to_raw());
        self.store.save(&records).map_err(|e| internal(id, e))?;
        info!("updated patient {}", id);
        Ok(())
    }

    /// Remove a patient. Deleting an absent id is an error, not a no-op.
    pub fn delete(&self, id: &str) -> ServiceResult<()> {
        debug!("deleting patient {}", id);
        let mut records = self.store.load()?;
        if records.shift_remove(id).is_none() {
            return Err(not_found(id));
        }
        self.store.save(&records)?;
        info!("deleted patient {}", id);
        Ok(())
    }

    /// Sort by field name and order name as received from a transport.
    ///
    /// Both arguments are checked before the store is read.
    pub fn sort(&self, sort_by: &str, order: &str) -> ServiceResult<Vec<PatientView>> {
        let field: SortField = sort_by.parse().map_err(|e| {
            warn!("rejected sort request: {}", e);
            e
        })?;
        let order: SortOrder = order.parse().map_err(|e| {
            warn!("rejected sort request: {}", e);
            e
        })?;
        self.sort_by(field, order)
    }

    /// All patients ordered by `field`. Does not write to the store.
    ///
    /// Stored records that do not decode have no sort key and are left out
    /// of the result.
    pub fn sort_by(&self, field: SortField, order: SortOrder) -> ServiceResult<Vec<PatientView>> {
        debug!("sorting patients by {} {:?}", field, order);
        let records = self.store.load()?;
        let mut views: Vec<PatientView> = records
            .iter()
            .filter_map(|(id, raw)| match Patient::from_raw(id, raw) {
                Ok(patient) => Some(PatientView::from(patient)),
                Err(e) => {
                    warn!("leaving patient {} out of sort: {}", id, e);
                    None
                }
            })
            .collect();
        sort_records(&mut views, field, order);
        Ok(views)
    }

    fn load_patients(&self) -> ServiceResult<Vec<Patient>> {
        let records = self.store.load()?;
        records
            .iter()
            .map(|(id, raw)| decode(id, raw))
            .collect()
    }
}

/// Decode a stored record. Anything that fails validation here was written
/// outside this service, so it is reported as store corruption.
fn decode(id: &str, raw: &Value) -> ServiceResult<Patient> {
    Patient::from_raw(id, raw).map_err(|e| {
        error!("stored patient {} is invalid: {}", id, e);
        ServiceError::Store(StoreError::Corrupt {
            id: id.to_string(),
            reason: e.to_string(),
        })
    })
}

fn not_found(id: &str) -> ServiceError {
    warn!("patient {} not found", id);
    ServiceError::NotFound(id.to_string())
}

fn internal(id: &str, e: StoreError) -> ServiceError {
    error!("error updating patient {}: {}", id, e);
    ServiceError::Internal(format!("updating patient {} failed", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, Verdict};
    use crate::store::{MemoryStore, RecordSet, StoreResult};
    use serde_json::json;

    fn patient(id: &str, height: f64, weight: f64) -> Patient {
        Patient {
            id: id.into(),
            name: format!("Patient {}", id),
            city: "Delhi".into(),
            age: 30,
            gender: Gender::Other,
            height,
            weight,
        }
    }

    fn setup() -> RecordService<MemoryStore> {
        RecordService::new(MemoryStore::new())
    }

    /// Loads succeed, every save fails.
    struct ReadOnlyStore(RecordSet);

    impl RecordStore for ReadOnlyStore {
        fn load(&self) -> StoreResult<RecordSet> {
            Ok(self.0.clone())
        }

        fn save(&self, _: &RecordSet) -> StoreResult<()> {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }
    }

    #[test]
    fn test_create_and_get() {
        let service = setup();
        service.create(patient("P001", 1.8, 70.0)).unwrap();

        let view = service.get("P001").unwrap();
        assert_eq!(view.patient, patient("P001", 1.8, 70.0));
        assert_eq!(view.bmi, 21.6);
        assert_eq!(view.verdict, Verdict::Normal);
    }

    #[test]
    fn test_create_validates_before_touching_store() {
        let service = setup();
        let err = service.create(patient("P001", 0.0, 70.0)).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref v) if v.field == "height"));
        assert_eq!(service.store().save_count(), 0);
    }

    #[test]
    fn test_duplicate_create() {
        let service = setup();
        service.create(patient("P001", 1.8, 70.0)).unwrap();
        let err = service.create(patient("P001", 1.6, 50.0)).unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists(ref id) if id == "P001"));
        assert_eq!(service.get("P001").unwrap().patient.height, 1.8);
        assert_eq!(service.store().save_count(), 1);
    }

    #[test]
    fn test_update_unknown_id() {
        let service = setup();
        let err = service.update("P404", &PatientUpdate::default()).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(service.store().save_count(), 0);
    }

    #[test]
    fn test_rejected_update_keeps_record() {
        let service = setup();
        service.create(patient("P001", 1.8, 70.0)).unwrap();
        let before = service.store().snapshot().unwrap();

        let update = PatientUpdate {
            city: Some("Kolkata".into()),
            age: Some(150),
            ..Default::default()
        };
        let err = service.update("P001", &update).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref v) if v.field == "age"));
        assert_eq!(service.store().snapshot().unwrap(), before);
        assert_eq!(service.store().save_count(), 1);
    }

    #[test]
    fn test_update_keeps_position() {
        let service = setup();
        service.create(patient("P001", 1.8, 70.0)).unwrap();
        service.create(patient("P002", 1.6, 50.0)).unwrap();

        let update = PatientUpdate {
            weight: Some(55.0),
            ..Default::default()
        };
        service.update("P001", &update).unwrap();

        let ids: Vec<_> = service.list().unwrap().into_iter().map(|v| v.patient.id).collect();
        assert_eq!(ids, vec!["P001", "P002"]);
    }

    #[test]
    fn test_save_failure_during_update_is_internal() {
        let mut records = RecordSet::new();
        records.insert("P001".into(), patient("P001", 1.8, 70.0).to_raw());
        let service = RecordService::new(ReadOnlyStore(records));

        let update = PatientUpdate {
            weight: Some(72.0),
            ..Default::default()
        };
        let err = service.update("P001", &update).unwrap_err();
        assert!(matches!(err, ServiceError::Internal(_)));
        assert_eq!(service.get("P001").unwrap().patient.weight, 70.0);
    }

    #[test]
    fn test_delete_twice() {
        let service = setup();
        service.create(patient("P001", 1.8, 70.0)).unwrap();
        service.delete("P001").unwrap();
        assert!(matches!(service.delete("P001"), Err(ServiceError::NotFound(_))));
        assert!(matches!(service.get("P001"), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn test_sort_rejects_bad_arguments_without_loading() {
        struct FailingStore;
        impl RecordStore for FailingStore {
            fn load(&self) -> StoreResult<RecordSet> {
                panic!("store must not be read");
            }
            fn save(&self, _: &RecordSet) -> StoreResult<()> {
                panic!("store must not be written");
            }
        }

        let service = RecordService::new(FailingStore);
        assert!(matches!(
            service.sort("bmi_invalid", "asc"),
            Err(ServiceError::InvalidArgument(_))
        ));
        assert!(matches!(
            service.sort("bmi", "up"),
            Err(ServiceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_sort_does_not_save() {
        let service = setup();
        service.create(patient("P001", 1.8, 70.0)).unwrap();
        service.create(patient("P002", 1.6, 50.0)).unwrap();

        let sorted = service.sort("height", "asc").unwrap();
        assert_eq!(sorted[0].patient.id, "P002");
        assert_eq!(service.store().save_count(), 2);
    }

    #[test]
    fn test_corrupt_stored_record() {
        let mut records = RecordSet::new();
        records.insert("P001".into(), json!({"name": "No measurements"}));
        let service = RecordService::new(MemoryStore::with_records(records));

        match service.get("P001").unwrap_err() {
            ServiceError::Store(StoreError::Corrupt { id, .. }) => assert_eq!(id, "P001"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(service.list().is_err());
    }

    #[test]
    fn test_sort_leaves_out_incomplete_record() {
        let mut records = RecordSet::new();
        records.insert("P001".into(), patient("P001", 1.8, 70.0).to_raw());
        let mut incomplete = patient("P002", 1.6, 50.0).to_raw();
        incomplete.as_object_mut().unwrap().remove("height");
        records.insert("P002".into(), incomplete);
        let service = RecordService::new(MemoryStore::with_records(records));

        for order in ["asc", "desc"] {
            let sorted = service.sort("height", order).unwrap();
            let ids: Vec<_> = sorted.into_iter().map(|v| v.patient.id).collect();
            assert_eq!(ids, vec!["P001"]);
        }
        assert_eq!(service.store().save_count(), 0);
    }

    #[test]
    fn test_whitespace_name_is_accepted() {
        let service = setup();
        let mut blank = patient("P001", 1.8, 70.0);
        blank.name = " ".into();
        service.create(blank).unwrap();
        assert_eq!(service.get("P001").unwrap().patient.name, " ");
    }
}
