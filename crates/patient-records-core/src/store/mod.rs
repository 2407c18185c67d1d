//! Record store contract and providers.
//!
//! The service treats a store as a whole-collection `load`/`save` pair.
//! Each provider must make `save` atomic: readers see either the previous
//! collection or the new one, never a mix.

mod json_file;
mod memory;
mod schema;
mod sqlite;

pub use json_file::*;
pub use memory::*;
pub use schema::*;
pub use sqlite::*;

use serde_json::{Map, Value};
use thiserror::Error;

/// Insertion-ordered mapping from patient id to its stored attributes.
pub type RecordSet = Map<String, Value>;

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Malformed store: {0}")]
    Format(String),

    #[error("Corrupt record '{id}': {reason}")]
    Corrupt { id: String, reason: String },

    #[error("Store lock poisoned")]
    Poisoned,
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        StoreError::Poisoned
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable home of the patient collection.
pub trait RecordStore: Send {
    /// Load the full collection.
    fn load(&self) -> StoreResult<RecordSet>;

    /// Replace the full collection.
    fn save(&self, records: &RecordSet) -> StoreResult<()>;
}

impl<S: RecordStore + ?Sized> RecordStore for Box<S> {
    fn load(&self) -> StoreResult<RecordSet> {
        (**self).load()
    }

    fn save(&self, records: &RecordSet) -> StoreResult<()> {
        (**self).save(records)
    }
}
