//! In-process store, used for tests and ephemeral sessions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{RecordSet, RecordStore, StoreResult};

/// A store holding the collection in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<RecordSet>,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an existing collection.
    pub fn with_records(records: RecordSet) -> Self {
        Self {
            records: Mutex::new(records),
            saves: AtomicUsize::new(0),
        }
    }

    /// Current contents, without going through `load`.
    pub fn snapshot(&self) -> StoreResult<RecordSet> {
        Ok(self.records.lock()?.clone())
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl RecordStore for MemoryStore {
    fn load(&self) -> StoreResult<RecordSet> {
        self.snapshot()
    }

    fn save(&self, records: &RecordSet) -> StoreResult<()> {
        *self.records.lock()? = records.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
