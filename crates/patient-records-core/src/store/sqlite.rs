//! SQLite-backed record store.

use std::path::Path;

use rusqlite::{params, Connection};
use serde_json::Value;

use super::{RecordSet, RecordStore, StoreError, StoreResult, SCHEMA};

/// Stores one row per patient; `save` rewrites the table in one transaction.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the store file at `path`, creating the table on first use.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        log::debug!("opening sqlite store at {}", path.display());
        Self::with_connection(Connection::open(path)?)
    }

    /// A store that lives only as long as this value.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Underlying connection, for inspecting rows directly.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

impl RecordStore for SqliteStore {
    fn load(&self) -> StoreResult<RecordSet> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, payload FROM patient_records ORDER BY position")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut records = RecordSet::new();
        for row in rows {
            let (id, payload) = row?;
            let value: Value = serde_json::from_str(&payload).map_err(|e| StoreError::Corrupt {
                id: id.clone(),
                reason: e.to_string(),
            })?;
            records.insert(id, value);
        }
        Ok(records)
    }

    fn save(&self, records: &RecordSet) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM patient_records", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO patient_records (id, position, payload) VALUES (?1, ?2, ?3)",
            )?;
            for (position, (id, value)) in records.iter().enumerate() {
                let payload = serde_json::to_string(value)?;
                insert.execute(params![id, position as i64, payload])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row_count(store: &SqliteStore) -> i64 {
        store
            .conn()
            .query_row("SELECT COUNT(*) FROM patient_records", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.load().unwrap().is_empty());
        assert_eq!(row_count(&store), 0);
    }

    #[test]
    fn test_one_row_per_patient() {
        let store = SqliteStore::open_in_memory().unwrap();

        let mut records = RecordSet::new();
        records.insert("P001".into(), json!({"name": "Arjun"}));
        records.insert("P002".into(), json!({"name": "Meera"}));
        records.insert("P003".into(), json!({"name": "Kabir"}));
        store.save(&records).unwrap();

        assert_eq!(row_count(&store), 3);
        let payload: String = store
            .conn()
            .query_row(
                "SELECT payload FROM patient_records WHERE id = 'P003'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(serde_json::from_str::<Value>(&payload).unwrap(), json!({"name": "Kabir"}));
    }

    #[test]
    fn test_save_and_load_keeps_order() {
        let store = SqliteStore::open_in_memory().unwrap();

        let mut records = RecordSet::new();
        records.insert("P002".into(), json!({"name": "Meera", "height": 1.6}));
        records.insert("P001".into(), json!({"name": "Arjun", "height": 1.8}));
        store.save(&records).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, records);
        assert_eq!(loaded.keys().next().map(String::as_str), Some("P002"));
    }

    #[test]
    fn test_save_replaces_previous_rows() {
        let store = SqliteStore::open_in_memory().unwrap();

        let mut records = RecordSet::new();
        records.insert("P001".into(), json!({"name": "Arjun"}));
        records.insert("P002".into(), json!({"name": "Meera"}));
        store.save(&records).unwrap();

        records.shift_remove("P001");
        store.save(&records).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains_key("P002"));
    }

    #[test]
    fn test_bad_payload_is_corrupt() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .conn()
            .execute(
                "INSERT INTO patient_records (id, position, payload) VALUES ('P001', 0, '{oops')",
                [],
            )
            .unwrap();

        match store.load().unwrap_err() {
            StoreError::Corrupt { id, .. } => assert_eq!(id, "P001"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reopen_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.db");

        let mut records = RecordSet::new();
        records.insert("P001".into(), json!({"name": "Arjun"}));
        SqliteStore::open(&path).unwrap().save(&records).unwrap();

        assert_eq!(SqliteStore::open(&path).unwrap().load().unwrap(), records);
    }
}
