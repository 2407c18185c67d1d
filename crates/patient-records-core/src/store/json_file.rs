//! JSON document store: one object keyed by patient id.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::{RecordSet, RecordStore, StoreError, StoreResult};

/// Stores the collection as a single JSON object on disk.
///
/// A missing file loads as an empty collection. Saves go to a sibling
/// temporary file that is then renamed over the target.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "patients.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl RecordStore for JsonFileStore {
    fn load(&self) -> StoreResult<RecordSet> {
        if !self.path.exists() {
            log::debug!("{} does not exist, starting empty", self.path.display());
            return Ok(RecordSet::new());
        }
        let text = fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(RecordSet::new());
        }
        match serde_json::from_str::<Value>(&text)? {
            Value::Object(records) => Ok(records),
            other => Err(StoreError::Format(format!(
                "expected a JSON object at the top level of {}, found {}",
                self.path.display(),
                json_kind(&other)
            ))),
        }
    }

    fn save(&self, records: &RecordSet) -> StoreResult<()> {
        let text = serde_json::to_string_pretty(records)?;
        let temp = self.temp_path();
        fs::write(&temp, text)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
