//! SQLite schema definition.

/// Database schema for the SQLite record store.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Patient Records
-- ============================================================================

CREATE TABLE IF NOT EXISTS patient_records (
    id TEXT PRIMARY KEY,
    position INTEGER NOT NULL,                   -- collection order
    payload TEXT NOT NULL,                       -- JSON object of attributes
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patient_records_position ON patient_records(position);
"#;
