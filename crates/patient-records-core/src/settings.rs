//! Layered configuration: built-in defaults, an optional TOML file, then
//! `PATIENT_RECORDS__*` environment variables.
//!
//! ```toml
//! [store]
//! backend = "sqlite"   # json | sqlite | memory
//! path = "patients.db"
//! ```

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{JsonFileStore, MemoryStore, RecordStore, SqliteStore, StoreError};

pub const ENV_PREFIX: &str = "PATIENT_RECORDS";
pub const DEFAULT_STORE_PATH: &str = "patients.json";

/// Settings errors.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Store backend '{0}' requires store.path")]
    MissingPath(StoreBackend),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Json,
    Sqlite,
    Memory,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            StoreBackend::Json => "json",
            StoreBackend::Sqlite => "sqlite",
            StoreBackend::Memory => "memory",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Json,
            path: Some(PathBuf::from(DEFAULT_STORE_PATH)),
        }
    }
}

/// Top-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub store: StoreSettings,
}

impl Settings {
    /// Load from an optional file plus the process environment.
    pub fn load(file: Option<&Path>) -> SettingsResult<Self> {
        Self::load_with_env(file, None)
    }

    /// Like [`Settings::load`], but reads variables from `env` instead of the
    /// process environment when given.
    pub fn load_with_env(
        file: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> SettingsResult<Self> {
        let mut builder = Config::builder()
            .set_default("store.backend", "json")?
            .set_default("store.path", DEFAULT_STORE_PATH)?;

        if let Some(path) = file {
            log::debug!("reading settings from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .source(env),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Open the configured record store.
    pub fn open_store(&self) -> SettingsResult<Box<dyn RecordStore>> {
        let backend = self.store.backend;
        log::info!("opening {} record store", backend);
        match backend {
            StoreBackend::Memory => Ok(Box::new(MemoryStore::new())),
            StoreBackend::Json => {
                let path = self.store_path()?;
                Ok(Box::new(JsonFileStore::new(path)))
            }
            StoreBackend::Sqlite => {
                let path = self.store_path()?;
                Ok(Box::new(SqliteStore::open(path)?))
            }
        }
    }

    fn store_path(&self) -> SettingsResult<&Path> {
        self.store
            .path
            .as_deref()
            .ok_or(SettingsError::MissingPath(self.store.backend))
    }
}
