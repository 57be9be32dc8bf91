//! Engine configuration.
//!
//! Read from the TOML file named by `INTERCHANGE_CONFIG` when set, then overridden by
//! individual `INTERCHANGE_*` environment variables. Every field has a default, so an
//! empty environment yields a working configuration.

use crate::persistence::{FileTaskStore, MemoryTaskStore, PersistenceError, TaskStore};
use crate::quota::DemoLimits;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub const CONFIG_PATH_VAR: &str = "INTERCHANGE_CONFIG";
pub const HTTP_ADDR_VAR: &str = "INTERCHANGE_HTTP_ADDR";
pub const DATA_DIR_VAR: &str = "INTERCHANGE_DATA_DIR";
pub const DOWNLOAD_DIR_VAR: &str = "INTERCHANGE_DOWNLOAD_DIR";
pub const DEMO_MODE_VAR: &str = "INTERCHANGE_DEMO_MODE";
pub const STORE_VAR: &str = "INTERCHANGE_STORE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {var}: '{value}'")]
    InvalidValue { var: &'static str, value: String },
    #[error("failed to open store: {0}")]
    Store(#[from] PersistenceError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Memory,
    #[default]
    File,
    Sqlite,
}

impl std::str::FromStr for StoreBackend {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "file" => Ok(StoreBackend::File),
            "sqlite" => Ok(StoreBackend::Sqlite),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Store namespace every key is written under.
    pub namespace: String,
    /// Actor id attached to audit records.
    pub actor_id: String,
    /// Tag written into the project block of every export.
    pub generator: String,
    /// Demo mode state at startup.
    pub demo_mode: bool,
    pub demo_limits: DemoLimits,
    pub store: StoreBackend,
    pub data_dir: PathBuf,
    pub download_dir: PathBuf,
    pub http_addr: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            namespace: "programme".to_string(),
            actor_id: "programme-interchange".to_string(),
            generator: "Programme Interchange Engine".to_string(),
            demo_mode: false,
            demo_limits: DemoLimits::default(),
            store: StoreBackend::default(),
            data_dir: PathBuf::from(".interchange"),
            download_dir: PathBuf::from("."),
            http_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// File (if `INTERCHANGE_CONFIG` is set) plus environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let lookup = |var: &str| std::env::var(var).ok();
        let mut config = match lookup(CONFIG_PATH_VAR) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(HTTP_ADDR_VAR) {
            self.http_addr = addr;
        }
        if let Some(dir) = lookup(DATA_DIR_VAR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(DOWNLOAD_DIR_VAR) {
            self.download_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup(DEMO_MODE_VAR) {
            self.demo_mode = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => true,
                "0" | "false" | "off" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: DEMO_MODE_VAR,
                        value,
                    });
                }
            };
        }
        if let Some(value) = lookup(STORE_VAR) {
            self.store = value.parse().map_err(|_| ConfigError::InvalidValue {
                var: STORE_VAR,
                value: value.clone(),
            })?;
        }
        Ok(())
    }

    pub fn open_store(&self) -> Result<Arc<dyn TaskStore>, ConfigError> {
        let store: Arc<dyn TaskStore> = match self.store {
            StoreBackend::Memory => Arc::new(MemoryTaskStore::new()),
            StoreBackend::File => Arc::new(FileTaskStore::new(&self.data_dir)?),
            #[cfg(feature = "sqlite")]
            StoreBackend::Sqlite => {
                std::fs::create_dir_all(&self.data_dir).map_err(PersistenceError::from)?;
                Arc::new(crate::persistence::sqlite::SqliteTaskStore::new(
                    self.data_dir.join("interchange.sqlite3"),
                )?)
            }
            #[cfg(not(feature = "sqlite"))]
            StoreBackend::Sqlite => {
                return Err(ConfigError::InvalidValue {
                    var: STORE_VAR,
                    value: "sqlite (built without the sqlite feature)".into(),
                });
            }
        };
        tracing::debug!(backend = ?self.store, data_dir = %self.data_dir.display(), "store opened");
        Ok(store)
    }
}
