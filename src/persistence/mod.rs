use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("invalid data under '{key}': {message}")]
    InvalidData { key: String, message: String },
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Key/value persistence collaborator. Values are JSON documents grouped by namespace.
pub trait TaskStore: Send + Sync {
    fn get(&self, key: &str, namespace: &str) -> PersistenceResult<Option<Value>>;
    fn set(&self, key: &str, value: Value, namespace: &str) -> PersistenceResult<()>;
}

/// Per-project keys used by the engine.
pub struct StoreKey;

impl StoreKey {
    pub fn tasks(project_id: &str) -> String {
        format!("tasks_{project_id}")
    }

    pub fn project(project_id: &str) -> String {
        format!("project_{project_id}")
    }

    pub fn activity_log(project_id: &str) -> String {
        format!("activityLog_{project_id}")
    }

    pub fn baselines(project_id: &str) -> String {
        format!("baselines_{project_id}")
    }

    pub fn calendars(project_id: &str) -> String {
        format!("calendars_{project_id}")
    }
}

/// Reads `key` and decodes it, treating a missing or null value as `T::default()`.
pub fn load_typed<T>(store: &dyn TaskStore, key: &str, namespace: &str) -> PersistenceResult<T>
where
    T: DeserializeOwned + Default,
{
    match store.get(key, namespace)? {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value).map_err(|err| PersistenceError::InvalidData {
            key: key.to_string(),
            message: err.to_string(),
        }),
    }
}

pub fn save_typed<T: Serialize>(
    store: &dyn TaskStore,
    key: &str,
    value: &T,
    namespace: &str,
) -> PersistenceResult<()> {
    store.set(key, serde_json::to_value(value)?, namespace)
}

/// Reads a category collection (baselines, calendars). A lone object is treated as a
/// single-element list so that stores written by other clients still export.
pub fn load_collection(
    store: &dyn TaskStore,
    key: &str,
    namespace: &str,
) -> PersistenceResult<Vec<Value>> {
    Ok(match store.get(key, namespace)? {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => vec![other],
    })
}

pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::FileTaskStore;
pub use memory::MemoryTaskStore;
