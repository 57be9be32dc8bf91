use super::{PersistenceResult, TaskStore};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

/// Process-local store, used by tests and the `memory` backend.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    entries: RwLock<HashMap<(String, String), Value>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl TaskStore for MemoryTaskStore {
    fn get(&self, key: &str, namespace: &str) -> PersistenceResult<Option<Value>> {
        let guard = self.entries.read();
        Ok(guard
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    fn set(&self, key: &str, value: Value, namespace: &str) -> PersistenceResult<()> {
        let mut guard = self.entries.write();
        guard.insert((namespace.to_string(), key.to_string()), value);
        Ok(())
    }
}
