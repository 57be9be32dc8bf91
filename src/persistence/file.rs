use super::{PersistenceError, PersistenceResult, TaskStore};
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Stores each value as `<root>/<namespace>/<key>.json`.
///
/// Writes go to a temporary sibling first and are renamed into place, so a reader never
/// observes a half-written document.
#[derive(Debug, Clone)]
pub struct FileTaskStore {
    root: PathBuf,
}

impl FileTaskStore {
    pub fn new<P: AsRef<Path>>(root: P) -> PersistenceResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str, namespace: &str) -> PersistenceResult<PathBuf> {
        validate_segment(namespace)?;
        validate_segment(key)?;
        Ok(self.root.join(namespace).join(format!("{key}.json")))
    }
}

fn validate_segment(segment: &str) -> PersistenceResult<()> {
    let invalid = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0']);
    if invalid {
        return Err(PersistenceError::InvalidData {
            key: segment.to_string(),
            message: "not usable as a file name".into(),
        });
    }
    Ok(())
}

impl TaskStore for FileTaskStore {
    fn get(&self, key: &str, namespace: &str) -> PersistenceResult<Option<Value>> {
        let path = self.path_for(key, namespace)?;
        if !path.exists() {
            return Ok(None);
        }
        let file = File::open(&path)?;
        let value = serde_json::from_reader(BufReader::new(file))?;
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: Value, namespace: &str) -> PersistenceResult<()> {
        let path = self.path_for(key, namespace)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_path = path.with_extension("json.tmp");
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &value)?;
            writer.flush()?;
        }
        fs::rename(&temp_path, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn missing_key_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = FileTaskStore::new(dir.path()).unwrap();
        assert!(store.get("tasks_p1", "programme").unwrap().is_none());
    }

    #[test]
    fn set_then_get_returns_document() {
        let dir = TempDir::new().unwrap();
        let store = FileTaskStore::new(dir.path()).unwrap();
        store
            .set("tasks_p1", json!([{ "id": "1" }]), "programme")
            .unwrap();
        let value = store.get("tasks_p1", "programme").unwrap().unwrap();
        assert_eq!(value, json!([{ "id": "1" }]));
        assert!(!dir.path().join("programme/tasks_p1.json.tmp").exists());
    }

    #[test]
    fn rejects_path_traversal_keys() {
        let dir = TempDir::new().unwrap();
        let store = FileTaskStore::new(dir.path()).unwrap();
        let err = store.set("../escape", json!(1), "programme").unwrap_err();
        assert!(matches!(err, PersistenceError::InvalidData { .. }));
    }
}
