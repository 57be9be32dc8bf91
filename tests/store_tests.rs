use chrono::NaiveDate;
use programme_interchange::formats::csv::SAMPLE_PROGRAMME;
use programme_interchange::{
    DateRange, EngineConfig, ExportSettings, FileTaskStore, FileType, ImportFile,
    InterchangeEngine, StoreBackend, TaskStore,
};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn import_then_export(store: Arc<dyn TaskStore>) -> usize {
    let engine = InterchangeEngine::new(store, EngineConfig::default());
    engine
        .import_file(&ImportFile::new("plan.csv", SAMPLE_PROGRAMME), "p1")
        .unwrap();
    let range = DateRange::new(
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
    );
    engine
        .export_data(&ExportSettings::new(FileType::Csv, range), "p1")
        .unwrap()
        .task_count
}

#[test]
fn file_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = Arc::new(FileTaskStore::new(dir.path()).unwrap());
        assert_eq!(import_then_export(store), 5);
    }
    let reopened = Arc::new(FileTaskStore::new(dir.path()).unwrap());
    let engine = InterchangeEngine::new(reopened, EngineConfig::default());
    assert_eq!(engine.tasks("p1").unwrap().len(), 10);
    assert_eq!(engine.activity("p1").unwrap().len(), 2);
    assert!(dir.path().join("programme").join("tasks_p1.json").exists());
}

#[test]
fn file_store_rejects_path_like_keys() {
    let dir = TempDir::new().unwrap();
    let store = FileTaskStore::new(dir.path()).unwrap();
    assert!(store.set("../escape", json!(1), "programme").is_err());
    assert!(store.get("tasks_p1", "a/b").is_err());
}

#[test]
fn namespaces_are_isolated() {
    let dir = TempDir::new().unwrap();
    let store = FileTaskStore::new(dir.path()).unwrap();
    store.set("tasks_p1", json!([1]), "one").unwrap();
    assert_eq!(store.get("tasks_p1", "two").unwrap(), None);
    assert_eq!(store.get("tasks_p1", "one").unwrap(), Some(json!([1])));
}

#[test]
fn config_opens_the_selected_backend() {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig {
        store: StoreBackend::File,
        data_dir: dir.path().join("data"),
        ..EngineConfig::default()
    };
    let store = config.open_store().unwrap();
    store.set("k", json!("v"), "programme").unwrap();
    assert!(dir.path().join("data/programme/k.json").exists());

    let memory = EngineConfig {
        store: StoreBackend::Memory,
        ..EngineConfig::default()
    }
    .open_store()
    .unwrap();
    assert_eq!(memory.get("k", "programme").unwrap(), None);
}

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::*;
    use programme_interchange::SqliteTaskStore;
    use tempfile::NamedTempFile;

    #[test]
    fn sqlite_store_runs_the_pipelines() {
        let store = Arc::new(SqliteTaskStore::in_memory().unwrap());
        assert_eq!(import_then_export(store.clone()), 5);
        let tasks = store.get("tasks_p1", "programme").unwrap().unwrap();
        assert_eq!(tasks.as_array().unwrap().len(), 10);
    }

    #[test]
    fn sqlite_store_upserts_and_persists() {
        let file = NamedTempFile::new().unwrap();
        {
            let store = SqliteTaskStore::new(file.path()).unwrap();
            store.set("project_p1", json!({ "name": "A" }), "programme").unwrap();
            store.set("project_p1", json!({ "name": "B" }), "programme").unwrap();
        }
        let store = SqliteTaskStore::new(file.path()).unwrap();
        assert_eq!(
            store.get("project_p1", "programme").unwrap(),
            Some(json!({ "name": "B" }))
        );
        assert_eq!(store.get("project_p1", "other").unwrap(), None);
    }
}
