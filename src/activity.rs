use crate::persistence::{PersistenceResult, StoreKey, TaskStore, load_typed, save_typed};
use crate::settings::FileType;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One event in a project's activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ActivityLogEntry {
    AstaImport {
        timestamp: DateTime<Utc>,
        demo: bool,
        task_count: usize,
        project_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source_file_name: Option<String>,
    },
    AstaExport {
        timestamp: DateTime<Utc>,
        demo: bool,
        format: FileType,
        file_name: String,
        task_count: usize,
    },
    /// Entries written by other parts of the application, such as the old demo counter
    /// markers. Kept in the log, never counted.
    #[serde(other)]
    Other,
}

impl ActivityLogEntry {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            ActivityLogEntry::AstaImport { timestamp, .. }
            | ActivityLogEntry::AstaExport { timestamp, .. } => Some(*timestamp),
            ActivityLogEntry::Other => None,
        }
    }

    pub fn is_demo_export_on(&self, day: NaiveDate) -> bool {
        matches!(
            self,
            ActivityLogEntry::AstaExport { demo: true, timestamp, .. }
                if timestamp.date_naive() == day
        )
    }

    pub fn is_import(&self) -> bool {
        matches!(self, ActivityLogEntry::AstaImport { .. })
    }
}

/// Append-only access to `activityLog_<project>`.
pub struct ActivityLog<'a> {
    store: &'a dyn TaskStore,
    namespace: &'a str,
    key: String,
}

impl<'a> ActivityLog<'a> {
    pub fn new(store: &'a dyn TaskStore, namespace: &'a str, project_id: &str) -> Self {
        Self {
            store,
            namespace,
            key: StoreKey::activity_log(project_id),
        }
    }

    pub fn entries(&self) -> PersistenceResult<Vec<ActivityLogEntry>> {
        load_typed(self.store, &self.key, self.namespace)
    }

    /// Appends `entry` and returns the new log length.
    ///
    /// Stored entries are written back as they were read; the log is never rewritten in
    /// any other way.
    pub fn append(&self, entry: ActivityLogEntry) -> PersistenceResult<usize> {
        let mut raw: Vec<serde_json::Value> = load_typed(self.store, &self.key, self.namespace)?;
        raw.push(serde_json::to_value(&entry)?);
        let len = raw.len();
        save_typed(self.store, &self.key, &raw, self.namespace)?;
        tracing::debug!(key = %self.key, len, "activity log appended");
        Ok(len)
    }
}
