use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Per-project settings document stored under `project_<id>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_import: Option<LastImport>,
    /// Settings owned by other parts of the application.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastImport {
    pub source: String,
    pub date: DateTime<Utc>,
    pub task_count: usize,
    pub project_name: String,
    pub demo: bool,
}

impl ProjectConfig {
    /// Name used for export file names and payload headers.
    pub fn display_name(&self, project_id: &str) -> String {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| {
                self.last_import
                    .as_ref()
                    .map(|import| import.project_name.as_str())
                    .filter(|name| !name.trim().is_empty())
            })
            .unwrap_or(project_id)
            .to_string()
    }
}
