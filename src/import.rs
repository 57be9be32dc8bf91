//! Import pipeline: quota gate, id remapping, append-merge into the store.

use crate::activity::ActivityLogEntry;
use crate::collaborators::AuditRecord;
use crate::engine::InterchangeEngine;
use crate::error::{InterchangeError, InterchangeResult};
use crate::formats::{self, ImportFile};
use crate::persistence::{StoreKey, load_typed, save_typed};
use crate::programme::ParsedProgramme;
use crate::project::{LastImport, ProjectConfig};
use crate::task::Task;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub tasks_imported: usize,
    pub total_tasks: usize,
    pub demo: bool,
}

/// Caller-facing outcome of an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ImportSummary>,
    pub errors: Vec<String>,
}

impl From<InterchangeResult<ImportSummary>> for ImportReport {
    fn from(result: InterchangeResult<ImportSummary>) -> Self {
        match result {
            Ok(summary) => ImportReport {
                success: true,
                data: Some(summary),
                errors: Vec::new(),
            },
            Err(err) => ImportReport {
                success: false,
                data: None,
                errors: vec![err.to_string()],
            },
        }
    }
}

impl InterchangeEngine {
    /// Parses `file`, stamps the current demo flag and merges it into `project_id`.
    pub fn import_file(
        &self,
        file: &ImportFile,
        project_id: &str,
    ) -> InterchangeResult<ImportSummary> {
        let parsed = formats::parse(file, self.clock.now())?
            .with_demo(self.is_demo_mode_active());
        self.import_data(parsed, project_id)
    }

    /// Appends every task of `parsed` to the project's task list under fresh ids.
    ///
    /// Nothing is written when a gate rejects the programme. Existing tasks are never
    /// replaced or de-duplicated.
    pub fn import_data(
        &self,
        parsed: ParsedProgramme,
        project_id: &str,
    ) -> InterchangeResult<ImportSummary> {
        let demo = self.is_demo_mode_active();
        if let Err(err) = self.quota().check_import(demo, parsed.tasks.len()) {
            tracing::warn!(project = project_id, error = %err, "import rejected");
            return Err(err);
        }
        if parsed.task_count != parsed.tasks.len() {
            return Err(InterchangeError::TaskCountMismatch {
                declared: parsed.task_count,
                actual: parsed.tasks.len(),
            });
        }

        let _guard = self.locks.lock(project_id);
        let ns = self.namespace();
        let tasks_key = StoreKey::tasks(project_id);
        let project_key = StoreKey::project(project_id);

        let mut existing: Vec<Task> = load_typed(self.store(), &tasks_key, ns)?;
        let mut project: ProjectConfig = load_typed(self.store(), &project_key, ns)?;
        let before_count = existing.len();

        let now = self.clock.now();
        let stamp = now.timestamp_millis();
        let tasks_imported = parsed.tasks.len();
        let source_file_name = parsed
            .tasks
            .first()
            .and_then(|task| task.source_file_name.clone());
        // Suffix is the task's position in the merged list so ids stay unique even
        // when two imports land in the same millisecond.
        existing.extend(parsed.tasks.into_iter().enumerate().map(|(offset, mut task)| {
            if task.original_id.is_none() {
                task.original_id = Some(task.id.clone());
            }
            task.id = format!("imported_{stamp}_{}", before_count + offset);
            task.demo = Some(demo);
            task.created_at = Some(now);
            task
        }));
        let total_tasks = existing.len();
        save_typed(self.store(), &tasks_key, &existing, ns)?;

        project.last_import = Some(LastImport {
            source: parsed.imported_from.clone(),
            date: now,
            task_count: tasks_imported,
            project_name: parsed.project_name.clone(),
            demo,
        });
        save_typed(self.store(), &project_key, &project, ns)?;

        self.activity_log(project_id).append(ActivityLogEntry::AstaImport {
            timestamp: now,
            demo,
            task_count: tasks_imported,
            project_name: parsed.project_name.clone(),
            source_file_name,
        })?;

        self.audit.log_action(&AuditRecord {
            project_id: project_id.to_string(),
            actor_id: self.config.actor_id.clone(),
            action_type: "asta_import".to_string(),
            message: format!(
                "Imported {tasks_imported} tasks from {}",
                parsed.imported_from
            ),
            before_state: json!({ "taskCount": before_count }),
            after_metadata: json!({
                "tasksImported": tasks_imported,
                "totalTasks": total_tasks,
                "projectName": parsed.project_name,
                "demo": demo,
            }),
        });

        tracing::info!(
            project = project_id,
            tasks_imported,
            total_tasks,
            demo,
            "programme imported"
        );
        Ok(ImportSummary {
            tasks_imported,
            total_tasks,
            demo,
        })
    }
}
