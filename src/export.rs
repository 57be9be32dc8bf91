//! Export pipeline: range and quota gates, filtering, generation, delivery, logging.

use crate::activity::ActivityLogEntry;
use crate::collaborators::AuditRecord;
use crate::engine::InterchangeEngine;
use crate::error::InterchangeResult;
use crate::formats::{self, ExportPayload, ExportProjectInfo};
use crate::persistence::{StoreKey, load_collection, load_typed};
use crate::project::ProjectConfig;
use crate::settings::{DateRange, ExportSettings};
use crate::task::Task;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// A finished export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
    pub task_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<usize>,
    pub errors: Vec<String>,
}

impl From<&InterchangeResult<ExportArtifact>> for ExportReport {
    fn from(result: &InterchangeResult<ExportArtifact>) -> Self {
        match result {
            Ok(artifact) => ExportReport {
                success: true,
                file_name: Some(artifact.file_name.clone()),
                file_size: Some(artifact.bytes.len()),
                errors: Vec::new(),
            },
            Err(err) => ExportReport {
                success: false,
                file_name: None,
                file_size: None,
                errors: vec![err.to_string()],
            },
        }
    }
}

/// `{name}_{YYYY-MM-DD}.{ext}` with path separators in the name replaced.
pub fn export_file_name(project_name: &str, day: NaiveDate, extension: &str) -> String {
    let safe: String = project_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("{safe}_{}.{extension}", day.format("%Y-%m-%d"))
}

/// Tasks whose start date falls inside `range`. Undated tasks are dropped.
pub fn tasks_in_range(tasks: Vec<Task>, range: &DateRange) -> Vec<Task> {
    tasks
        .into_iter()
        .filter(|task| task.start().is_some_and(|start| range.contains(start)))
        .collect()
}

fn strip_categories(task: &mut Task, settings: &ExportSettings) {
    if !settings.include_constraints {
        task.constraints.clear();
    }
    if !settings.include_notes {
        task.notes = None;
    }
    if !settings.include_resources {
        task.resources.clear();
    }
}

impl InterchangeEngine {
    /// Builds a file from the project's stored tasks and hands it to the download
    /// surface.
    ///
    /// The export is recorded in the activity log only after generation succeeds, and
    /// that entry is what the demo quota counts.
    pub fn export_data(
        &self,
        settings: &ExportSettings,
        project_id: &str,
    ) -> InterchangeResult<ExportArtifact> {
        let demo = self.is_demo_mode_active();
        let quota = self.quota();

        let _guard = self.locks.lock(project_id);
        let now = self.clock.now();
        let log = self.activity_log(project_id);
        // An exhausted daily allowance is reported ahead of any range problem.
        let gate = quota
            .check_export(demo, &log.entries()?, now.date_naive())
            .and_then(|()| quota.check_date_range(demo, &settings.date_range));
        if let Err(err) = gate {
            tracing::warn!(project = project_id, error = %err, "export rejected");
            return Err(err);
        }

        let ns = self.namespace();
        let tasks: Vec<Task> = load_typed(self.store(), &StoreKey::tasks(project_id), ns)?;
        let project: ProjectConfig = load_typed(self.store(), &StoreKey::project(project_id), ns)?;
        let baselines = if settings.include_baselines {
            load_collection(self.store(), &StoreKey::baselines(project_id), ns)?
        } else {
            Vec::new()
        };
        let calendars = if settings.include_calendars {
            load_collection(self.store(), &StoreKey::calendars(project_id), ns)?
        } else {
            Vec::new()
        };

        let mut tasks = tasks_in_range(tasks, &settings.date_range);
        for task in &mut tasks {
            strip_categories(task, settings);
        }
        let task_count = tasks.len();

        let project_name = project.display_name(project_id);
        let range = settings.date_range;
        let payload = ExportPayload {
            project: ExportProjectInfo {
                name: project_name.clone(),
                start_date: project
                    .start_date
                    .clone()
                    .unwrap_or_else(|| range.start.to_string()),
                end_date: project
                    .end_date
                    .clone()
                    .unwrap_or_else(|| range.end.to_string()),
                generated_by: self.config.generator.clone(),
                generated_at: now,
                demo,
            },
            tasks,
            baselines,
            calendars,
            settings: ExportSettings {
                demo,
                ..settings.clone()
            },
        };

        let generated = formats::generate(&payload, settings.file_type)?;
        let file_name =
            export_file_name(&project_name, now.date_naive(), settings.file_type.extension());

        if let Err(err) = self.download.download(&generated.bytes, &file_name) {
            tracing::warn!(project = project_id, file = %file_name, error = %err, "download failed");
        }

        log.append(ActivityLogEntry::AstaExport {
            timestamp: now,
            demo,
            format: settings.file_type,
            file_name: file_name.clone(),
            task_count,
        })?;

        self.audit.log_action(&AuditRecord {
            project_id: project_id.to_string(),
            actor_id: self.config.actor_id.clone(),
            action_type: "asta_export".to_string(),
            message: format!("Exported {task_count} tasks as {}", settings.file_type),
            before_state: json!({}),
            after_metadata: json!({
                "fileName": file_name,
                "format": settings.file_type,
                "taskCount": task_count,
                "fileSize": generated.bytes.len(),
                "demo": demo,
            }),
        });

        tracing::info!(
            project = project_id,
            file = %file_name,
            format = %settings.file_type,
            task_count,
            demo,
            "programme exported"
        );
        Ok(ExportArtifact {
            file_name,
            mime_type: generated.mime_type,
            bytes: generated.bytes,
            task_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn file_name_replaces_path_separators() {
        assert_eq!(
            export_file_name("North/South\\Link", day(4), "csv"),
            "North_South_Link_2025-03-04.csv"
        );
    }

    #[test]
    fn range_filter_is_inclusive_and_drops_undated_tasks() {
        let mut tasks = Vec::new();
        for (id, start) in [("a", "2025-03-01"), ("b", "2025-03-07"), ("c", "2025-03-08"), ("d", "")] {
            let mut task = Task::new(id, id);
            task.start_date = start.to_string();
            tasks.push(task);
        }
        let kept = tasks_in_range(tasks, &DateRange::new(day(1), day(7)));
        let ids: Vec<_> = kept.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn excluded_categories_are_stripped() {
        let mut task = Task::new("1", "Pour slab");
        task.notes = Some("weather dependent".into());
        task.constraints = vec![json!({ "type": "SNET" })];
        task.resources = vec![json!("crane")];
        let mut settings = ExportSettings::new(
            crate::settings::FileType::Json,
            DateRange::new(day(1), day(2)),
        );
        settings.include_notes = false;
        settings.include_resources = false;
        strip_categories(&mut task, &settings);
        assert!(task.notes.is_none());
        assert!(task.resources.is_empty());
        assert_eq!(task.constraints.len(), 1);
    }
}
