use super::{ExportPayload, ImportFile};
use crate::error::{InterchangeError, InterchangeResult};
use crate::programme::{ParseWarning, ParsedProgramme};
use crate::task::Task;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

pub(super) fn parse(
    text: &str,
    file: &ImportFile,
    _imported_at: DateTime<Utc>,
) -> InterchangeResult<ParsedProgramme> {
    let document: Value = serde_json::from_str(text)?;
    let Value::Object(mut root) = document else {
        return Err(InterchangeError::InvalidDocument(
            "JSON programme must be a single object".into(),
        ));
    };

    let project_name = project_name(&root).unwrap_or_else(|| file.stem());
    let mut warnings = Vec::new();
    let tasks = take_array(&mut root, "tasks")
        .into_iter()
        .enumerate()
        .filter_map(|(idx, value)| match serde_json::from_value::<Task>(value) {
            Ok(task) => Some(task),
            Err(err) => {
                // position in the tasks array stands in for a line number
                warnings.push(ParseWarning::new(
                    idx + 1,
                    format!("task entry skipped: {err}"),
                ));
                None
            }
        })
        .collect();

    let mut programme = ParsedProgramme::new(project_name, tasks);
    programme.constraints = take_array(&mut root, "constraints");
    programme.calendars = take_array(&mut root, "calendars");
    programme.resources = take_array(&mut root, "resources");
    programme.warnings = warnings;
    Ok(programme)
}

/// `projectName`, else the `project.name` block our own exports carry.
fn project_name(root: &Map<String, Value>) -> Option<String> {
    root.get("projectName")
        .and_then(Value::as_str)
        .or_else(|| {
            root.get("project")
                .and_then(|project| project.get("name"))
                .and_then(Value::as_str)
        })
        .filter(|name| !name.trim().is_empty())
        .map(str::to_string)
}

fn take_array(root: &mut Map<String, Value>, key: &str) -> Vec<Value> {
    match root.remove(key) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

pub(super) fn generate(payload: &ExportPayload) -> InterchangeResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(payload)?)
}
