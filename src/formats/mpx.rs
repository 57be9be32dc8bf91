//! Minimal MPX dialect.
//!
//! ```text
//! Microsoft Project
//! Version,4.0
//! ProjectName,<name>
//! StartDate,<date>
//! EndDate,<date>
//! Tasks
//! <id>,<name>,<start>,<finish>,<duration>,<percent complete>
//! ```
//!
//! Fields follow RFC 4180 quoting: a value containing a comma, quote or newline is
//! wrapped in double quotes with inner quotes doubled.
//!
//! Milestones are not encoded. Every imported task has `is_milestone == false` and an
//! exported milestone is indistinguishable from a zero-duration task.

use super::{ExportPayload, ImportFile, format_number};
use crate::error::InterchangeResult;
use crate::programme::{ParseWarning, ParsedProgramme};
use crate::task::{Task, parse_integer};
use chrono::{DateTime, Utc};

pub const SIGNATURE: &str = "Microsoft Project";
pub const VERSION: &str = "4.0";
pub const TASKS_MARKER: &str = "Tasks";

const TASK_COLUMNS: usize = 6;

pub(super) fn parse(
    text: &str,
    file: &ImportFile,
    _imported_at: DateTime<Utc>,
) -> InterchangeResult<ParsedProgramme> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut project_name = None;
    let mut in_tasks = false;
    let mut tasks = Vec::new();
    let mut warnings = Vec::new();

    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let line = record
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or_default();

        if !in_tasks {
            match record.get(0).map(str::trim) {
                Some(TASKS_MARKER) if record.len() == 1 => in_tasks = true,
                Some("ProjectName") => {
                    project_name = record
                        .get(1)
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .map(str::to_string);
                }
                Some(SIGNATURE | "Version" | "StartDate" | "EndDate")
                    if record.len() < TASK_COLUMNS => {}
                _ => warnings.push(ParseWarning::new(
                    line,
                    "task-like row before Tasks marker ignored",
                )),
            }
            continue;
        }

        if record.len() < TASK_COLUMNS {
            warnings.push(ParseWarning::new(
                line,
                format!(
                    "expected {TASK_COLUMNS} columns, found {}; missing fields defaulted",
                    record.len()
                ),
            ));
        }
        let field = |idx: usize| record.get(idx).unwrap_or("");
        let mut task = Task::new(field(0).trim(), field(1));
        task.start_date = field(2).trim().to_string();
        task.finish_date = field(3).trim().to_string();
        task.duration = parse_integer(field(4)).unwrap_or_else(|| {
            if !field(4).trim().is_empty() {
                warnings.push(ParseWarning::new(line, "duration is not a number; using 0"));
            }
            0
        });
        task.percent_complete = match field(5).trim() {
            "" => 0.0,
            raw => raw.parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or_else(|| {
                warnings.push(ParseWarning::new(
                    line,
                    "percent complete is not a number; using 0",
                ));
                0.0
            }),
        };
        tasks.push(task);
    }

    if !in_tasks {
        warnings.push(ParseWarning::new(0, "no Tasks section found"));
    }

    let mut programme =
        ParsedProgramme::new(project_name.unwrap_or_else(|| file.stem()), tasks);
    programme.warnings = warnings;
    Ok(programme)
}

pub(super) fn generate(payload: &ExportPayload) -> InterchangeResult<Vec<u8>> {
    let mut writer = ::csv::WriterBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_writer(Vec::new());
    let project = &payload.project;
    writer.write_record([SIGNATURE])?;
    writer.write_record(["Version", VERSION])?;
    writer.write_record(["ProjectName", project.name.as_str()])?;
    writer.write_record(["StartDate", project.start_date.as_str()])?;
    writer.write_record(["EndDate", project.end_date.as_str()])?;
    writer.write_record([TASKS_MARKER])?;
    for task in &payload.tasks {
        let duration = task.duration.to_string();
        let progress = format_number(task.percent_complete);
        writer.write_record([
            task.id.as_str(),
            task.name.as_str(),
            task.start_date.as_str(),
            task.finish_date.as_str(),
            duration.as_str(),
            progress.as_str(),
        ])?;
    }
    writer.flush()?;
    let bytes = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(bytes)
}
