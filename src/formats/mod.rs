//! Interchange formats.
//!
//! Parsing turns an uploaded file into a [`ParsedProgramme`]; generation turns an
//! [`ExportPayload`] into bytes. Each format lives in its own module and exposes the
//! directions it supports:
//!
//! | Format | Import | Export |
//! |--------|--------|--------|
//! | CSV    | yes    | yes    |
//! | JSON   | yes    | yes    |
//! | MPX    | yes    | yes    |
//! | XER    | no     | yes    |

use crate::error::{InterchangeError, InterchangeResult};
use crate::programme::ParsedProgramme;
use crate::settings::{ExportSettings, FileType};
use crate::task::Task;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

pub mod csv;
pub mod json;
pub mod mpx;
pub mod xer;

/// An uploaded file: its name (for extension dispatch and provenance) and raw bytes.
#[derive(Debug, Clone)]
pub struct ImportFile {
    pub name: String,
    pub content: Vec<u8>,
}

impl ImportFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { name, content })
    }

    /// Lower-cased extension without the dot, empty when the name has none.
    pub fn extension(&self) -> String {
        Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default()
    }

    /// File name with its extension stripped.
    pub fn stem(&self) -> String {
        Path::new(&self.name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }

    fn text(&self) -> InterchangeResult<&str> {
        let text = std::str::from_utf8(&self.content).map_err(|source| InterchangeError::Read {
            file_name: self.name.clone(),
            source,
        })?;
        Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
    }
}

/// Parses `file` with the strategy its extension selects.
///
/// The returned programme always has `demo == false`; callers stamp the real flag.
pub fn parse(file: &ImportFile, imported_at: DateTime<Utc>) -> InterchangeResult<ParsedProgramme> {
    let extension = file.extension();
    let parser: fn(&str, &ImportFile, DateTime<Utc>) -> InterchangeResult<ParsedProgramme> =
        match extension.as_str() {
            "csv" => csv::parse,
            "json" => json::parse,
            "mpx" => mpx::parse,
            _ => {
                return Err(InterchangeError::UnsupportedFormat {
                    extension: extension.clone(),
                });
            }
        };
    let text = file.text()?;
    let mut programme = parser(text, file, imported_at)?;
    for task in &mut programme.tasks {
        if task.original_id.is_none() {
            task.original_id = Some(task.id.clone());
        }
        task.source_file_name = Some(file.name.clone());
        task.imported_at = Some(imported_at);
    }
    programme.task_count = programme.tasks.len();
    programme.demo = false;
    for warning in &programme.warnings {
        tracing::warn!(file = %file.name, %warning, "lenient parse");
    }
    Ok(programme)
}

/// Project block at the head of every export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportProjectInfo {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub generated_by: String,
    pub generated_at: DateTime<Utc>,
    pub demo: bool,
}

/// Everything a generator needs. Excluded categories are empty, never absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub project: ExportProjectInfo,
    pub tasks: Vec<Task>,
    pub baselines: Vec<Value>,
    pub calendars: Vec<Value>,
    pub settings: ExportSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

pub fn generate(payload: &ExportPayload, file_type: FileType) -> InterchangeResult<GeneratedFile> {
    let bytes = match file_type {
        FileType::Csv => csv::generate(payload)?,
        FileType::Json => json::generate(payload)?,
        FileType::Mpx => mpx::generate(payload)?,
        FileType::Xer => xer::generate(payload),
    };
    Ok(GeneratedFile {
        bytes,
        mime_type: file_type.mime_type(),
    })
}

/// Renders a number the way a spreadsheet would: `50` rather than `50.0`.
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_extension_is_rejected_by_name() {
        let file = ImportFile::new("plan.pp", "whatever");
        let err = parse(&file, Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file format: .pp");
    }

    #[test]
    fn non_utf8_content_is_a_read_failure() {
        let file = ImportFile::new("plan.csv", vec![0xff, 0xfe, 0x00, 0x41]);
        let err = parse(&file, Utc::now()).unwrap_err();
        assert!(matches!(err, InterchangeError::Read { .. }));
    }

    #[test]
    fn extension_dispatch_ignores_case() {
        let file = ImportFile::new("PLAN.CSV", "Task ID,Task Name\n1,Survey\n");
        let programme = parse(&file, Utc::now()).unwrap();
        assert_eq!(programme.task_count, 1);
        assert_eq!(programme.project_name, "PLAN");
    }

    #[test]
    fn formats_whole_numbers_without_fraction() {
        assert_eq!(format_number(50.0), "50");
        assert_eq!(format_number(12.5), "12.5");
    }
}
