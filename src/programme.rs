use crate::task::Task;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Tag recorded as `importedFrom` on every parsed programme.
pub const SOURCE_SYSTEM: &str = "Asta Powerproject";

/// A row the parser accepted but had to repair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    pub line: usize,
    pub message: String,
}

impl ParseWarning {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Output of any format parser, before remapping and merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedProgramme {
    pub project_name: String,
    pub task_count: usize,
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub constraints: Vec<Value>,
    #[serde(default)]
    pub calendars: Vec<Value>,
    #[serde(default)]
    pub resources: Vec<Value>,
    pub imported_from: String,
    #[serde(default)]
    pub demo: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ParseWarning>,
}

impl ParsedProgramme {
    pub fn new(project_name: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self {
            project_name: project_name.into(),
            task_count: tasks.len(),
            tasks,
            constraints: Vec::new(),
            calendars: Vec::new(),
            resources: Vec::new(),
            imported_from: SOURCE_SYSTEM.to_string(),
            demo: false,
            warnings: Vec::new(),
        }
    }

    pub fn with_demo(mut self, demo: bool) -> Self {
        self.demo = demo;
        self
    }
}
