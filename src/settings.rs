use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Export target format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Csv,
    Json,
    Mpx,
    Xer,
}

impl FileType {
    pub const ALL: [FileType; 4] = [FileType::Csv, FileType::Json, FileType::Mpx, FileType::Xer];

    pub fn extension(self) -> &'static str {
        match self {
            FileType::Csv => "csv",
            FileType::Json => "json",
            FileType::Mpx => "mpx",
            FileType::Xer => "xer",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            FileType::Csv => "text/csv",
            FileType::Json => "application/json",
            FileType::Mpx => "application/vnd.ms-project",
            FileType::Xer => "application/xml",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(FileType::Csv),
            "json" => Ok(FileType::Json),
            "mpx" => Ok(FileType::Mpx),
            "xer" | "xml" => Ok(FileType::Xer),
            other => Err(format!("unknown export format '{other}'")),
        }
    }
}

/// Inclusive calendar-day window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Days between start and end; zero for a single-day range.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    pub file_type: FileType,
    pub date_range: DateRange,
    #[serde(default = "default_true")]
    pub include_constraints: bool,
    #[serde(default = "default_true")]
    pub include_baselines: bool,
    #[serde(default = "default_true")]
    pub include_notes: bool,
    #[serde(default = "default_true")]
    pub include_resources: bool,
    #[serde(default = "default_true")]
    pub include_calendars: bool,
    #[serde(default)]
    pub demo: bool,
}

impl ExportSettings {
    /// Everything included.
    pub fn new(file_type: FileType, date_range: DateRange) -> Self {
        Self {
            file_type,
            date_range,
            include_constraints: true,
            include_baselines: true,
            include_notes: true,
            include_resources: true,
            include_calendars: true,
            demo: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn include_flags_default_to_true() {
        let settings: ExportSettings = serde_json::from_value(json!({
            "fileType": "csv",
            "dateRange": { "start": "2025-01-01", "end": "2025-01-07" },
            "includeBaselines": false
        }))
        .unwrap();
        assert_eq!(settings.file_type, FileType::Csv);
        assert!(settings.include_constraints);
        assert!(!settings.include_baselines);
        assert!(!settings.demo);
    }

    #[test]
    fn range_is_inclusive() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 7).unwrap(),
        );
        assert!(range.contains(range.start));
        assert!(range.contains(range.end));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2025, 1, 8).unwrap()));
        assert_eq!(range.span_days(), 6);
    }
}
