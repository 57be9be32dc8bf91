use super::{ExportPayload, ImportFile, format_number};
use crate::error::InterchangeResult;
use crate::programme::{ParseWarning, ParsedProgramme};
use crate::task::{Task, parse_integer};
use chrono::{DateTime, Utc};

/// Header written on export.
pub const EXPORT_HEADER: [&str; 7] = [
    "Task ID",
    "Name",
    "Start Date",
    "Finish Date",
    "Duration",
    "Progress",
    "Is Milestone",
];

/// Header of the import layout. Only the first seven columns are consumed.
pub const IMPORT_HEADER: [&str; 10] = [
    "Task ID",
    "Task Name",
    "Start Date",
    "Finish Date",
    "Duration",
    "Percent Complete",
    "Is Milestone",
    "Dependencies",
    "Calendar ID",
    "Structure Level",
];

/// Ten-task programme in the import layout, handed out as a template.
pub const SAMPLE_PROGRAMME: &str = include_str!("../../demos/sample_programme.csv");

const CONSUMED_COLUMNS: usize = 7;

pub(super) fn parse(
    text: &str,
    file: &ImportFile,
    _imported_at: DateTime<Utc>,
) -> InterchangeResult<ParsedProgramme> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

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
        if record.len() < CONSUMED_COLUMNS {
            warnings.push(ParseWarning::new(
                line,
                format!(
                    "expected {CONSUMED_COLUMNS} columns, found {}; missing fields defaulted",
                    record.len()
                ),
            ));
        }
        let field = |idx: usize| record.get(idx).unwrap_or("");
        let mut task = Task::new(field(0).trim(), field(1));
        task.start_date = field(2).trim().to_string();
        task.finish_date = field(3).trim().to_string();
        task.duration = integer_or_zero(field(4), "Duration", line, &mut warnings);
        task.percent_complete = number_or_zero(field(5), "Percent Complete", line, &mut warnings);
        task.is_milestone = field(6).trim() == "Yes";
        tasks.push(task);
    }

    let mut programme = ParsedProgramme::new(file.stem(), tasks);
    programme.warnings = warnings;
    Ok(programme)
}

fn integer_or_zero(raw: &str, column: &str, line: usize, warnings: &mut Vec<ParseWarning>) -> i64 {
    if raw.trim().is_empty() {
        return 0;
    }
    parse_integer(raw).unwrap_or_else(|| {
        warnings.push(ParseWarning::new(
            line,
            format!("{column} '{raw}' is not a number; using 0"),
        ));
        0
    })
}

fn number_or_zero(raw: &str, column: &str, line: usize, warnings: &mut Vec<ParseWarning>) -> f64 {
    if raw.trim().is_empty() {
        return 0.0;
    }
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            warnings.push(ParseWarning::new(
                line,
                format!("{column} '{raw}' is not a number; using 0"),
            ));
            0.0
        }
    }
}

pub(super) fn generate(payload: &ExportPayload) -> InterchangeResult<Vec<u8>> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER)?;
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
            if task.is_milestone { "Yes" } else { "No" },
        ])?;
    }
    writer.flush()?;
    let bytes = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::parse as parse_file;

    fn parse_text(name: &str, text: &str) -> ParsedProgramme {
        parse_file(&ImportFile::new(name, text), Utc::now()).unwrap()
    }

    #[test]
    fn sample_programme_has_ten_tasks() {
        let programme = parse_text("sample.csv", SAMPLE_PROGRAMME);
        assert_eq!(programme.task_count, 10);
        assert!(programme.warnings.is_empty());
        assert!(programme.tasks[0].is_milestone);
        assert!(!programme.tasks[1].is_milestone);
        assert_eq!(programme.tasks[4].duration, 14);
        assert_eq!(programme.tasks[4].percent_complete, 40.0);
    }

    #[test]
    fn sample_header_matches_import_layout() {
        let header = SAMPLE_PROGRAMME.lines().next().unwrap();
        assert_eq!(header, IMPORT_HEADER.join(","));
    }

    #[test]
    fn milestone_requires_literal_yes() {
        let programme = parse_text(
            "m.csv",
            "Task ID,Task Name,Start Date,Finish Date,Duration,Percent Complete,Is Milestone\n\
             1,A,2025-01-01,2025-01-01,0,0,yes\n\
             2,B,2025-01-01,2025-01-01,0,0,Yes\n",
        );
        assert!(!programme.tasks[0].is_milestone);
        assert!(programme.tasks[1].is_milestone);
    }

    #[test]
    fn bad_numbers_default_to_zero_with_warning() {
        let programme = parse_text(
            "w.csv",
            "Task ID,Task Name,Start Date,Finish Date,Duration,Percent Complete,Is Milestone\n\
             1,A,2025-01-01,2025-01-03,three,half,No\n",
        );
        let task = &programme.tasks[0];
        assert_eq!(task.duration, 0);
        assert_eq!(task.percent_complete, 0.0);
        assert_eq!(programme.warnings.len(), 2);
        assert_eq!(programme.warnings[0].line, 2);
    }

    #[test]
    fn quoted_names_keep_their_commas() {
        let programme = parse_text(
            "q.csv",
            "Task ID,Task Name,Start Date,Finish Date,Duration,Percent Complete,Is Milestone\n\
             1,\"Excavate, shore and backfill\",2025-01-01,2025-01-03,3,0,No\n",
        );
        let task = &programme.tasks[0];
        assert_eq!(task.name, "Excavate, shore and backfill");
        assert_eq!(task.start_date, "2025-01-01");
        assert_eq!(task.duration, 3);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let programme = parse_text(
            "b.csv",
            "Task ID,Task Name,Start Date,Finish Date,Duration,Percent Complete,Is Milestone\n\
             1,A,2025-01-01,2025-01-01,1,0,No\n\
             \n\
             2,B,2025-01-02,2025-01-02,1,0,No\n",
        );
        assert_eq!(programme.task_count, 2);
    }

    #[test]
    fn finish_before_start_is_accepted() {
        let programme = parse_text(
            "r.csv",
            "Task ID,Task Name,Start Date,Finish Date,Duration,Percent Complete,Is Milestone\n\
             1,Backwards,2025-02-01,2025-01-01,1,0,No\n",
        );
        assert_eq!(programme.tasks[0].finish_date, "2025-01-01");
    }
}
