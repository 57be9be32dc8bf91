use chrono::{Duration, NaiveDate, Utc};
use programme_interchange::formats::{self, ExportPayload, ExportProjectInfo, ImportFile};
use programme_interchange::{DateRange, ExportSettings, FileType, Task};
use proptest::prelude::*;

fn payload(tasks: Vec<Task>, file_type: FileType) -> ExportPayload {
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    ExportPayload {
        project: ExportProjectInfo {
            name: "Round Trip".into(),
            start_date: "2025-01-01".into(),
            end_date: "2025-12-31".into(),
            generated_by: "tests".into(),
            generated_at: Utc::now(),
            demo: false,
        },
        tasks,
        baselines: Vec::new(),
        calendars: Vec::new(),
        settings: ExportSettings::new(file_type, DateRange::new(start, start)),
    }
}

fn task_strategy() -> impl Strategy<Value = Task> {
    (
        "[A-Z][0-9]{1,4}",
        "[A-Za-z0-9 ,\"'&<>]{1,24}",
        0i64..400,
        0i64..60,
        0u32..=200,
        any::<bool>(),
    )
        .prop_map(|(id, name, offset, duration, half_percent, milestone)| {
            let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + Duration::days(offset);
            let finish = start + Duration::days(duration);
            let mut task = Task::new(id, name);
            task.start_date = start.format("%Y-%m-%d").to_string();
            task.finish_date = finish.format("%Y-%m-%d").to_string();
            task.duration = duration;
            task.percent_complete = f64::from(half_percent) / 2.0;
            task.is_milestone = milestone;
            task
        })
}

fn assert_core_fields_match(before: &[Task], after: &[Task], milestones: bool) {
    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(after) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.name, b.name);
        assert_eq!(a.start_date, b.start_date);
        assert_eq!(a.finish_date, b.finish_date);
        assert_eq!(a.duration, b.duration);
        assert_eq!(a.percent_complete, b.percent_complete);
        if milestones {
            assert_eq!(a.is_milestone, b.is_milestone);
        } else {
            assert!(!a.is_milestone);
        }
    }
}

proptest! {
    #[test]
    fn json_export_reimports_core_fields(tasks in prop::collection::vec(task_strategy(), 0..12)) {
        let generated = formats::generate(&payload(tasks.clone(), FileType::Json), FileType::Json).unwrap();
        let parsed = formats::parse(&ImportFile::new("rt.json", generated.bytes), Utc::now()).unwrap();
        prop_assert_eq!(parsed.project_name.as_str(), "Round Trip");
        prop_assert_eq!(parsed.task_count, tasks.len());
        assert_core_fields_match(&tasks, &parsed.tasks, true);
    }

    #[test]
    fn csv_export_reimports_core_fields(tasks in prop::collection::vec(task_strategy(), 0..12)) {
        let generated = formats::generate(&payload(tasks.clone(), FileType::Csv), FileType::Csv).unwrap();
        let parsed = formats::parse(&ImportFile::new("rt.csv", generated.bytes), Utc::now()).unwrap();
        prop_assert!(parsed.warnings.is_empty());
        assert_core_fields_match(&tasks, &parsed.tasks, true);
    }

    #[test]
    fn mpx_export_reimports_all_but_milestones(tasks in prop::collection::vec(task_strategy(), 0..12)) {
        let generated = formats::generate(&payload(tasks.clone(), FileType::Mpx), FileType::Mpx).unwrap();
        let parsed = formats::parse(&ImportFile::new("rt.mpx", generated.bytes), Utc::now()).unwrap();
        prop_assert_eq!(parsed.project_name.as_str(), "Round Trip");
        assert_core_fields_match(&tasks, &parsed.tasks, false);
    }
}

#[test]
fn xer_output_escapes_markup() {
    let task = Task::new("A1", "Walls & <roof>");
    let generated = formats::generate(&payload(vec![task], FileType::Xer), FileType::Xer).unwrap();
    assert_eq!(generated.mime_type, "application/xml");
    let text = String::from_utf8(generated.bytes).unwrap();
    assert!(text.contains("<Name>Walls &amp; &lt;roof&gt;</Name>"));
    assert!(text.starts_with("<?xml"));
}

#[test]
fn xer_is_export_only() {
    let err = formats::parse(&ImportFile::new("plan.xer", "<AstaProject/>"), Utc::now()).unwrap_err();
    assert_eq!(err.to_string(), "Unsupported file format: .xer");
}
