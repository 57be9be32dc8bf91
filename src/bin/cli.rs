use chrono::NaiveDate;
use programme_interchange::formats::csv::SAMPLE_PROGRAMME;
use programme_interchange::{
    DateRange, DirectoryDownload, EngineConfig, ExportReport, ExportSettings, FileType,
    ImportFile, ImportReport, InterchangeEngine, StaticDemoMode, Task,
};
use std::fs;
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const TASK_COLUMNS: [&str; 6] = ["id", "name", "start", "finish", "duration", "progress"];

fn render_tasks_as_text_table(tasks: &[Task]) -> String {
    let rows: Vec<[String; 6]> = tasks
        .iter()
        .map(|task| {
            [
                task.id.clone(),
                task.name.clone(),
                task.start_date.clone(),
                task.finish_date.clone(),
                task.duration.to_string(),
                format!("{}%", task.percent_complete),
            ]
        })
        .collect();

    let mut widths: Vec<usize> = TASK_COLUMNS.iter().map(|c| c.len()).collect();
    for row in &rows {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for (ci, name) in TASK_COLUMNS.iter().enumerate() {
        out.push_str(&format!("{:<width$}  ", name, width = widths[ci]));
    }
    out.push('\n');
    for width in &widths {
        out.push_str(&"-".repeat(*width));
        out.push_str("  ");
    }
    out.push('\n');
    for row in &rows {
        for (ci, cell) in row.iter().enumerate() {
            out.push_str(&format!("{:<width$}  ", cell, width = widths[ci]));
        }
        out.push('\n');
    }
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  project <id>                       Switch the active project\n  demo <on|off>                      Toggle demo mode\n  import <path>                      Import a .csv, .json or .mpx programme\n  export <fmt> <start> <end> [--no-<category>]\n                                     Export csv|json|mpx|xer for a YYYY-MM-DD range;\n                                     categories: constraints, baselines, notes,\n                                     resources, calendars\n  tasks                              Show the project's tasks\n  log                                Show the project's activity log\n  quota                              Show demo quota usage\n  sample <path>                      Write the sample programme CSV\n  quit|exit                          Exit"
    );
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn apply_exclusion(settings: &mut ExportSettings, flag: &str) -> bool {
    match flag {
        "--no-constraints" => settings.include_constraints = false,
        "--no-baselines" => settings.include_baselines = false,
        "--no-notes" => settings.include_notes = false,
        "--no-resources" => settings.include_resources = false,
        "--no-calendars" => settings.include_calendars = false,
        _ => return false,
    }
    true
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn build_engine() -> Result<(InterchangeEngine, Arc<StaticDemoMode>), Box<dyn std::error::Error>> {
    let config = EngineConfig::from_env()?;
    let store = config.open_store()?;
    let demo_mode = Arc::new(StaticDemoMode::new(config.demo_mode));
    let download = Arc::new(DirectoryDownload::new(config.download_dir.clone()));
    let engine = InterchangeEngine::new(store, config)
        .with_demo_mode(demo_mode.clone())
        .with_download(download);
    Ok((engine, demo_mode))
}

fn main() {
    init_tracing();
    let (engine, demo_mode) = match build_engine() {
        Ok(parts) => parts,
        Err(e) => {
            eprintln!("Startup error: {}", e);
            std::process::exit(1);
        }
    };
    let mut project = "default".to_string();

    println!("Programme Interchange (CLI) - type 'help' for commands");
    println!(
        "Project: {project}  Demo mode: {}\n",
        if engine.is_demo_mode_active() { "on" } else { "off" }
    );

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "project" => match parts.next() {
                Some(id) => {
                    project = id.to_string();
                    println!("Active project: {project}");
                }
                None => println!("Usage: project <id>"),
            },
            "demo" => match parts.next() {
                Some("on") => {
                    demo_mode.set(true);
                    println!("Demo mode on.");
                }
                Some("off") => {
                    demo_mode.set(false);
                    println!("Demo mode off.");
                }
                _ => println!("Usage: demo <on|off>"),
            },
            "import" => {
                let Some(path) = parts.next() else {
                    println!("Usage: import <path>");
                    continue;
                };
                let file = match ImportFile::from_path(path) {
                    Ok(file) => file,
                    Err(e) => {
                        println!("Import failed: {}", e);
                        continue;
                    }
                };
                let report = ImportReport::from(engine.import_file(&file, &project));
                match (report.success, report.data) {
                    (true, Some(summary)) => println!(
                        "Imported {} tasks ({} total, demo: {}).",
                        summary.tasks_imported, summary.total_tasks, summary.demo
                    ),
                    _ => println!("Import failed: {}", report.errors.join("; ")),
                }
            }
            "export" => {
                let fmt_s = parts.next();
                let start_s = parts.next();
                let end_s = parts.next();
                let (Some(fmt_s), Some(start_s), Some(end_s)) = (fmt_s, start_s, end_s) else {
                    println!("Usage: export <csv|json|mpx|xer> <start> <end> [--no-<category>]");
                    continue;
                };
                let file_type: FileType = match fmt_s.parse() {
                    Ok(ft) => ft,
                    Err(e) => {
                        println!("Error: {}", e);
                        continue;
                    }
                };
                let (Some(start), Some(end)) = (parse_date(start_s), parse_date(end_s)) else {
                    println!("Invalid date (YYYY-MM-DD)");
                    continue;
                };
                let mut settings = ExportSettings::new(file_type, DateRange::new(start, end));
                let unknown: Vec<&str> = parts
                    .filter(|flag| !apply_exclusion(&mut settings, flag))
                    .collect();
                if !unknown.is_empty() {
                    println!("Unknown option(s): {}", unknown.join(" "));
                    continue;
                }
                let result = engine.export_data(&settings, &project);
                let report = ExportReport::from(&result);
                match result {
                    Ok(artifact) => println!(
                        "Exported {} tasks to {} ({} bytes).",
                        artifact.task_count,
                        engine.config().download_dir.join(&artifact.file_name).display(),
                        report.file_size.unwrap_or_default()
                    ),
                    Err(_) => println!("Export failed: {}", report.errors.join("; ")),
                }
            }
            "tasks" => match engine.tasks(&project) {
                Ok(tasks) if tasks.is_empty() => println!("No tasks in project {project}."),
                Ok(tasks) => println!("{}", render_tasks_as_text_table(&tasks)),
                Err(e) => println!("Error: {}", e),
            },
            "log" => match engine.activity(&project) {
                Ok(entries) if entries.is_empty() => println!("Activity log is empty."),
                Ok(entries) => {
                    for entry in entries {
                        match serde_json::to_string(&entry) {
                            Ok(text) => println!("{text}"),
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                }
                Err(e) => println!("Error: {}", e),
            },
            "quota" => match engine.quota_usage(&project) {
                Ok(usage) if usage.demo => println!(
                    "Demo mode: on\nExports today: {} ({} remaining)\nMax import tasks: {}\nMax range days: {}",
                    usage.exports_today,
                    usage.exports_remaining.unwrap_or_default(),
                    usage.max_import_tasks.unwrap_or_default(),
                    usage.max_range_days
                ),
                Ok(usage) => println!(
                    "Demo mode: off\nMax range days: {}",
                    usage.max_range_days
                ),
                Err(e) => println!("Error: {}", e),
            },
            "sample" => match parts.next() {
                Some(path) => match fs::write(path, SAMPLE_PROGRAMME) {
                    Ok(()) => println!("Sample programme written to {path}"),
                    Err(e) => println!("Error writing sample: {}", e),
                },
                None => println!("Usage: sample <path>"),
            },
            other => println!("Unknown command '{other}'. Type 'help' for commands."),
        }
    }
}
