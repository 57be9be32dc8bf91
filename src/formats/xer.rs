//! XML-flavoured "XER" export.
//!
//! This is not Primavera's tab-delimited XER grammar. Tools that need real XER
//! interoperability will not read it; it exists for clients that key on the extension.

use super::{ExportPayload, format_number};
use std::fmt::Write;

pub(super) fn generate(payload: &ExportPayload) -> Vec<u8> {
    let project = &payload.project;
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<AstaProject>\n");
    out.push_str("  <ProjectInfo>\n");
    element(&mut out, 4, "Name", &project.name);
    element(&mut out, 4, "StartDate", &project.start_date);
    element(&mut out, 4, "EndDate", &project.end_date);
    element(&mut out, 4, "GeneratedBy", &project.generated_by);
    element(&mut out, 4, "GeneratedAt", &project.generated_at.to_rfc3339());
    element(&mut out, 4, "Demo", if project.demo { "true" } else { "false" });
    out.push_str("  </ProjectInfo>\n");
    out.push_str("  <Tasks>\n");
    for task in &payload.tasks {
        out.push_str("    <Task>\n");
        element(&mut out, 6, "ID", &task.id);
        element(&mut out, 6, "Name", &task.name);
        element(&mut out, 6, "StartDate", &task.start_date);
        element(&mut out, 6, "FinishDate", &task.finish_date);
        element(&mut out, 6, "Duration", &task.duration.to_string());
        element(&mut out, 6, "PercentComplete", &format_number(task.percent_complete));
        element(&mut out, 6, "IsMilestone", if task.is_milestone { "true" } else { "false" });
        out.push_str("    </Task>\n");
    }
    out.push_str("  </Tasks>\n");
    out.push_str("</AstaProject>\n");
    out.into_bytes()
}

fn element(out: &mut String, indent: usize, tag: &str, text: &str) {
    // writing into a String cannot fail
    let _ = writeln!(out, "{:indent$}<{tag}>{}</{tag}>", "", escape(text));
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(escape("Piling & <temp> works"), "Piling &amp; &lt;temp&gt; works");
        assert_eq!(escape("O'Neil \"A\""), "O&apos;Neil &quot;A&quot;");
    }

    #[test]
    fn element_is_indented() {
        let mut out = String::new();
        element(&mut out, 4, "Name", "Depot");
        assert_eq!(out, "    <Name>Depot</Name>\n");
    }
}
