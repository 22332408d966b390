//! Text rendering of results for the student.

use super::types::{MinorResult, Pending, SectionProgress};
use crate::requirements::CourseCode;
use regex::Regex;
use std::fmt::Write;
use std::sync::LazyLock;

static HYPHEN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*-\s*").unwrap());
static CODE_IN_TEXT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]+)(\d+)$").unwrap());

/// Inserts a space between prefix and number (`CS18000` -> `CS 18000`).
///
/// Free-text items are returned unchanged.
pub fn format_code(item: &str) -> String {
    match CourseCode::from_catalog_item(item) {
        Some(code) => code.spaced(),
        None => CODE_IN_TEXT_REGEX.replace(item, "$1 $2").into_owned(),
    }
}

/// Normalizes spacing around hyphens in a section title.
pub fn clean_title(title: &str) -> String {
    HYPHEN_REGEX.replace_all(title, " - ").trim().to_string()
}

fn join_formatted(items: &[String]) -> String {
    items
        .iter()
        .map(|i| format_code(i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One line describing what a section still needs.
///
/// Returns `None` for satisfied choose sections, which are not listed.
pub fn render_section(section: &SectionProgress) -> Option<String> {
    let title = clean_title(&section.title);
    let line = match &section.pending {
        Pending::Manual => format!("{title}: see catalog (manual, does not block progress)"),
        Pending::Count(0) => format!("{title}: All completed"),
        Pending::Count(n) => format!("{title}: {n} more course(s) at the required level"),
        Pending::Remaining(items) if items.is_empty() => {
            if section.kind == "choose_n" {
                return None;
            }
            format!("{title}: All completed")
        }
        Pending::Remaining(items) if section.kind == "choose_n" => format!(
            "{title} - {} remaining options: {}",
            section.remaining(),
            join_formatted(items)
        ),
        Pending::Remaining(items) => format!("{title}: {}", join_formatted(items)),
    };
    Some(line)
}

/// Multi-line report for one minor.
pub fn render_minor(result: &MinorResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "### {}", result.name);
    let _ = writeln!(out, "Catalog page: {}", result.link);
    if !result.notes.is_empty() {
        let _ = writeln!(out, "Notes:");
        for note in &result.notes {
            let _ = writeln!(out, "- {note}");
        }
    }
    let _ = writeln!(
        out,
        "Progress: {} / {} courses completed ({:.1}%)",
        result.total_completed, result.total_required, result.percent
    );
    if let Some(r) = &result.residency {
        let _ = writeln!(
            out,
            "Residency requirement: At least {}/{} courses at the institution ({}%), up to {} external.",
            r.required_on_institution, r.total, r.percent, r.allowed_external
        );
        if !r.within_allowance {
            let _ = writeln!(
                out,
                "Warning: {} external credits counted, more than the {} allowed.",
                r.external_counted, r.allowed_external
            );
        }
    }
    let taken: Vec<String> = result.taken_codes.iter().map(|c| c.spaced()).collect();
    let _ = writeln!(out, "Courses already taken:");
    for code in taken {
        let _ = writeln!(out, "- {code}");
    }
    let _ = writeln!(out, "Pending requirements:");
    for line in result.sections.iter().filter_map(render_section) {
        let _ = writeln!(out, "- {line}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(kind: &str, required: u32, completed: u32, pending: Pending) -> SectionProgress {
        SectionProgress {
            title: "B.Electives-Choose two".to_string(),
            kind: kind.to_string(),
            required,
            completed,
            counted: true,
            pending,
        }
    }

    #[test]
    fn test_format_code() {
        assert_eq!(format_code("CS18000"), "CS 18000");
        assert_eq!(format_code("Study abroad"), "Study abroad");
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("B.Electives-Choose two"), "B.Electives - Choose two");
    }

    #[test]
    fn test_choose_line() {
        let section = progress(
            "choose_n",
            2,
            1,
            Pending::Remaining(vec!["MA26100".into(), "MA26500".into()]),
        );
        assert_eq!(
            render_section(&section).unwrap(),
            "B.Electives - Choose two - 1 remaining options: MA 26100, MA 26500"
        );
        let done = progress("choose_n", 2, 2, Pending::Remaining(vec![]));
        assert!(render_section(&done).is_none());
    }

    #[test]
    fn test_completed_and_manual_lines() {
        let done = progress("mandatory_all", 2, 2, Pending::Remaining(vec![]));
        assert!(render_section(&done).unwrap().ends_with("All completed"));
        let manual = progress("descriptive", 0, 0, Pending::Manual);
        assert!(render_section(&manual).unwrap().contains("manual"));
    }
}
