use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

use crate::daily_log::DailyLog;

pub const NO_TASKS_COMPLETED: &str = "No tasks completed";
pub const NO_TASKS_PLANNED: &str = "No tasks planned";
pub const NO_BLOCKERS: &str = "No blockers";

const COMPLETED_HEADING: &str = "### ✅ Tasks Completed Today";
const PLANNED_HEADING: &str = "### 📋 Tasks Planned for Tomorrow";
const BLOCKERS_HEADING: &str = "### 🚧 Blockers";
const REFLECTION_HEADING: &str = "### 💭 Reflection";

const NAME_LABEL: &str = "**Name:**";
const PROJECT_LABEL: &str = "**Project / Sprint:**";
const WENT_WELL_LABEL: &str = "**What went well:**";
const IMPROVE_LABEL: &str = "**What could be improved:**";

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*Name:\*\*[ \t]*(.*)").expect("name pattern"));
static PROJECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*Project / Sprint:\*\*[ \t]*(.*)").expect("project pattern")
});
static COMPLETED_RE: LazyLock<Regex> =
    LazyLock::new(|| section_pattern("Tasks Completed Today"));
static PLANNED_RE: LazyLock<Regex> =
    LazyLock::new(|| section_pattern("Tasks Planned for Tomorrow"));
static BLOCKERS_RE: LazyLock<Regex> = LazyLock::new(|| section_pattern("Blockers"));
static WENT_WELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\*\*What went well:\*\*[ \t]*(.*?)(?:\n[ \t]*\n|\n\*\*|\z)")
        .expect("went well pattern")
});
static IMPROVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*What could be improved:\*\*[ \t]*(.*)").expect("improve pattern")
});

fn section_pattern(title: &str) -> Regex {
    // Heading line through the next heading or end of text.
    Regex::new(&format!(
        r"(?s)###[^\n]*{}[^\n]*\n(.*?)(?:\n###|\z)",
        regex::escape(title)
    ))
    .expect("section pattern")
}

/// Renders the human-readable markdown view of a log.
pub fn render(log: &DailyLog) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Daily Log: {}", log.log_date);
    let _ = writeln!(out, "{NAME_LABEL} {}", log.name);
    let _ = writeln!(out, "{PROJECT_LABEL} {}\n", log.project);

    let _ = writeln!(out, "{COMPLETED_HEADING}");
    push_bullets(&mut out, &log.tasks_completed, NO_TASKS_COMPLETED);

    let _ = writeln!(out, "\n{PLANNED_HEADING}");
    push_bullets(&mut out, &log.tasks_planned, NO_TASKS_PLANNED);

    let _ = writeln!(out, "\n{BLOCKERS_HEADING}");
    push_bullets(&mut out, &log.blockers, NO_BLOCKERS);

    let _ = writeln!(out, "\n{REFLECTION_HEADING}");
    if !log.reflection_well.is_empty() {
        let _ = writeln!(out, "{WENT_WELL_LABEL} {}\n", log.reflection_well);
    }
    if !log.reflection_improve.is_empty() {
        let _ = writeln!(out, "{IMPROVE_LABEL} {}", log.reflection_improve);
    }

    out
}

fn push_bullets(out: &mut String, items: &[String], sentinel: &str) {
    if items.is_empty() {
        let _ = writeln!(out, "* {sentinel}");
        return;
    }
    for item in items {
        let _ = writeln!(out, "* {item}");
    }
}

/// Best-effort reconstruction of a log from its markdown view.
///
/// Missing labels or sections yield empty values. Free text that itself
/// contains section markers will not survive the trip.
pub fn parse(markdown: &str, date: &str) -> DailyLog {
    let text = markdown.replace("\r\n", "\n");
    let mut log = DailyLog::empty(date);

    log.name = capture_line(&NAME_RE, &text);
    log.project = capture_line(&PROJECT_RE, &text);
    log.tasks_completed = capture_list(&COMPLETED_RE, &text, NO_TASKS_COMPLETED);
    log.tasks_planned = capture_list(&PLANNED_RE, &text, NO_TASKS_PLANNED);
    log.blockers = capture_list(&BLOCKERS_RE, &text, NO_BLOCKERS);
    log.reflection_well = capture_line(&WENT_WELL_RE, &text);
    log.reflection_improve = capture_line(&IMPROVE_RE, &text);

    log
}

fn capture_line(pattern: &Regex, text: &str) -> String {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

fn capture_list(pattern: &Regex, text: &str, sentinel: &str) -> Vec<String> {
    let Some(body) = pattern.captures(text).and_then(|caps| caps.get(1)) else {
        return Vec::new();
    };

    body.as_str()
        .lines()
        .map(strip_bullet)
        .filter(|line| !line.is_empty() && *line != sentinel)
        .map(str::to_string)
        .collect()
}

fn strip_bullet(line: &str) -> &str {
    let trimmed = line.trim();
    trimmed
        .strip_prefix("* ")
        .or_else(|| trimmed.strip_prefix("- "))
        .unwrap_or(trimmed)
        .trim()
}
