use std::fmt::{self, Write};

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::model::config::UiConfig;
use crate::model::project::Project;
use crate::model::todo::{TODAY_PROJECT, TodoItem};
use crate::ops::view::{ComposedView, ViewHeader, ViewSummary};
use crate::util::unicode::{display_width, pad_to_width, truncate_to_width};

/// Shown for a view with nothing in it
pub const EMPTY_VIEW_TEXT: &str = "No tasks yet. Add one to get started!";

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ListJson<'a> {
    pub view: &'a ViewHeader,
    pub summary: ViewSummary,
    #[serde(flatten)]
    pub composed: &'a ComposedView,
}

#[derive(Serialize)]
pub struct TodoDetailJson<'a> {
    #[serde(flatten)]
    pub todo: &'a TodoItem,
    pub subtasks: &'a [TodoItem],
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Due date label in `tz`, or `None` if the timestamp or format is invalid.
pub fn due_label<Tz>(millis: i64, tz: &Tz, format: &str) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let local = DateTime::from_timestamp_millis(millis)?.with_timezone(tz);
    let mut out = String::new();
    write!(out, "{}", local.format(format)).ok()?;
    Some(out)
}

/// Timestamp as `YYYY-MM-DD HH:MM` in `tz`.
pub fn timestamp_label<Tz>(millis: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.with_timezone(tz).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| millis.to_string())
}

fn check_char(todo: &TodoItem) -> char {
    if todo.completed { 'x' } else { ' ' }
}

/// One-line summary: `[ ] title · due · P1  (id)`
pub fn format_todo_line<Tz>(todo: &TodoItem, ui: &UiConfig, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut line = format!(
        "[{}] {}",
        check_char(todo),
        truncate_to_width(&todo.title, ui.title_width)
    );
    if let Some(label) = todo
        .due_date
        .and_then(|ms| due_label(ms, tz, &ui.due_format))
    {
        line.push_str(&format!(" · {}", label));
    }
    if let Some(p) = todo.priority {
        line.push_str(&format!(" · P{}", p));
    }
    line.push_str(&format!("  ({})", todo.id));
    line
}

/// The whole view: a header line, then each todo with its subtasks indented.
pub fn format_view<Tz>(
    header: &ViewHeader,
    summary: ViewSummary,
    composed: &ComposedView,
    ui: &UiConfig,
    tz: &Tz,
) -> Vec<String>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut lines = vec![format!(
        "{} · {} open, {} done",
        header.name, summary.open, summary.done
    )];
    if composed.is_empty() {
        lines.push(EMPTY_VIEW_TEXT.to_string());
        return lines;
    }
    for entry in &composed.entries {
        lines.push(format_todo_line(&entry.item, ui, tz));
        for sub in &entry.subtasks {
            lines.push(format!("  {}", format_todo_line(sub, ui, tz)));
        }
    }
    lines
}

/// Where a todo lives, for display.
pub fn project_label(todo: &TodoItem, projects: &[Project]) -> String {
    match todo.project_id.as_deref() {
        None | Some("") | Some(TODAY_PROJECT) => "Today".to_string(),
        Some(pid) => match projects.iter().find(|p| p.id == pid) {
            Some(p) => format!("{} ({})", p.name, p.id),
            None => format!("{} (missing)", pid),
        },
    }
}

/// Detailed view of a single todo.
pub fn format_todo_detail<Tz>(
    todo: &TodoItem,
    subtasks: &[TodoItem],
    projects: &[Project],
    ui: &UiConfig,
    tz: &Tz,
) -> Vec<String>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut lines = vec![format!("[{}] {}", check_char(todo), todo.title)];
    lines.push(format!("id: {}", todo.id));
    lines.push(format!("project: {}", project_label(todo, projects)));
    if let Some(ms) = todo.due_date {
        let label = due_label(ms, tz, &ui.due_format).unwrap_or_else(|| ms.to_string());
        lines.push(format!("due: {}", label));
    }
    if let Some(p) = todo.priority {
        lines.push(format!("priority: P{}", p));
    }
    lines.push(format!("created: {}", timestamp_label(todo.created_at, tz)));
    if let Some(ms) = todo.completed_at {
        lines.push(format!("completed: {}", timestamp_label(ms, tz)));
    }
    if let Some(parent) = &todo.parent_id {
        lines.push(format!("parent: {}", parent));
    }
    if let Some(desc) = &todo.description {
        lines.push("description:".to_string());
        for l in desc.lines() {
            lines.push(format!("  {}", l));
        }
    }
    if !subtasks.is_empty() {
        lines.push("subtasks:".to_string());
        for sub in subtasks {
            lines.push(format!("  {}", format_todo_line(sub, ui, tz)));
        }
    }
    lines
}

/// Project listing, one per line: `★ name  color  (id)`
pub fn format_project_list(projects: &[Project]) -> Vec<String> {
    let name_w = projects
        .iter()
        .map(|p| display_width(&p.name))
        .max()
        .unwrap_or(0);
    projects
        .iter()
        .map(|p| {
            format!(
                "{} {}  {}  ({})",
                if p.is_favorite { '★' } else { ' ' },
                pad_to_width(&p.name, name_w),
                p.color,
                p.id
            )
        })
        .collect()
}
