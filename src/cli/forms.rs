//! Input validation for the add/edit commands, before anything reaches a
//! repository.

use std::sync::LazyLock;

use chrono::{Days, Local, NaiveDate, TimeZone};
use regex::Regex;

use crate::util::unicode::grapheme_count;

/// Longest allowed project name, in user-perceived characters
pub const MAX_PROJECT_NAME: usize = 120;

/// Named project colors offered by `day project add --color`
pub const PALETTE: &[(&str, &str)] = &[
    ("charcoal", "rgb(64, 64, 64)"),
    ("red", "rgb(239, 68, 68)"),
    ("orange", "rgb(249, 115, 22)"),
    ("yellow", "rgb(234, 179, 8)"),
    ("green", "rgb(34, 197, 94)"),
    ("blue", "rgb(59, 130, 246)"),
    ("purple", "rgb(168, 85, 247)"),
    ("pink", "rgb(236, 72, 153)"),
];

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid regex"));

static RGB_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^rgb\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*\)$").expect("valid regex")
});

/// Error type for rejected user input
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FormError {
    #[error("title cannot be empty")]
    EmptyTitle,
    #[error("project name cannot be empty")]
    EmptyName,
    #[error("project name is {0} characters; the limit is {max}", max = MAX_PROJECT_NAME)]
    NameTooLong(usize),
    #[error("unknown color {0:?}: use a palette name, #rrggbb or rgb(r, g, b)")]
    InvalidColor(String),
    #[error("invalid date {0:?}: use YYYY-MM-DD, today or tomorrow")]
    InvalidDate(String),
    #[error("{0} does not exist in the local time zone")]
    NonexistentLocalTime(NaiveDate),
}

/// Trimmed, non-empty task title.
pub fn task_title(input: &str) -> Result<String, FormError> {
    let title = input.trim();
    if title.is_empty() {
        return Err(FormError::EmptyTitle);
    }
    Ok(title.to_string())
}

/// Trimmed description; blank becomes absent.
pub fn description(input: &str) -> Option<String> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Trimmed project name of 1 to [`MAX_PROJECT_NAME`] characters.
pub fn project_name(input: &str) -> Result<String, FormError> {
    let name = input.trim();
    if name.is_empty() {
        return Err(FormError::EmptyName);
    }
    let len = grapheme_count(name);
    if len > MAX_PROJECT_NAME {
        return Err(FormError::NameTooLong(len));
    }
    Ok(name.to_string())
}

/// Resolve a palette name (case-insensitive) or validate a literal color.
pub fn color(input: &str) -> Result<String, FormError> {
    let trimmed = input.trim();
    if let Some((_, value)) = PALETTE
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(trimmed))
    {
        return Ok(value.to_string());
    }
    if HEX_COLOR.is_match(trimmed) {
        return Ok(trimmed.to_lowercase());
    }
    if let Some(caps) = RGB_COLOR.captures(trimmed) {
        let in_range = (1..=3).all(|i| caps[i].parse::<u16>().is_ok_and(|c| c <= 255));
        if in_range {
            return Ok(format!("rgb({}, {}, {})", &caps[1], &caps[2], &caps[3]));
        }
    }
    Err(FormError::InvalidColor(input.to_string()))
}

/// Parse a due date relative to `today`.
pub fn due_date(input: &str, today: NaiveDate) -> Result<NaiveDate, FormError> {
    match input.trim().to_ascii_lowercase().as_str() {
        "today" => Ok(today),
        "tomorrow" => today
            .checked_add_days(Days::new(1))
            .ok_or_else(|| FormError::InvalidDate(input.to_string())),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
            .map_err(|_| FormError::InvalidDate(input.to_string())),
    }
}

/// Local midnight of `date` as milliseconds since the epoch.
pub fn local_midnight_millis(date: NaiveDate) -> Result<i64, FormError> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or(FormError::NonexistentLocalTime(date))?;
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .ok_or(FormError::NonexistentLocalTime(date))
}

/// Parse a due date argument all the way to a stored timestamp.
pub fn due_timestamp(input: &str) -> Result<i64, FormError> {
    local_midnight_millis(due_date(input, Local::now().date_naive())?)
}
