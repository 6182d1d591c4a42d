use serde::{Deserialize, Serialize};

/// Configuration from config.toml in the store directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub projects: ProjectsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Accent shown in the Today header and for projects that no longer exist
    #[serde(default = "default_today_accent")]
    pub today_accent: String,
    /// chrono format string for due date labels
    #[serde(default = "default_due_format")]
    pub due_format: String,
    /// Leave completed todos out of `day list` (unless `--all`)
    #[serde(default)]
    pub hide_completed: bool,
    /// Titles wider than this many terminal cells are truncated
    #[serde(default = "default_title_width")]
    pub title_width: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            today_accent: default_today_accent(),
            due_format: default_due_format(),
            hide_completed: false,
            title_width: default_title_width(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectsConfig {
    /// Palette name or literal color for `day project add` without `--color`
    #[serde(default = "default_project_color")]
    pub default_color: String,
}

impl Default for ProjectsConfig {
    fn default() -> Self {
        ProjectsConfig {
            default_color: default_project_color(),
        }
    }
}

fn default_today_accent() -> String {
    "#ffffff".to_string()
}

fn default_due_format() -> String {
    "%b %-d".to_string()
}

fn default_title_width() -> usize {
    60
}

fn default_project_color() -> String {
    "charcoal".to_string()
}
