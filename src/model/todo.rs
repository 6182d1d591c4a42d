use serde::{Deserialize, Deserializer, Serialize};

/// Project ID sentinel for the default bucket. Stored verbatim; a todo with
/// this project ID is distinct from one with no project ID, but both belong
/// to the Today view.
pub const TODAY_PROJECT: &str = "today";

/// A single task. Subtasks are ordinary todos with a `parent_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    /// Absent or `"today"` means the Today view
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Milliseconds since the epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<i64>,
    /// 1 (highest) through 4 (lowest); not validated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Global sort sequence, assigned at creation
    pub order: i64,
}

impl TodoItem {
    /// True if this todo shows up in the Today view.
    pub fn is_in_today(&self) -> bool {
        match self.project_id.as_deref() {
            None => true,
            Some(pid) => pid.is_empty() || pid == TODAY_PROJECT,
        }
    }

    /// True if this todo is a subtask of some other todo.
    pub fn is_subtask(&self) -> bool {
        self.parent_id.is_some()
    }
}

/// Everything a caller supplies when adding a todo. `id`, `created_at` and
/// `order` are assigned by the repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoDraft {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub project_id: Option<String>,
    pub due_date: Option<i64>,
    pub priority: Option<i64>,
    pub completed_at: Option<i64>,
    pub parent_id: Option<String>,
}

impl TodoDraft {
    pub fn new(title: impl Into<String>) -> Self {
        TodoDraft {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// A partial update. `None` leaves a field alone; for clearable fields
/// `Some(None)` clears it.
///
/// `id`, `created_at` and `order` are accepted so that a full record can be
/// passed back as a patch, but they are never applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TodoPatch {
    pub id: Option<String>,
    pub title: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    #[serde(deserialize_with = "double_option")]
    pub project_id: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub due_date: Option<Option<i64>>,
    #[serde(deserialize_with = "double_option")]
    pub priority: Option<Option<i64>>,
    pub created_at: Option<i64>,
    #[serde(deserialize_with = "double_option")]
    pub completed_at: Option<Option<i64>>,
    #[serde(deserialize_with = "double_option")]
    pub parent_id: Option<Option<String>>,
    pub order: Option<i64>,
}

impl TodoPatch {
    /// Merge this patch into `item`, skipping the protected fields.
    pub fn apply_to(&self, item: &mut TodoItem) {
        if let Some(title) = &self.title {
            item.title = title.clone();
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(completed) = self.completed {
            item.completed = completed;
        }
        if let Some(project_id) = &self.project_id {
            item.project_id = project_id.clone();
        }
        if let Some(due_date) = self.due_date {
            item.due_date = due_date;
        }
        if let Some(priority) = self.priority {
            item.priority = priority;
        }
        if let Some(completed_at) = self.completed_at {
            item.completed_at = completed_at;
        }
        if let Some(parent_id) = &self.parent_id {
            item.parent_id = parent_id.clone();
        }
    }

    /// True if applying this patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.project_id.is_none()
            && self.due_date.is_none()
            && self.priority.is_none()
            && self.completed_at.is_none()
            && self.parent_id.is_none()
    }
}

/// Distinguish an explicit `null` (clear) from a missing key (leave alone).
fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Which subset of todos is being looked at
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum View {
    Today,
    Project(String),
}

impl View {
    /// `"today"` selects the Today view; anything else is a project ID.
    pub fn parse(s: &str) -> View {
        if s == TODAY_PROJECT {
            View::Today
        } else {
            View::Project(s.to_string())
        }
    }

    pub fn project_id(&self) -> Option<&str> {
        match self {
            View::Today => None,
            View::Project(id) => Some(id),
        }
    }

    /// Does `item` belong to this view? Project matching is exact string
    /// equality; a todo pointing at a deleted project still matches it.
    pub fn contains(&self, item: &TodoItem) -> bool {
        match self {
            View::Today => item.is_in_today(),
            View::Project(id) => !id.is_empty() && item.project_id.as_deref() == Some(id.as_str()),
        }
    }
}
