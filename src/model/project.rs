use serde::{Deserialize, Serialize};

/// A user-defined project that todos can be scoped to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Opaque unique ID, e.g. `project-1715700000000-k3j9x0a2b`
    pub id: String,
    /// Display label
    pub name: String,
    /// Accent color, e.g. `rgb(239, 68, 68)`
    pub color: String,
    /// Favorites sort first in project listings
    #[serde(default)]
    pub is_favorite: bool,
    /// Creation time, milliseconds since the epoch
    pub created_at: i64,
}

/// The user-supplied part of a project; the repository fills in the rest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDraft {
    pub name: String,
    pub color: String,
    pub is_favorite: bool,
}
