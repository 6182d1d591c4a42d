use std::collections::HashSet;

use serde::Serialize;

use crate::io::codec::{self, PROJECTS_KEY, TODOS_KEY};
use crate::io::store::KeyValueStore;
use crate::model::project::Project;
use crate::model::todo::{TODAY_PROJECT, TodoItem};

/// Structured result from `day check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub errors: Vec<CheckError>,
    pub warnings: Vec<CheckWarning>,
}

/// Something that breaks the store's invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckError {
    /// A collection could not be read or decoded; the app sees it as empty
    #[serde(rename = "unreadable")]
    Unreadable { key: String, message: String },
    /// Two records in one collection share an ID
    #[serde(rename = "duplicate_id")]
    DuplicateId { key: String, id: String },
}

/// Allowed by the data model but probably not intended. Never repaired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckWarning {
    /// `projectId` names a project that does not exist
    #[serde(rename = "dangling_project")]
    DanglingProject { todo_id: String, project_id: String },
    /// `parentId` names a todo that does not exist
    #[serde(rename = "dangling_parent")]
    DanglingParent { todo_id: String, parent_id: String },
    /// `priority` outside 1..=4
    #[serde(rename = "priority_out_of_range")]
    PriorityOutOfRange { todo_id: String, priority: i64 },
    /// `completed` and `completedAt` disagree
    #[serde(rename = "completion_mismatch")]
    CompletionMismatch { todo_id: String, completed: bool },
}

/// Validate both stored collections. Read-only.
///
/// Checks performed:
/// 1. Both documents decode
/// 2. IDs are unique per collection
/// 3. `projectId` and `parentId` references resolve
/// 4. Priorities are within 1..=4
/// 5. `completedAt` is present exactly when `completed` is set
pub fn check_store<S: KeyValueStore + ?Sized>(store: &S) -> CheckResult {
    let mut result = CheckResult::default();

    let projects: Vec<Project> = match codec::try_load(store, PROJECTS_KEY) {
        Ok(p) => p,
        Err(e) => {
            result.errors.push(CheckError::Unreadable {
                key: PROJECTS_KEY.to_string(),
                message: e.to_string(),
            });
            Vec::new()
        }
    };
    let todos: Vec<TodoItem> = match codec::try_load(store, TODOS_KEY) {
        Ok(t) => t,
        Err(e) => {
            result.errors.push(CheckError::Unreadable {
                key: TODOS_KEY.to_string(),
                message: e.to_string(),
            });
            Vec::new()
        }
    };

    check_duplicates(PROJECTS_KEY, projects.iter().map(|p| p.id.as_str()), &mut result);
    check_duplicates(TODOS_KEY, todos.iter().map(|t| t.id.as_str()), &mut result);

    let project_ids: HashSet<&str> = projects.iter().map(|p| p.id.as_str()).collect();
    let todo_ids: HashSet<&str> = todos.iter().map(|t| t.id.as_str()).collect();

    for todo in &todos {
        if let Some(pid) = todo.project_id.as_deref()
            && !pid.is_empty()
            && pid != TODAY_PROJECT
            && !project_ids.contains(pid)
        {
            result.warnings.push(CheckWarning::DanglingProject {
                todo_id: todo.id.clone(),
                project_id: pid.to_string(),
            });
        }
        if let Some(parent) = todo.parent_id.as_deref()
            && !todo_ids.contains(parent)
        {
            result.warnings.push(CheckWarning::DanglingParent {
                todo_id: todo.id.clone(),
                parent_id: parent.to_string(),
            });
        }
        if let Some(p) = todo.priority
            && !(1..=4).contains(&p)
        {
            result.warnings.push(CheckWarning::PriorityOutOfRange {
                todo_id: todo.id.clone(),
                priority: p,
            });
        }
        if todo.completed != todo.completed_at.is_some() {
            result.warnings.push(CheckWarning::CompletionMismatch {
                todo_id: todo.id.clone(),
                completed: todo.completed,
            });
        }
    }

    result.valid = result.errors.is_empty();
    result
}

fn check_duplicates<'a>(
    key: &str,
    ids: impl Iterator<Item = &'a str>,
    result: &mut CheckResult,
) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for id in ids {
        if !seen.insert(id) && reported.insert(id) {
            result.errors.push(CheckError::DuplicateId {
                key: key.to_string(),
                id: id.to_string(),
            });
        }
    }
}
