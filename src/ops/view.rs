use indexmap::IndexMap;
use serde::Serialize;

use crate::model::project::Project;
use crate::model::todo::{TodoItem, View};

/// A top-level todo with its direct subtasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewEntry {
    #[serde(flatten)]
    pub item: TodoItem,
    pub subtasks: Vec<TodoItem>,
}

/// The list as displayed: sorted top-level todos, each with its subtasks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComposedView {
    pub entries: Vec<ViewEntry>,
}

impl ComposedView {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop completed todos (and completed subtasks of open ones).
    pub fn without_completed(mut self) -> Self {
        self.entries.retain(|e| !e.item.completed);
        for entry in &mut self.entries {
            entry.subtasks.retain(|s| !s.completed);
        }
        self
    }
}

/// Open and completed counts over a view's todos, subtasks included
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ViewSummary {
    pub open: usize,
    pub done: usize,
}

/// Display name and accent color for the active view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewHeader {
    pub name: String,
    pub accent: String,
}

/// Incomplete before completed, then ascending `order`. Stable.
pub fn sort_for_display(items: &mut [TodoItem]) {
    items.sort_by_key(|t| (t.completed, t.order));
}

/// Build the displayed list from a view's todos.
///
/// Subtasks are attached to their direct parent in display order. Subtasks
/// whose parent is not in `items` are not shown, and a subtask's own
/// subtasks are not nested any further.
pub fn compose(mut items: Vec<TodoItem>) -> ComposedView {
    sort_for_display(&mut items);

    let (top_level, subtasks): (Vec<TodoItem>, Vec<TodoItem>) =
        items.into_iter().partition(|t| !t.is_subtask());

    let mut children: IndexMap<String, Vec<TodoItem>> = IndexMap::new();
    for sub in subtasks {
        if let Some(parent) = sub.parent_id.clone() {
            children.entry(parent).or_default().push(sub);
        }
    }

    let entries = top_level
        .into_iter()
        .map(|item| {
            let subtasks = children.shift_remove(&item.id).unwrap_or_default();
            ViewEntry { item, subtasks }
        })
        .collect();

    ComposedView { entries }
}

pub fn summarize(items: &[TodoItem]) -> ViewSummary {
    let done = items.iter().filter(|t| t.completed).count();
    ViewSummary {
        open: items.len() - done,
        done,
    }
}

/// Header for `view`. A project that no longer exists shows as "Project"
/// with the default accent.
pub fn header(view: &View, projects: &[Project], default_accent: &str) -> ViewHeader {
    let fallback = |name: &str| ViewHeader {
        name: name.to_string(),
        accent: default_accent.to_string(),
    };
    match view {
        View::Today => fallback("Today"),
        View::Project(id) => projects
            .iter()
            .find(|p| &p.id == id)
            .map(|p| ViewHeader {
                name: p.name.clone(),
                accent: p.color.clone(),
            })
            .unwrap_or_else(|| fallback("Project")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn todo(id: &str, order: i64, completed: bool, parent: Option<&str>) -> TodoItem {
        TodoItem {
            id: id.to_string(),
            title: id.to_string(),
            description: None,
            completed,
            project_id: None,
            due_date: None,
            priority: None,
            created_at: 0,
            completed_at: None,
            parent_id: parent.map(String::from),
            order,
        }
    }

    fn ids(items: &[TodoItem]) -> Vec<&str> {
        items.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn incomplete_before_completed() {
        let view = compose(vec![todo("a", 0, true, None), todo("b", 1, false, None)]);
        let top: Vec<_> = view.entries.iter().map(|e| e.item.id.as_str()).collect();
        assert_eq!(top, vec!["b", "a"]);
    }

    #[test]
    fn order_breaks_ties() {
        let view = compose(vec![
            todo("c", 5, false, None),
            todo("a", 1, false, None),
            todo("d", 3, true, None),
            todo("b", 2, true, None),
        ]);
        let top: Vec<_> = view.entries.iter().map(|e| e.item.id.as_str()).collect();
        assert_eq!(top, vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn subtasks_group_under_parent_in_sorted_order() {
        let view = compose(vec![
            todo("p", 0, false, None),
            todo("s1", 1, true, Some("p")),
            todo("s2", 2, false, Some("p")),
            todo("q", 3, false, None),
            todo("s3", 4, false, Some("q")),
        ]);
        assert_eq!(view.entries.len(), 2);
        assert_eq!(view.entries[0].item.id, "p");
        assert_eq!(ids(&view.entries[0].subtasks), vec!["s2", "s1"]);
        assert_eq!(ids(&view.entries[1].subtasks), vec!["s3"]);
    }

    #[test]
    fn nested_and_orphaned_subtasks_are_not_shown() {
        let view = compose(vec![
            todo("p", 0, false, None),
            todo("s", 1, false, Some("p")),
            todo("ss", 2, false, Some("s")),
            todo("orphan", 3, false, Some("gone")),
        ]);
        assert_eq!(view.entries.len(), 1);
        assert_eq!(ids(&view.entries[0].subtasks), vec!["s"]);
    }

    #[test]
    fn without_completed_filters_both_levels() {
        let view = compose(vec![
            todo("p", 0, false, None),
            todo("s", 1, true, Some("p")),
            todo("done", 2, true, None),
        ])
        .without_completed();
        assert_eq!(view.entries.len(), 1);
        assert!(view.entries[0].subtasks.is_empty());
    }

    #[test]
    fn summary_counts() {
        let items = vec![
            todo("a", 0, false, None),
            todo("b", 1, true, None),
            todo("c", 2, false, Some("a")),
        ];
        assert_eq!(summarize(&items), ViewSummary { open: 2, done: 1 });
    }

    #[test]
    fn header_for_views() {
        let projects = vec![Project {
            id: "project-1".into(),
            name: "Garden".into(),
            color: "rgb(34, 197, 94)".into(),
            is_favorite: false,
            created_at: 0,
        }];
        assert_eq!(
            header(&View::Today, &projects, "#ffffff"),
            ViewHeader {
                name: "Today".into(),
                accent: "#ffffff".into()
            }
        );
        assert_eq!(
            header(&View::Project("project-1".into()), &projects, "#ffffff"),
            ViewHeader {
                name: "Garden".into(),
                accent: "rgb(34, 197, 94)".into()
            }
        );
        assert_eq!(
            header(&View::Project("project-9".into()), &projects, "#ffffff").name,
            "Project"
        );
    }

    #[test]
    fn composed_view_json_flattens_items() {
        let view = compose(vec![todo("p", 0, false, None), todo("s", 1, false, Some("p"))]);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["entries"][0]["id"], "p");
        assert_eq!(json["entries"][0]["subtasks"][0]["parentId"], "p");
    }
}
