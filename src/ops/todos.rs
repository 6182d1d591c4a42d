use crate::io::codec::{self, TODOS_KEY};
use crate::io::recovery::{RecoveryCategory, RecoveryEntry, log_recovery};
use crate::io::store::KeyValueStore;
use crate::model::todo::{TODAY_PROJECT, TodoDraft, TodoItem, TodoPatch, View};
use crate::ops::{PersistenceError, generate_id, now_millis};

/// CRUD over the stored todo collection. Every call re-reads the store;
/// view filters are recomputed on each call.
pub struct TodoRepository<'s, S: KeyValueStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: KeyValueStore + ?Sized> TodoRepository<'s, S> {
    pub fn new(store: &'s S) -> Self {
        TodoRepository { store }
    }

    /// The whole collection in insertion order. Unreadable data reads as empty.
    pub fn list(&self) -> Vec<TodoItem> {
        codec::load(self.store, TODOS_KEY)
    }

    /// Todos belonging to `view`, in insertion order.
    pub fn list_for_view(&self, view: &View) -> Vec<TodoItem> {
        self.list()
            .into_iter()
            .filter(|t| view.contains(t))
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<TodoItem> {
        self.list().into_iter().find(|t| t.id == id)
    }

    /// Create a todo. Its `order` is one past the largest order anywhere in
    /// the collection, regardless of project.
    pub fn add(&self, draft: TodoDraft) -> Result<TodoItem, PersistenceError> {
        let mut todos = self.list();
        let max_order = todos.iter().map(|t| t.order).max().unwrap_or(-1);
        let now = now_millis();

        let todo = TodoItem {
            id: generate_id("todo", now),
            title: draft.title,
            description: draft.description,
            completed: draft.completed,
            project_id: draft.project_id,
            due_date: draft.due_date,
            priority: draft.priority,
            created_at: now,
            completed_at: draft.completed_at,
            parent_id: draft.parent_id,
            order: max_order.saturating_add(1),
        };

        todos.push(todo.clone());
        codec::save(self.store, TODOS_KEY, &todos).map_err(PersistenceError::AddTodo)?;

        tracing::debug!(id = %todo.id, order = todo.order, "added todo");
        Ok(todo)
    }

    /// Merge `patch` into the todo with `id`. `id`, `created_at` and `order`
    /// in the patch are ignored. An unknown ID changes nothing.
    pub fn update(&self, id: &str, patch: &TodoPatch) -> Result<(), PersistenceError> {
        let mut todos = self.list();
        let mut matched = false;
        for todo in todos.iter_mut().filter(|t| t.id == id) {
            patch.apply_to(todo);
            matched = true;
        }
        codec::save(self.store, TODOS_KEY, &todos).map_err(PersistenceError::UpdateTodo)?;

        tracing::debug!(id, matched, "updated todo");
        Ok(())
    }

    /// Flip `completed`, stamping or clearing `completed_at`. Returns the
    /// updated todo, or `None` (without writing) if `id` is unknown.
    pub fn toggle(&self, id: &str) -> Result<Option<TodoItem>, PersistenceError> {
        match self.get(id) {
            Some(todo) => self.set_completed(id, !todo.completed),
            None => Ok(None),
        }
    }

    /// Set `completed`, stamping `completed_at` when it becomes true and
    /// clearing it when false. Returns `None` (without writing) if `id` is
    /// unknown.
    pub fn set_completed(
        &self,
        id: &str,
        completed: bool,
    ) -> Result<Option<TodoItem>, PersistenceError> {
        let Some(mut todo) = self.get(id) else {
            return Ok(None);
        };
        let patch = TodoPatch {
            completed: Some(completed),
            completed_at: Some(completed.then(now_millis)),
            ..Default::default()
        };
        self.update(id, &patch)?;
        patch.apply_to(&mut todo);
        Ok(Some(todo))
    }

    /// Remove the todo with `id` and every todo whose parent is `id`.
    /// Children go even if the parent itself is missing. Returns the removed
    /// records.
    pub fn delete(&self, id: &str) -> Result<Vec<TodoItem>, PersistenceError> {
        let (removed, kept): (Vec<TodoItem>, Vec<TodoItem>) = self
            .list()
            .into_iter()
            .partition(|t| t.id == id || t.parent_id.as_deref() == Some(id));
        codec::save(self.store, TODOS_KEY, &kept).map_err(PersistenceError::DeleteTodo)?;

        if !removed.is_empty()
            && let Some(dir) = self.store.recovery_dir()
        {
            let body = serde_json::to_string_pretty(&removed).unwrap_or_default();
            log_recovery(
                dir,
                RecoveryEntry::new(RecoveryCategory::Delete, format!("todo {} deleted", id))
                    .field("Removed", removed.len().to_string())
                    .body(body),
            );
        }

        tracing::debug!(id, removed = removed.len(), "deleted todo");
        Ok(removed)
    }
}

/// Project ID for a todo created while looking at `view`: the explicit
/// choice if there is one, else the viewed project, else `"today"`.
pub fn resolve_project_for_new(explicit: Option<&str>, view: &View) -> String {
    explicit
        .filter(|p| !p.is_empty())
        .or(view.project_id().filter(|p| !p.is_empty()))
        .unwrap_or(TODAY_PROJECT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::recovery::read_recovery_entries;
    use crate::io::store::{FileStore, MemoryStore};
    use tempfile::TempDir;

    fn draft_in(title: &str, project_id: Option<&str>) -> TodoDraft {
        TodoDraft {
            project_id: project_id.map(String::from),
            ..TodoDraft::new(title)
        }
    }

    #[test]
    fn first_todo_gets_order_zero() {
        let store = MemoryStore::new();
        let repo = TodoRepository::new(&store);
        let t = repo.add(TodoDraft::new("Buy milk")).unwrap();
        assert_eq!(t.order, 0);
        assert!(!t.completed);
        assert!(t.id.starts_with("todo-"));
        assert!(t.created_at > 0);
        assert_eq!(repo.list(), vec![t]);
    }

    #[test]
    fn order_is_global_across_projects() {
        let store = MemoryStore::new();
        let repo = TodoRepository::new(&store);
        repo.add(draft_in("a", Some("project-1"))).unwrap();
        repo.add(draft_in("b", Some("project-2"))).unwrap();
        let c = repo.add(draft_in("c", None)).unwrap();
        assert_eq!(c.order, 2);
    }

    #[test]
    fn order_follows_max_not_count() {
        let store = MemoryStore::new();
        store
            .set(
                TODOS_KEY,
                r#"[{"id":"x","title":"x","completed":false,"createdAt":1,"order":41}]"#,
            )
            .unwrap();
        let repo = TodoRepository::new(&store);
        assert_eq!(repo.add(TodoDraft::new("next")).unwrap().order, 42);
    }

    #[test]
    fn order_saturates_at_max() {
        let store = MemoryStore::new();
        store
            .set(
                TODOS_KEY,
                r#"[{"id":"x","title":"x","completed":false,"createdAt":1,"order":9223372036854775807}]"#,
            )
            .unwrap();
        let repo = TodoRepository::new(&store);
        let next = repo.add(TodoDraft::new("next")).unwrap();
        assert_eq!(next.order, i64::MAX);
        assert_eq!(repo.list().len(), 2);
    }

    #[test]
    fn views_filter_by_project() {
        let store = MemoryStore::new();
        let repo = TodoRepository::new(&store);
        let none = repo.add(draft_in("none", None)).unwrap();
        let today = repo.add(draft_in("today", Some("today"))).unwrap();
        let proj = repo.add(draft_in("proj", Some("project-1"))).unwrap();

        assert_eq!(repo.list_for_view(&View::Today), vec![none, today]);
        assert_eq!(
            repo.list_for_view(&View::Project("project-1".into())),
            vec![proj]
        );
        assert!(repo.list_for_view(&View::Project(String::new())).is_empty());
    }

    #[test]
    fn update_merges_and_protects() {
        let store = MemoryStore::new();
        let repo = TodoRepository::new(&store);
        let t = repo.add(TodoDraft::new("Buy milk")).unwrap();
        repo.update(
            &t.id,
            &TodoPatch {
                id: Some("other".into()),
                order: Some(999),
                created_at: Some(1),
                title: Some("Buy oat milk".into()),
                priority: Some(Some(2)),
                ..Default::default()
            },
        )
        .unwrap();

        let after = repo.get(&t.id).unwrap();
        assert_eq!(after.id, t.id);
        assert_eq!(after.order, t.order);
        assert_eq!(after.created_at, t.created_at);
        assert_eq!(after.title, "Buy oat milk");
        assert_eq!(after.priority, Some(2));
        assert!(repo.get("other").is_none());
    }

    #[test]
    fn update_missing_is_noop() {
        let store = MemoryStore::new();
        let repo = TodoRepository::new(&store);
        let t = repo.add(TodoDraft::new("a")).unwrap();
        repo.update(
            "todo-missing",
            &TodoPatch {
                title: Some("x".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(repo.list(), vec![t]);
    }

    #[test]
    fn toggle_sets_and_clears_completed_at() {
        let store = MemoryStore::new();
        let repo = TodoRepository::new(&store);
        let t = repo.add(TodoDraft::new("a")).unwrap();

        let done = repo.toggle(&t.id).unwrap().unwrap();
        assert!(done.completed);
        assert!(done.completed_at.is_some());
        assert_eq!(repo.get(&t.id).unwrap(), done);

        let undone = repo.toggle(&t.id).unwrap().unwrap();
        assert!(!undone.completed);
        assert_eq!(undone.completed_at, None);
        assert_eq!(repo.get(&t.id).unwrap().completed_at, None);

        assert!(repo.toggle("todo-missing").unwrap().is_none());
    }

    #[test]
    fn delete_cascades_one_level() {
        let store = MemoryStore::new();
        let repo = TodoRepository::new(&store);
        let parent = repo.add(TodoDraft::new("parent")).unwrap();
        let child = repo
            .add(TodoDraft {
                parent_id: Some(parent.id.clone()),
                ..TodoDraft::new("child")
            })
            .unwrap();
        let grandchild = repo
            .add(TodoDraft {
                parent_id: Some(child.id.clone()),
                ..TodoDraft::new("grandchild")
            })
            .unwrap();
        let other = repo.add(TodoDraft::new("other")).unwrap();

        let removed = repo.delete(&parent.id).unwrap();
        assert_eq!(removed, vec![parent, child]);
        // The grandchild keeps its (now dangling) parent link
        assert_eq!(repo.list(), vec![grandchild, other]);
    }

    #[test]
    fn delete_removes_children_of_missing_parent() {
        let store = MemoryStore::new();
        let repo = TodoRepository::new(&store);
        repo.add(TodoDraft {
            parent_id: Some("todo-ghost".into()),
            ..TodoDraft::new("orphan")
        })
        .unwrap();
        let keep = repo.add(TodoDraft::new("keep")).unwrap();
        assert_eq!(repo.delete("todo-ghost").unwrap().len(), 1);
        assert_eq!(repo.list(), vec![keep]);
    }

    #[test]
    fn delete_logs_removed_records() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let repo = TodoRepository::new(&store);
        let t = repo.add(TodoDraft::new("Water plants")).unwrap();
        repo.delete(&t.id).unwrap();

        let entries = read_recovery_entries(dir.path(), None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, RecoveryCategory::Delete);
        assert!(entries[0].body.contains("Water plants"));
    }

    #[test]
    fn failed_writes_surface() {
        let store = MemoryStore::new();
        let repo = TodoRepository::new(&store);
        let t = repo.add(TodoDraft::new("a")).unwrap();

        let full = MemoryStore::with_quota(store.used_bytes());
        full.set(TODOS_KEY, &store.get(TODOS_KEY).unwrap().unwrap())
            .unwrap();
        let repo = TodoRepository::new(&full);

        assert!(matches!(
            repo.add(TodoDraft::new("b")),
            Err(PersistenceError::AddTodo(_))
        ));
        assert!(matches!(
            repo.update(
                &t.id,
                &TodoPatch {
                    title: Some("a longer title than before".into()),
                    ..Default::default()
                }
            ),
            Err(PersistenceError::UpdateTodo(_))
        ));
        // Reads still work and show the last durable state
        assert_eq!(repo.list(), vec![t]);
    }

    #[test]
    fn new_todo_project_resolution() {
        let project = View::Project("project-1".into());
        assert_eq!(resolve_project_for_new(Some("project-2"), &project), "project-2");
        assert_eq!(resolve_project_for_new(None, &project), "project-1");
        assert_eq!(resolve_project_for_new(None, &View::Today), "today");
        assert_eq!(resolve_project_for_new(Some(""), &View::Today), "today");
        assert_eq!(resolve_project_for_new(Some(""), &project), "project-1");
    }
}
