use crate::io::codec::{self, PROJECTS_KEY};
use crate::io::store::KeyValueStore;
use crate::model::project::{Project, ProjectDraft};
use crate::ops::{PersistenceError, generate_id, now_millis};

/// CRUD over the stored project collection. Every call re-reads the store.
pub struct ProjectRepository<'s, S: KeyValueStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: KeyValueStore + ?Sized> ProjectRepository<'s, S> {
    pub fn new(store: &'s S) -> Self {
        ProjectRepository { store }
    }

    /// All projects in insertion order. Unreadable data reads as empty.
    pub fn list(&self) -> Vec<Project> {
        codec::load(self.store, PROJECTS_KEY)
    }

    /// Projects for display: favorites first, otherwise insertion order.
    pub fn list_for_display(&self) -> Vec<Project> {
        let mut projects = self.list();
        projects.sort_by_key(|p| !p.is_favorite);
        projects
    }

    pub fn find(&self, id: &str) -> Option<Project> {
        self.list().into_iter().find(|p| p.id == id)
    }

    /// Create a project. The record is returned only once it is persisted.
    pub fn add(&self, draft: ProjectDraft) -> Result<Project, PersistenceError> {
        let now = now_millis();
        let project = Project {
            id: generate_id("project", now),
            name: draft.name,
            color: draft.color,
            is_favorite: draft.is_favorite,
            created_at: now,
        };

        let mut projects = self.list();
        projects.push(project.clone());
        codec::save(self.store, PROJECTS_KEY, &projects).map_err(PersistenceError::AddProject)?;

        tracing::debug!(id = %project.id, name = %project.name, "added project");
        Ok(project)
    }

    /// Remove a project. Missing IDs are a no-op; todos that reference the
    /// project are left as they are.
    pub fn delete(&self, id: &str) -> Result<(), PersistenceError> {
        let mut projects = self.list();
        let before = projects.len();
        projects.retain(|p| p.id != id);
        codec::save(self.store, PROJECTS_KEY, &projects)
            .map_err(PersistenceError::DeleteProject)?;

        tracing::debug!(id, removed = before - projects.len(), "deleted project");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::store::MemoryStore;

    fn draft(name: &str, is_favorite: bool) -> ProjectDraft {
        ProjectDraft {
            name: name.to_string(),
            color: "rgb(59, 130, 246)".to_string(),
            is_favorite,
        }
    }

    #[test]
    fn add_assigns_id_and_timestamp() {
        let store = MemoryStore::new();
        let repo = ProjectRepository::new(&store);
        let p = repo.add(draft("Garden", true)).unwrap();
        assert!(p.id.starts_with("project-"));
        assert!(p.created_at > 0);
        assert_eq!(repo.list(), vec![p]);
    }

    #[test]
    fn list_keeps_insertion_order() {
        let store = MemoryStore::new();
        let repo = ProjectRepository::new(&store);
        let a = repo.add(draft("A", false)).unwrap();
        let b = repo.add(draft("B", true)).unwrap();
        let c = repo.add(draft("C", false)).unwrap();
        let names: Vec<_> = repo.list().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["A", "B", "C"]);

        let display: Vec<_> = repo.list_for_display().into_iter().map(|p| p.id).collect();
        assert_eq!(display, vec![b.id, a.id, c.id]);
    }

    #[test]
    fn delete_removes_only_match() {
        let store = MemoryStore::new();
        let repo = ProjectRepository::new(&store);
        let a = repo.add(draft("A", false)).unwrap();
        let b = repo.add(draft("B", false)).unwrap();
        repo.delete(&a.id).unwrap();
        assert_eq!(repo.list(), vec![b.clone()]);
        assert!(repo.find(&a.id).is_none());
        assert_eq!(repo.find(&b.id), Some(b));
    }

    #[test]
    fn delete_missing_is_noop() {
        let store = MemoryStore::new();
        let repo = ProjectRepository::new(&store);
        let a = repo.add(draft("A", false)).unwrap();
        repo.delete("project-nope").unwrap();
        assert_eq!(repo.list(), vec![a]);
    }

    #[test]
    fn failed_add_returns_error_and_stores_nothing() {
        let store = MemoryStore::with_quota(16);
        let repo = ProjectRepository::new(&store);
        let err = repo.add(draft("Garden", true)).unwrap_err();
        assert!(matches!(err, PersistenceError::AddProject(_)));
        assert!(err.to_string().starts_with("failed to add project"));
        assert!(repo.list().is_empty());
    }
}
