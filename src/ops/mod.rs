pub mod check;
pub mod projects;
pub mod todos;
pub mod view;

use rand::Rng;

use crate::io::codec::StorageWriteError;

/// A repository mutation could not be persisted. The stored collection is
/// unchanged; the caller's view of it may now be ahead of what is durable.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to add project: {0}")]
    AddProject(#[source] StorageWriteError),
    #[error("failed to delete project: {0}")]
    DeleteProject(#[source] StorageWriteError),
    #[error("failed to add todo: {0}")]
    AddTodo(#[source] StorageWriteError),
    #[error("failed to update todo: {0}")]
    UpdateTodo(#[source] StorageWriteError),
    #[error("failed to delete todo: {0}")]
    DeleteTodo(#[source] StorageWriteError),
}

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Current time in milliseconds since the epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// `<prefix>-<millis>-<9 random base36 chars>`
pub fn generate_id(prefix: &str, millis: i64) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("{}-{}-{}", prefix, millis, suffix)
}
