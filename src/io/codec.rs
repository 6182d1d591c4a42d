//! JSON documents in a key-value store: one array of records per key.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::io::recovery::{RecoveryCategory, RecoveryEntry, log_recovery};
use crate::io::store::{KeyValueStore, StoreError};

/// Store key holding the project collection
pub const PROJECTS_KEY: &str = "todo-projects";
/// Store key holding the todo collection
pub const TODOS_KEY: &str = "todo-items";

/// A stored document could not be turned back into records
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("could not read {key}: {source}")]
    Read { key: String, source: StoreError },
    #[error("could not decode {key}: {source}")]
    Malformed {
        key: String,
        source: serde_json::Error,
    },
}

/// A collection could not be persisted. Nothing was written.
#[derive(Debug, thiserror::Error)]
pub enum StorageWriteError {
    #[error("could not encode {key}: {source}")]
    Encode {
        key: String,
        source: serde_json::Error,
    },
    #[error("store rejected write to {key}: {source}")]
    Rejected { key: String, source: StoreError },
}

/// Load the records under `key`, failing on unreadable or malformed data.
/// An absent key is an empty collection.
pub fn try_load<T, S>(store: &S, key: &str) -> Result<Vec<T>, DecodeError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let raw = store.get(key).map_err(|e| DecodeError::Read {
        key: key.to_string(),
        source: e,
    })?;
    match raw {
        None => Ok(Vec::new()),
        Some(text) => serde_json::from_str(&text).map_err(|e| DecodeError::Malformed {
            key: key.to_string(),
            source: e,
        }),
    }
}

/// Load the records under `key`. Any failure yields an empty collection;
/// the error is reported through tracing and, for on-disk stores, the
/// undecodable document is copied into the recovery log.
pub fn load<T, S>(store: &S, key: &str) -> Vec<T>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match try_load(store, key) {
        Ok(records) => records,
        Err(err) => {
            tracing::warn!(key, error = %err, "treating unreadable collection as empty");
            if let Some(dir) = store.recovery_dir() {
                let raw = store.raw(key).unwrap_or_default();
                log_recovery(
                    dir,
                    RecoveryEntry::new(RecoveryCategory::Decode, err.to_string())
                        .field("Key", key)
                        .body(raw),
                );
            }
            Vec::new()
        }
    }
}

/// Serialize `records` and write them under `key` in one step.
pub fn save<T, S>(store: &S, key: &str, records: &[T]) -> Result<(), StorageWriteError>
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    let text = serde_json::to_string(records).map_err(|e| StorageWriteError::Encode {
        key: key.to_string(),
        source: e,
    })?;

    if let Err(e) = store.set(key, &text) {
        tracing::error!(key, error = %e, "could not save collection");
        if let Some(dir) = store.recovery_dir() {
            log_recovery(
                dir,
                RecoveryEntry::new(RecoveryCategory::Write, format!("could not save {}", key))
                    .field("Key", key)
                    .field("Error", e.to_string())
                    .body(text),
            );
        }
        return Err(StorageWriteError::Rejected {
            key: key.to_string(),
            source: e,
        });
    }

    tracing::debug!(key, records = records.len(), "saved collection");
    Ok(())
}
