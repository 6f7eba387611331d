use std::{
    collections::BTreeMap,
    path::Path,
    sync::{Mutex, MutexGuard},
};

use thiserror::Error;

use crate::setting::SettingValue;

/// Errors produced by key-value store implementations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Requested key does not exist.
    #[error("entry not found for key: {key}")]
    NotFound { key: String },
    /// Underlying storage failure.
    #[error("storage failure: {reason}")]
    Storage { reason: String },
    /// Backing data exists but cannot be decrypted or parsed.
    #[error("corrupt store: {reason}")]
    Corrupt { reason: String },
}

/// Contract for the persistent store behind a setting helper.
///
/// Writes are durable when they return; there is no separate flush step.
pub trait KeyValueStore: Send + Sync {
    /// Whether the backing file is present.
    fn exists(&self) -> bool;

    /// Path of the backing file, if the store is file-backed.
    fn location(&self) -> Option<&Path>;

    /// Open and verify the backing data.
    fn init(&self) -> Result<(), StoreError>;

    /// All keys currently stored. Empty when nothing has been written yet.
    fn keys(&self) -> Result<Vec<String>, StoreError>;

    fn contains(&self, key: &str) -> Result<bool, StoreError>;

    /// Retrieve the value for a key.
    fn get(&self, key: &str) -> Result<SettingValue, StoreError>;

    /// Persist a value under a key, overwriting any existing entry.
    fn put(&self, key: &str, value: SettingValue) -> Result<(), StoreError>;

    /// Remove a key and its value (idempotent).
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Remove the backing file and everything in it (idempotent).
    fn delete_all(&self) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: BTreeMap<String, SettingValue>,
    persisted: bool,
}

/// In-memory store for tests and smoke runs.
///
/// Mirrors the lifecycle of a file-backed store: it only "exists" once
/// something has been written, and `delete_all` makes it vanish again.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<MemoryState>,
    fail_init: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that reports an existing backing file whose `init` always fails.
    pub fn failing_init() -> Self {
        Self {
            inner: Mutex::new(MemoryState {
                entries: BTreeMap::new(),
                persisted: true,
            }),
            fail_init: true,
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.inner.lock().map_err(|err| StoreError::Storage {
            reason: format!("lock poisoned: {err}"),
        })
    }
}

impl KeyValueStore for InMemoryStore {
    fn exists(&self) -> bool {
        self.state().map(|state| state.persisted).unwrap_or(false)
    }

    fn location(&self) -> Option<&Path> {
        None
    }

    fn init(&self) -> Result<(), StoreError> {
        if self.fail_init {
            return Err(StoreError::Corrupt {
                reason: "simulated init failure".to_string(),
            });
        }
        self.state().map(|_| ())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.state()?.entries.keys().cloned().collect())
    }

    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.state()?.entries.contains_key(key))
    }

    fn get(&self, key: &str) -> Result<SettingValue, StoreError> {
        self.state()?
            .entries
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }

    fn put(&self, key: &str, value: SettingValue) -> Result<(), StoreError> {
        let mut state = self.state()?;
        state.entries.insert(key.to_string(), value);
        state.persisted = true;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.state()?.entries.remove(key);
        Ok(())
    }

    fn delete_all(&self) -> Result<(), StoreError> {
        let mut state = self.state()?;
        state.entries.clear();
        state.persisted = false;
        Ok(())
    }
}
