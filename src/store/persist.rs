//! Durable snapshot storage.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::error::{Result, StorageError, StoreError};
use crate::state::StateTree;

/// String key-value storage for persisted snapshots.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> std::result::Result<(), StorageError>;
    fn remove(&self, key: &str) -> std::result::Result<(), StorageError>;
}

/// Storage held in memory.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, StorageError> {
        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> std::result::Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> std::result::Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// File-based storage, one `{key}.json` file per key.
///
/// Writes go to a temporary file first and are renamed into place.
pub struct FileStorage {
    base_dir: PathBuf,
}

impl FileStorage {
    pub fn new(base_dir: impl AsRef<Path>) -> std::result::Result<Self, StorageError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, StorageError> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        tracing::debug!("Loaded snapshot `{}` from {}", key, path.display());
        Ok(Some(contents))
    }

    fn set(&self, key: &str, value: &str) -> std::result::Result<(), StorageError> {
        let path = self.path(key);
        let temp_path = path.with_extension("json.tmp");

        fs::write(&temp_path, value)?;
        fs::rename(&temp_path, &path)?;

        tracing::debug!("Saved snapshot `{}` to {}", key, path.display());
        Ok(())
    }

    fn remove(&self, key: &str) -> std::result::Result<(), StorageError> {
        let path = self.path(key);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

/// Where the startup snapshot comes from.
///
/// Durable storage is consulted first; when it holds nothing (or `null`)
/// the preloaded value seeded by the server renderer is used.
#[derive(Clone, Default)]
pub struct SnapshotSource {
    storage: Option<Arc<dyn Storage>>,
    preloaded: Option<Value>,
}

impl SnapshotSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_preloaded(mut self, preloaded: Value) -> Self {
        self.preloaded = Some(preloaded);
        self
    }

    /// Read the snapshot stored under `key`.
    pub fn load(&self, key: &str) -> Result<Option<Value>> {
        if let Some(storage) = &self.storage {
            if let Some(raw) = storage.get(key)? {
                let value: Value = serde_json::from_str(&raw)
                    .map_err(|e| StoreError::MalformedSnapshot(e.to_string()))?;
                if !value.is_null() {
                    return Ok(Some(value));
                }
            }
        }
        Ok(self.preloaded.clone().filter(|value| !value.is_null()))
    }
}

/// Serialize `tree` into `storage` under `key`.
pub(crate) fn write_snapshot(storage: &dyn Storage, key: &str, tree: &StateTree) -> Result<()> {
    let encoded = tree.to_json().to_string();
    storage.set(key, &encoded)?;
    Ok(())
}
