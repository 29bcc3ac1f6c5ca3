//! Key-value persistence for views and settings.

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{BoardError, Result};

/// Minimal JSON key-value store.
///
/// Implementations must be safe to share between threads. Keys are plain
/// strings; `keys(prefix)` returns matching keys in ascending order.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;

    fn put(&self, key: &str, value: Value) -> Result<()>;

    /// Removes a key. Returns whether it existed.
    fn delete(&self, key: &str) -> Result<bool>;

    fn keys(&self, prefix: &str) -> Result<Vec<String>>;
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: Value) -> Result<()> {
        self.entries.write().insert(key.to_owned(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.write().remove(key).is_some())
    }

    fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .entries
            .read()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// Store backed by a single JSON file.
///
/// Every write rewrites the file through a temporary sibling and a rename.
/// A missing file reads as an empty store, and so does a file that is not
/// a JSON object; the next write replaces it.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, Value>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(storage_error(&self.path, e)),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        match serde_json::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable settings file, starting empty");
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, Value>) -> Result<()> {
        let content =
            serde_json::to_string_pretty(entries).map_err(|e| storage_error(&self.path, e))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, content).map_err(|e| storage_error(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| storage_error(&self.path, e))
    }
}

fn storage_error(path: &Path, e: impl std::fmt::Display) -> BoardError {
    BoardError::Storage(format!("{}: {e}", path.display()))
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(key))
    }

    fn put(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.lock.lock();
        let mut entries = self.read_all()?;
        entries.insert(key.to_owned(), value);
        self.write_all(&entries)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let _guard = self.lock.lock();
        let mut entries = self.read_all()?;
        let existed = entries.remove(key).is_some();
        if existed {
            self.write_all(&entries)?;
        }
        Ok(existed)
    }

    fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let _guard = self.lock.lock();
        Ok(self
            .read_all()?
            .into_keys()
            .filter(|k| k.starts_with(prefix))
            .collect())
    }
}
