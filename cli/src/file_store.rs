//! JSON-file key/value store for the CLI's session and profile cache.
//!
//! The file holds one flat JSON object of string values. Every write rewrites
//! the whole file; the CLI is a single short-lived process.

#[cfg(test)]
#[path = "file_store_test.rs"]
mod file_store_test;

use std::path::{Path, PathBuf};

use portal::storage::{KeyValueStore, StorageError};
use serde_json::{Map, Value};

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Map<String, Value> {
        let Ok(raw) = std::fs::read_to_string(&self.path) else {
            return Map::new();
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                tracing::warn!(path = %self.path.display(), "state file is not a JSON object; ignoring it");
                Map::new()
            }
        }
    }

    fn write_all(&self, entries: &Map<String, Value>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Write(e.to_string()))?;
        }
        let raw = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, raw).map_err(|e| StorageError::Write(e.to_string()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.read_all().remove(key)? {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.read_all();
        entries.insert(key.to_owned(), Value::String(value.to_owned()));
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.read_all();
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_all(&entries)
    }
}
