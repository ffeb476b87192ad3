//! Key/value storage backends
//!
//! The document store persists whole JSON arrays under fixed keys. A
//! backend only needs to read and replace the value of a key; there is no
//! partial update and no indexing.

use crate::error::{Error, Result};
use log::debug;
#[cfg(test)]
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Whole-value key/value storage.
pub trait StorageBackend: Send {
    /// Read the value stored under `key`, `None` if it was never written.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// File Backend
// ─────────────────────────────────────────────────────────────────────────────

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        if !path.exists() {
            debug!("Storage key '{}' not present at {}", key, path.display());
            return Ok(None);
        }

        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| Error::StorageRead {
                key: key.to_string(),
                source: Box::new(e),
            })
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        let storage_err = |e: std::io::Error| Error::StorageWrite {
            key: key.to_string(),
            source: Box::new(e),
        };

        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(storage_err)?;
        }

        // Write to a sibling file, then swap it in
        let path = self.key_path(key);
        let tmp_path = path.with_extension("json.bak");
        fs::write(&tmp_path, value).map_err(storage_err)?;
        fs::rename(&tmp_path, &path).map_err(storage_err)?;

        debug!("Wrote storage key '{}' ({} bytes)", key, value.len());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Backend
// ─────────────────────────────────────────────────────────────────────────────

/// Volatile backend for tests.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
}

#[cfg(test)]
impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a key.
    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }
}

#[cfg(test)]
impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
