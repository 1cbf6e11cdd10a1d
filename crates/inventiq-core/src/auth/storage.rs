//! Durable key/value storage shared by the session store and the API client.
//!
//! Session state lives under two keys: `token` holds the raw credential and
//! `user` holds the JSON-serialized identity. Multi-key writes and removals
//! are single operations so that both keys always change together.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tracing::warn;

/// Key holding the raw bearer credential
pub const TOKEN_KEY: &str = "token";

/// Key holding the JSON-serialized `User`
pub const USER_KEY: &str = "user";

/// Storage file name in the data directory
const STORAGE_FILE: &str = "storage.json";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write every entry in one operation.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()>;

    /// Remove every key in one operation. Missing keys are not an error.
    fn remove_many(&self, keys: &[&str]) -> Result<()>;

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value)])
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.remove_many(&[key])
    }
}

/// A JSON object on disk, re-read on every access so that changes made by
/// other processes (or by deleting the file) are picked up.
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Storage at `<dir>/storage.json`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(STORAGE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read storage file {}", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).context("Failed to parse storage file")
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write storage file {}", self.path.display()))?;
        Ok(())
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock();
        Ok(self.load()?.remove(key))
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let _guard = self.lock.lock();
        let mut stored = self.load().unwrap_or_else(|e| {
            warn!(error = %e, path = %self.path.display(), "Discarding unreadable storage file");
            BTreeMap::new()
        });
        for (key, value) in entries {
            stored.insert(key.to_string(), value.to_string());
        }
        self.save(&stored)
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let _guard = self.lock.lock();
        // A corrupt file is discarded rather than blocking removal
        let mut stored = self.load().unwrap_or_default();
        let before = stored.len();
        for key in keys {
            stored.remove(*key);
        }
        if stored.len() == before && !self.path.exists() {
            return Ok(());
        }
        self.save(&stored)
    }
}

/// In-process storage for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut stored = self.entries.lock();
        for (key, value) in entries {
            stored.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let mut stored = self.entries.lock();
        for key in keys {
            stored.remove(*key);
        }
        Ok(())
    }
}
