//! JSON-file backed session storage.
//!
//! DESIGN
//! ======
//! The whole map is rewritten on every change through a temp file + rename,
//! so a pair written by `multi_set` lands together or not at all. A missing
//! file reads as empty.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use gobarber::StorageError;
use gobarber::storage::KeyValueStore;

type Entries = BTreeMap<String, String>;

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Entries, StorageError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(self.unavailable(e)),
        };
        if text.trim().is_empty() {
            return Ok(Entries::new());
        }
        serde_json::from_str(&text).map_err(|e| self.unavailable(e))
    }

    fn save(&self, entries: &Entries, keys: &[&str]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.write_error(keys, e))?;
        }
        let json = serde_json::to_string_pretty(entries).map_err(|e| self.write_error(keys, e))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| self.write_error(keys, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.write_error(keys, e))
    }

    fn update(&self, keys: &[&str], apply: impl FnOnce(&mut Entries) -> bool) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load()?;
        if apply(&mut entries) {
            self.save(&entries, keys)?;
        }
        Ok(())
    }

    fn write_error(&self, keys: &[&str], e: impl std::fmt::Display) -> StorageError {
        StorageError::Write { key: keys.join(","), message: format!("{}: {e}", self.path.display()) }
    }

    fn unavailable(&self, e: impl std::fmt::Display) -> StorageError {
        StorageError::Unavailable(format!("{}: {e}", self.path.display()))
    }
}

impl KeyValueStore for FileStore {
    fn multi_get(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
        let entries = self.load()?;
        Ok(keys.iter().map(|key| entries.get(*key).cloned()).collect())
    }

    fn multi_set(&self, pairs: &[(&str, &str)]) -> Result<(), StorageError> {
        let keys: Vec<&str> = pairs.iter().map(|(key, _)| *key).collect();
        self.update(&keys, |entries| {
            for (key, value) in pairs {
                entries.insert((*key).to_owned(), (*value).to_owned());
            }
            true
        })
    }

    fn multi_remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        self.update(keys, |entries| {
            let before = entries.len();
            entries.retain(|key, _| !keys.contains(&key.as_str()));
            entries.len() != before
        })
    }
}
