//! Native JSON-file store

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{KeyValueStore, PersistenceError};

const FILE_NAME: &str = "storage.json";

/// Whole map is rewritten on every `set`; the data is a handful of keys
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open (or start) the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries })
    }

    /// `<data dir>/brickfall/storage.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("brickfall").join(FILE_NAME))
    }

    pub fn open_default() -> Result<Self, PersistenceError> {
        let path = Self::default_path()
            .ok_or_else(|| PersistenceError::Unavailable("no user data directory".to_string()))?;
        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().expect("Failed to create temp directory");
        let store = FileStore::open(dir.path().join(FILE_NAME)).unwrap();
        assert_eq!(store.get("anything"), None);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().expect("Failed to create temp directory");
        let path = dir.path().join("nested").join(FILE_NAME);

        let mut store = FileStore::open(&path).unwrap();
        store.set("brickfall_best_SPEEDY", "42").unwrap();
        store.set("brickfall_tutorial_seen", "true").unwrap();
        assert!(path.exists());

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("brickfall_best_SPEEDY").as_deref(), Some("42"));
        assert_eq!(reopened.get("brickfall_tutorial_seen").as_deref(), Some("true"));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().expect("Failed to create temp directory");
        let path = dir.path().join(FILE_NAME);
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(FileStore::open(&path), Err(PersistenceError::Json(_))));
    }
}
