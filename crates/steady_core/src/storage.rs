use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to prepare storage root `{path}`: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read `{key}`: {source}")]
    Read {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write `{key}`: {source}")]
    Write {
        key: String,
        #[source]
        source: io::Error,
    },
}

/// String-keyed blob store. Values are whatever the service serializes;
/// the store itself never interprets them.
pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Volatile store for tests and previews.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// On-disk store keeping one JSON document per key under a root directory.
#[derive(Debug)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|source| StorageError::Root {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl BlobStore for DirStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::write(self.path_for(key), value).map_err(|source| StorageError::Write {
            key: key.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::new();
        assert_eq!(store.get("habits").unwrap(), None);
        store.put("habits", "[]").unwrap();
        assert_eq!(store.get("habits").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn dir_store_reads_missing_keys_as_none() {
        let temp = tempdir().unwrap();
        let store = DirStore::open(temp.path()).unwrap();
        assert_eq!(store.get("last_reset").unwrap(), None);
    }

    #[test]
    fn dir_store_overwrites_in_place() {
        let temp = tempdir().unwrap();
        let store = DirStore::open(temp.path()).unwrap();
        store.put("habits", "[1]").unwrap();
        store.put("habits", "[1,2]").unwrap();
        assert_eq!(store.get("habits").unwrap().as_deref(), Some("[1,2]"));
    }

    #[test]
    fn dir_store_values_survive_reopen() {
        let temp = tempdir().unwrap();
        {
            let store = DirStore::open(temp.path()).unwrap();
            store.put("day_marks", "{}").unwrap();
        }
        let store = DirStore::open(temp.path()).unwrap();
        assert_eq!(store.get("day_marks").unwrap().as_deref(), Some("{}"));
    }
}
