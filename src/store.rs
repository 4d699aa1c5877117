use directories::ProjectDirs;
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Key/value persistence for built pattern tables.
///
/// Missing keys read as `None`; a store that never holds anything is valid.
pub trait PdbStore: Send + Sync {
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>>;
    fn put(&self, key: &str, blob: &[u8]) -> io::Result<()>;
    fn clear(&self) -> io::Result<()>;
}

/// One `<key>.bin` file per table under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.bin"))
    }
}

pub fn default_cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "slider-pdb").map(|dirs| dirs.cache_dir().to_path_buf())
}

impl PdbStore for FileStore {
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn put(&self, key: &str, blob: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        // Readers only ever see complete tables.
        let tmp = self.dir.join(format!("{key}.bin.tmp"));
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, self.path_for(key))?;
        debug!("stored {} bytes at {}", blob.len(), self.path_for(key).display());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        for entry in entries {
            let path = entry?.path();
            let is_table = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("pdb_") && n.contains(".bin"));
            if is_table {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

/// Process-local store, mostly for tests and `--no-cache` runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl PdbStore for MemoryStore {
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.entries().get(key).cloned())
    }

    fn put(&self, key: &str, blob: &[u8]) -> io::Result<()> {
        self.entries().insert(key.to_string(), blob.to_vec());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        self.entries().clear();
        Ok(())
    }
}

/// Holds nothing; every table is rebuilt.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

impl PdbStore for NullStore {
    fn get(&self, _key: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(None)
    }

    fn put(&self, _key: &str, _blob: &[u8]) -> io::Result<()> {
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("cache"));
        assert_eq!(store.get("pdb_1_2").unwrap(), None);
        store.clear().unwrap();

        store.put("pdb_1_2", &[1, 2, 3, 4]).unwrap();
        assert_eq!(store.get("pdb_1_2").unwrap(), Some(vec![1, 2, 3, 4]));

        fs::write(store.dir().join("notes.txt"), b"keep").unwrap();
        store.clear().unwrap();
        assert_eq!(store.get("pdb_1_2").unwrap(), None);
        assert!(store.dir().join("notes.txt").exists());
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        store.put("pdb_3", &[9]).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("pdb_3").unwrap(), Some(vec![9]));
        store.clear().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn null_store_is_always_empty() {
        NullStore.put("pdb_3", &[9]).unwrap();
        assert_eq!(NullStore.get("pdb_3").unwrap(), None);
    }
}
