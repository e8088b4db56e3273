use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use minidex_core::serialize;
use tracing::debug;

use super::overlay::WriteOverlay;
use super::Storage;
use crate::error::StateError;

/// File-backed storage: the whole committed map lives in one snapshot file
/// that is rewritten on every commit.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
    inner: WriteOverlay,
}

impl FileStorage {
    pub fn new<P: Into<PathBuf>>(path: P) -> Result<Self, StateError> {
        let path = path.into();
        let data: BTreeMap<Vec<u8>, Vec<u8>> = if path.exists() {
            let bytes = fs::read(&path).map_err(|e| StateError::Storage(e.to_string()))?;
            if bytes.is_empty() {
                BTreeMap::new()
            } else {
                serialize::from_bytes(&bytes)
                    .map_err(|e| StateError::Serialization(e.to_string()))?
            }
        } else {
            BTreeMap::new()
        };

        debug!("Opened {} with {} keys", path.display(), data.len());

        Ok(FileStorage {
            path,
            inner: WriteOverlay::with_data(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush_to_disk(&self) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StateError::Storage(e.to_string()))?;
        }

        let bytes = serialize::to_bytes(&self.inner.data)
            .map_err(|e| StateError::Serialization(e.to_string()))?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, &bytes).map_err(|e| StateError::Storage(e.to_string()))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| StateError::Storage(e.to_string()))?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.get(key)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) {
        self.inner.stage(key, Some(value));
    }

    fn delete(&mut self, key: &[u8]) {
        self.inner.stage(key, None);
    }

    fn commit(&mut self) -> Result<(), StateError> {
        self.inner.apply();
        self.flush_to_disk()
    }

    fn rollback(&mut self) {
        self.inner.discard();
    }

    fn keys_with_prefix(&self, prefix: &[u8]) -> Vec<Vec<u8>> {
        self.inner.keys_with_prefix(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("minidex-storage-{}-{}", std::process::id(), name))
            .join("state.bin")
    }

    #[test]
    fn test_commit_survives_reopen() {
        let path = temp_path("reopen");
        let _ = fs::remove_file(&path);

        let mut storage = FileStorage::new(&path).unwrap();
        storage.put(b"chain:id", b"7");
        storage.commit().unwrap();

        let reopened = FileStorage::new(&path).unwrap();
        assert_eq!(reopened.get(b"chain:id"), Some(b"7".to_vec()));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_uncommitted_writes_are_not_flushed() {
        let path = temp_path("uncommitted");
        let _ = fs::remove_file(&path);

        let mut storage = FileStorage::new(&path).unwrap();
        storage.put(b"a", b"1");
        storage.commit().unwrap();
        storage.put(b"b", b"2");

        let reopened = FileStorage::new(&path).unwrap();
        assert!(reopened.exists(b"a"));
        assert!(!reopened.exists(b"b"));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
