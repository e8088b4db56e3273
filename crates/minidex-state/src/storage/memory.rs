use super::overlay::WriteOverlay;
use super::Storage;
use crate::error::StateError;

/// In-memory storage, used by tests and throwaway nodes
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: WriteOverlay,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    /// Number of committed keys
    pub fn len(&self) -> usize {
        self.inner.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.data.is_empty()
    }
}

impl Storage for MemoryStorage {
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
        Ok(())
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

    #[test]
    fn test_staged_writes_visible_until_rollback() {
        let mut storage = MemoryStorage::new();

        storage.put(b"tok:a", b"1");
        assert_eq!(storage.get(b"tok:a"), Some(b"1".to_vec()));
        assert!(storage.is_empty());

        storage.rollback();
        assert_eq!(storage.get(b"tok:a"), None);
    }

    #[test]
    fn test_delete_is_staged() {
        let mut storage = MemoryStorage::new();
        storage.put(b"dex:1", b"pools");
        storage.commit().unwrap();

        storage.delete(b"dex:1");
        assert!(!storage.exists(b"dex:1"));

        storage.rollback();
        assert!(storage.exists(b"dex:1"));

        storage.delete(b"dex:1");
        storage.commit().unwrap();
        assert_eq!(storage.len(), 0);
    }

    #[test]
    fn test_prefix_query_merges_layers() {
        let mut storage = MemoryStorage::new();
        storage.put(b"nonce:1", b"0");
        storage.put(b"nonce:2", b"0");
        storage.put(b"tok:1", b"t");
        storage.commit().unwrap();

        storage.put(b"nonce:3", b"0");
        storage.delete(b"nonce:1");

        let keys = storage.keys_with_prefix(b"nonce:");
        assert_eq!(keys, vec![b"nonce:2".to_vec(), b"nonce:3".to_vec()]);
    }
}
