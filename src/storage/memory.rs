use super::base::{is_plain_key, Collection, StorageError};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-memory collection, used in tests and wherever a filesystem is unwanted.
/// Tracks `put` calls and can be flipped read-only to simulate an unwritable store.
#[derive(Debug)]
pub struct MemoryCollection {
    name: String,
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
    read_only: AtomicBool,
    put_calls: AtomicUsize,
}

impl MemoryCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(BTreeMap::new()),
            read_only: AtomicBool::new(false),
            put_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::Relaxed);
    }

    pub fn put_count(&self) -> usize {
        self.put_calls.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Seeds an entry directly, bypassing the read-only switch.
    pub fn insert(&self, key: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.entries.write().insert(key.into(), body.into());
    }
}

#[async_trait]
impl Collection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn put(&self, key: &str, body: Vec<u8>) -> Result<(), StorageError> {
        self.put_calls.fetch_add(1, Ordering::Relaxed);
        if self.read_only.load(Ordering::Relaxed) {
            return Err(StorageError::ReadOnly(self.name.clone()));
        }
        if !is_plain_key(key) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        self.entries.write().insert(key.to_string(), body);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}
