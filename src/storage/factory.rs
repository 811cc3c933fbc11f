use super::{base::StorageError, Collection, DiskCollection, MemoryCollection};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

pub enum CollectionType {
    Disk { path: PathBuf },
    Memory { name: String },
}

#[derive(Clone)]
pub enum Storage {
    Disk(Box<DiskCollection>),
    Memory(Arc<MemoryCollection>),
}

#[async_trait]
impl Collection for Storage {
    fn name(&self) -> &str {
        match self {
            Storage::Disk(storage) => storage.name(),
            Storage::Memory(storage) => storage.name(),
        }
    }

    async fn put(&self, key: &str, body: Vec<u8>) -> Result<(), StorageError> {
        match self {
            Storage::Disk(storage) => storage.put(key, body).await,
            Storage::Memory(storage) => storage.put(key, body).await,
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match self {
            Storage::Disk(storage) => storage.get(key).await,
            Storage::Memory(storage) => storage.get(key).await,
        }
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        match self {
            Storage::Disk(storage) => storage.list().await,
            Storage::Memory(storage) => storage.list().await,
        }
    }

    fn locate(&self, key: &str) -> Option<PathBuf> {
        match self {
            Storage::Disk(storage) => storage.locate(key),
            Storage::Memory(storage) => storage.locate(key),
        }
    }
}

pub fn create_collection(collection_type: CollectionType) -> Result<Storage, StorageError> {
    match collection_type {
        CollectionType::Disk { path } => Ok(Storage::Disk(Box::new(DiskCollection::new(path)?))),
        CollectionType::Memory { name } => Ok(Storage::Memory(Arc::new(MemoryCollection::new(name)))),
    }
}
