use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage operation failed: {0}")]
    OperationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    #[error("Collection {0} is read-only")]
    ReadOnly(String),
}

/// A flat key space holding one kind of artifact.
///
/// Keys are plain file names. Implementations must make `put` atomic: a
/// concurrent `get` or `list` observes either the previous state or the
/// complete new entry.
#[async_trait]
pub trait Collection: Send + Sync {
    fn name(&self) -> &str;

    async fn put(&self, key: &str, body: Vec<u8>) -> Result<(), StorageError>;

    /// Returns `None` when the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Lists every committed key. A missing collection lists as empty.
    async fn list(&self) -> Result<Vec<String>, StorageError>;

    /// Filesystem path of a committed entry, for backends that have one.
    fn locate(&self, _key: &str) -> Option<PathBuf> {
        None
    }
}

/// True when `key` names a single visible entry, with no path components.
pub fn is_plain_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && !key.contains('/')
        && !key.contains('\\')
        && !key.contains('\0')
}
