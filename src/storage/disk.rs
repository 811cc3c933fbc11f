use super::base::{is_plain_key, Collection, StorageError};
use async_trait::async_trait;
use log::{debug, trace};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// A collection backed by one flat directory.
#[derive(Debug, Clone)]
pub struct DiskCollection {
    name: String,
    base_path: PathBuf,
}

impl DiskCollection {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, StorageError> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        let name = base_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| base_path.display().to_string());
        Ok(Self { name, base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    async fn write_atomic(&self, target: &Path, body: &[u8]) -> std::io::Result<()> {
        // Hidden names never show up in `list`, so a torn write stays invisible.
        // The staging name has a fixed length whatever the key.
        let staging = self
            .base_path
            .join(format!(".{}.tmp", Uuid::now_v7().simple()));

        let result = async {
            let mut file = tokio::fs::File::create(&staging).await?;
            file.write_all(body).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&staging, target).await
        }
        .await;

        if result.is_err() {
            let _ = tokio::fs::remove_file(&staging).await;
        }
        result
    }
}

impl From<std::io::Error> for StorageError {
    fn from(error: std::io::Error) -> Self {
        StorageError::OperationError(error.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(error: serde_json::Error) -> Self {
        StorageError::SerializationError(error.to_string())
    }
}

#[async_trait]
impl Collection for DiskCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn put(&self, key: &str, body: Vec<u8>) -> Result<(), StorageError> {
        if !is_plain_key(key) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        let target = self.base_path.join(key);
        self.write_atomic(&target, &body).await?;
        debug!("Wrote {} bytes to {}", body.len(), target.display());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        if !is_plain_key(key) {
            return Ok(None);
        }

        let path = self.base_path.join(key);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut entries = match tokio::fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Collection directory {} is missing", self.base_path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) if is_plain_key(&name) => keys.push(name),
                Ok(name) => trace!("Skipping hidden entry {}", name),
                Err(name) => trace!("Skipping non UTF-8 entry {:?}", name),
            }
        }
        Ok(keys)
    }

    fn locate(&self, key: &str) -> Option<PathBuf> {
        if !is_plain_key(key) {
            return None;
        }
        let path = self.base_path.join(key);
        path.is_file().then_some(path)
    }
}
