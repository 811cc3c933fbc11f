use super::{check_remote_name, UploadError, Uploader};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Records uploads in memory. Can be told to reject every upload.
#[derive(Debug, Default)]
pub struct MemoryUploader {
    uploads: RwLock<HashMap<String, Vec<u8>>>,
    failing: AtomicBool,
}

impl MemoryUploader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let uploader = Self::default();
        uploader.set_failing(true);
        uploader
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    pub fn uploaded(&self, remote_name: &str) -> Option<Vec<u8>> {
        self.uploads.read().get(remote_name).cloned()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.read().len()
    }
}

#[async_trait]
impl Uploader for MemoryUploader {
    async fn upload(&self, remote_name: &str, body: Vec<u8>) -> Result<String, UploadError> {
        check_remote_name(remote_name)?;
        if self.failing.load(Ordering::Relaxed) {
            return Err(UploadError::Rejected {
                status: 503,
                body: "remote store unavailable".to_string(),
            });
        }
        self.uploads.write().insert(remote_name.to_string(), body);
        Ok(format!("memory://uploads/{remote_name}"))
    }
}
