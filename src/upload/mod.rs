pub mod http;
pub mod memory;

pub use http::{Credentials, HttpUploader, UploadConfig};
pub use memory::MemoryUploader;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Malformed credentials: {0}")]
    MalformedCredentials(String),

    #[error("Invalid upload endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Invalid remote name: {0:?}")]
    InvalidName(String),

    #[error("Upload rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Mirrors a committed artifact to remote storage.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Uploads `body` under `remote_name` and returns a shareable URL.
    async fn upload(&self, remote_name: &str, body: Vec<u8>) -> Result<String, UploadError>;
}

#[async_trait]
impl<U: Uploader + ?Sized> Uploader for Arc<U> {
    async fn upload(&self, remote_name: &str, body: Vec<u8>) -> Result<String, UploadError> {
        (**self).upload(remote_name, body).await
    }
}

pub(crate) fn check_remote_name(remote_name: &str) -> Result<(), UploadError> {
    if remote_name.is_empty()
        || remote_name.contains("..")
        || remote_name.contains('/')
        || remote_name.contains('\\')
    {
        return Err(UploadError::InvalidName(remote_name.to_string()));
    }
    Ok(())
}
