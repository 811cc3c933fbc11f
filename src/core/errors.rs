use crate::artifacts::{RecordError, TableError};
use crate::storage::base::StorageError;
use crate::upload::UploadError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage write error for {key}: {source}")]
    StorageWrite {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("Storage read error in {collection}: {source}")]
    StorageRead {
        collection: String,
        #[source]
        source: StorageError,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed record {key}: {source}")]
    MalformedRecord {
        key: String,
        #[source]
        source: RecordError,
    },

    #[error("Malformed table {key}: {source}")]
    MalformedTable {
        key: String,
        #[source]
        source: TableError,
    },

    #[error("Remote upload error: {0}")]
    RemoteUpload(#[from] UploadError),
}

pub type StoreResult<T> = Result<T, StoreError>;
