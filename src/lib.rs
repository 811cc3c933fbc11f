pub mod artifacts;
pub mod config;
pub mod core;
pub mod storage;
pub mod upload;

pub use artifacts::{ArtifactStore, ConfigRecord, OutputPreview, RemoteOutcome, StoredConfig};
pub use config::{ConfigError, StoreConfig};
pub use crate::core::{Clock, StoreError, StoreResult};
pub use storage::{Collection, DiskCollection, MemoryCollection};
pub use upload::{HttpUploader, Uploader};
