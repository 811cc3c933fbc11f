pub mod keys;
pub mod record;
pub mod store;
pub mod table;

pub use keys::{ConfigKey, ConfigPrefix, KeyScheme, UnknownPrefix};
pub use record::{ConfigRecord, RecordError, TASK_TYPE};
pub use store::{ArtifactStore, RemoteOutcome, StoredConfig};
pub use table::{OutputPreview, TableError, DEFAULT_PREVIEW_ROWS};
