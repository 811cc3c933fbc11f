pub mod base;
pub mod disk;
pub mod factory;
pub mod memory;
pub mod types;

pub use base::{Collection, StorageError};
pub use disk::DiskCollection;
pub use factory::{create_collection, CollectionType, Storage};
pub use memory::MemoryCollection;
pub use types::CollectionKind;
