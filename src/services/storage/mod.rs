pub mod client;
pub mod file;
pub mod memory;

pub use client::{ContextId, KeyValueStore, StorageError, StorageEvent, StorageResult};
pub use file::FileStore;
pub use memory::MemoryStore;
