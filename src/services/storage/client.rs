//! Key-value storage interface shared by every execution context of the app.
use std::fmt;

use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage-layer errors.
///
/// Note:
/// - The auth repo absorbs these (a broken store means "no session"), but the
///   backends still report them so other callers can decide.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Identifies one execution context (tab, process, controller) writing to a
/// shared store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(Uuid);

impl ContextId {
    /// Changes made outside this process (picked up by polling).
    pub const EXTERNAL: ContextId = ContextId(Uuid::nil());

    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::EXTERNAL {
            f.write_str("external")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// A key changed. `new_value == None` means the key was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub new_value: Option<String>,
    pub origin: ContextId,
}

// Events are small and consumers only care about the latest auth value.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// A minimal, string-based key-value store.
///
/// - Operations are synchronous and atomic per call.
/// - Every successful change is published to `subscribe()` receivers tagged
///   with the writer's `ContextId`; receivers skip their own writes.
pub trait KeyValueStore: Send + Sync + 'static {
    // Returns the backend name (for logging).
    fn backend_name(&self) -> &'static str;

    fn context_id(&self) -> ContextId;

    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    fn remove_item(&self, key: &str) -> StorageResult<()>;

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_ids_are_unique_and_external_is_nil() {
        assert_ne!(ContextId::new(), ContextId::new());
        assert_eq!(ContextId::EXTERNAL.to_string(), "external");
    }
}
