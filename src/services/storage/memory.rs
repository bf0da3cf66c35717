use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;

use crate::services::storage::client::{
    ContextId, EVENT_CHANNEL_CAPACITY, KeyValueStore, StorageError, StorageEvent, StorageResult,
};

/// In-process store shared between several contexts.
///
/// `context()` hands out another handle on the same data, the way several
/// browser tabs share one origin's local storage.
#[derive(Clone)]
pub struct MemoryStore {
    shared: Arc<Shared>,
    context: ContextId,
}

struct Shared {
    items: Mutex<HashMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
    available: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                items: Mutex::new(HashMap::new()),
                events,
                available: AtomicBool::new(true),
            }),
            context: ContextId::new(),
        }
    }

    /// Another context over the same data.
    pub fn context(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            context: ContextId::new(),
        }
    }

    /// Simulates a store that refuses every operation (quota, private mode).
    pub fn set_available(&self, available: bool) {
        self.shared.available.store(available, Ordering::SeqCst);
    }

    fn items(&self) -> StorageResult<MutexGuard<'_, HashMap<String, String>>> {
        if !self.shared.available.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory store disabled".into()));
        }
        self.shared
            .items
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".into()))
    }

    fn publish(&self, key: &str, new_value: Option<String>) {
        // No receivers is fine.
        let _ = self.shared.events.send(StorageEvent {
            key: key.to_string(),
            new_value,
            origin: self.context,
        });
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn context_id(&self) -> ContextId {
        self.context
    }

    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.items()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let changed = {
            let mut items = self.items()?;
            items.insert(key.to_string(), value.to_string()).as_deref() != Some(value)
        };
        if changed {
            self.publish(key, Some(value.to_string()));
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let removed = self.items()?.remove(key).is_some();
        if removed {
            self.publish(key, None);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.shared.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contexts_share_items() {
        let a = MemoryStore::new();
        let b = a.context();
        a.set_item("k", "v").unwrap();
        assert_eq!(b.get_item("k").unwrap().as_deref(), Some("v"));
        b.remove_item("k").unwrap();
        assert_eq!(a.get_item("k").unwrap(), None);
    }

    #[test]
    fn changes_are_published_with_origin() {
        let a = MemoryStore::new();
        let b = a.context();
        let mut rx = b.subscribe();

        a.set_item("k", "v").unwrap();
        // Same value again: no event.
        a.set_item("k", "v").unwrap();
        b.remove_item("k").unwrap();
        // Already gone: no event.
        b.remove_item("k").unwrap();

        let first = rx.try_recv().unwrap();
        assert_eq!(first.new_value.as_deref(), Some("v"));
        assert_eq!(first.origin, a.context_id());

        let second = rx.try_recv().unwrap();
        assert_eq!(second.new_value, None);
        assert_eq!(second.origin, b.context_id());

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unavailable_store_fails_every_operation() {
        let store = MemoryStore::new();
        store.set_available(false);
        assert!(matches!(store.get_item("k"), Err(StorageError::Unavailable(_))));
        assert!(store.set_item("k", "v").is_err());
        assert!(store.remove_item("k").is_err());

        store.set_available(true);
        assert_eq!(store.get_item("k").unwrap(), None);
    }
}
