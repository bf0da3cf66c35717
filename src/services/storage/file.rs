use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::services::storage::client::{
    ContextId, EVENT_CHANNEL_CAPACITY, KeyValueStore, StorageError, StorageEvent, StorageResult,
};

/// Directory-backed store: one file per key.
///
/// Several processes may point at the same directory. Writes go through a
/// temp file + rename, so readers never see a half-written value. Changes
/// made by other processes are only noticed by `poll_changes` /
/// `spawn_watcher`.
#[derive(Clone)]
pub struct FileStore {
    inner: Arc<FileInner>,
    context: ContextId,
}

struct FileInner {
    dir: PathBuf,
    events: broadcast::Sender<StorageEvent>,
    // Last known value of every key; used to diff the directory when polling.
    seen: Mutex<HashMap<String, String>>,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let seen = scan(&dir)?;

        tracing::debug!(dir = %dir.display(), keys = seen.len(), "opened file store");

        Ok(Self {
            inner: Arc::new(FileInner {
                dir,
                events,
                seen: Mutex::new(seen),
            }),
            context: ContextId::new(),
        })
    }

    /// Another context over the same directory (same process).
    pub fn context(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            context: ContextId::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.inner.dir
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.inner.dir.join(key))
    }

    fn seen(&self) -> StorageResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.inner
            .seen
            .lock()
            .map_err(|_| StorageError::Unavailable("file store lock poisoned".into()))
    }

    fn publish(&self, event: StorageEvent) {
        let _ = self.inner.events.send(event);
    }

    /// Diff the directory against the last known state and publish whatever
    /// another process changed.
    pub fn poll_changes(&self) -> StorageResult<Vec<StorageEvent>> {
        let current = scan(&self.inner.dir)?;
        let events = {
            let mut seen = self.seen()?;
            let mut events = Vec::new();

            for (key, value) in &current {
                if seen.get(key) != Some(value) {
                    events.push(StorageEvent {
                        key: key.clone(),
                        new_value: Some(value.clone()),
                        origin: ContextId::EXTERNAL,
                    });
                }
            }
            for key in seen.keys() {
                if !current.contains_key(key) {
                    events.push(StorageEvent {
                        key: key.clone(),
                        new_value: None,
                        origin: ContextId::EXTERNAL,
                    });
                }
            }

            *seen = current;
            events
        };

        for event in &events {
            tracing::debug!(
                key = %event.key,
                removed = event.new_value.is_none(),
                "external storage change"
            );
            self.publish(event.clone());
        }
        Ok(events)
    }

    /// Poll for external changes every `interval`. Must be called inside a
    /// Tokio runtime; abort the handle to stop watching.
    pub fn spawn_watcher(&self, interval: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = store.poll_changes() {
                    tracing::warn!(
                        error = %e,
                        dir = %store.dir().display(),
                        "file store poll failed"
                    );
                }
            }
        })
    }
}

impl KeyValueStore for FileStore {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    fn context_id(&self) -> ContextId {
        self.context
    }

    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        let tmp = self.inner.dir.join(format!(".{}.{}.tmp", key, Uuid::new_v4()));

        let mut seen = self.seen()?;
        let write = (|| {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp, &path)
        })();
        if let Err(e) = write {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        let changed = seen.insert(key.to_string(), value.to_string()).as_deref() != Some(value);
        drop(seen);

        if changed {
            self.publish(StorageEvent {
                key: key.to_string(),
                new_value: Some(value.to_string()),
                origin: self.context,
            });
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;

        let mut seen = self.seen()?;
        let removed = match fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        seen.remove(key);
        drop(seen);

        if removed {
            self.publish(StorageEvent {
                key: key.to_string(),
                new_value: None,
                origin: self.context,
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.inner.events.subscribe()
    }
}

// Keys become file names; keep them boring.
fn validate_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

fn scan(dir: &Path) -> StorageResult<HashMap<String, String>> {
    let mut items = HashMap::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        // Temp files and foreign names are not keys.
        if validate_key(&name).is_err() || !entry.file_type()?.is_file() {
            continue;
        }
        match fs::read_to_string(entry.path()) {
            Ok(value) => {
                items.insert(name, value);
            }
            // Removed between read_dir and read.
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();

        assert_eq!(store.get_item("beautyroom_auth").unwrap(), None);
        store.set_item("beautyroom_auth", "{\"token\":\"t\"}").unwrap();
        assert_eq!(
            store.get_item("beautyroom_auth").unwrap().as_deref(),
            Some("{\"token\":\"t\"}")
        );
        store.remove_item("beautyroom_auth").unwrap();
        assert_eq!(store.get_item("beautyroom_auth").unwrap(), None);
        // Removing twice is fine.
        store.remove_item("beautyroom_auth").unwrap();
    }

    #[test]
    fn rejects_keys_that_are_not_plain_file_names() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();
        for key in ["", "../escape", ".hidden", "a/b", "spaced key"] {
            assert!(
                matches!(store.set_item(key, "v"), Err(StorageError::InvalidKey(_))),
                "key {key:?} should be rejected"
            );
        }
    }

    #[test]
    fn leaves_no_temp_files_behind() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();
        store.set_item("k", "1").unwrap();
        store.set_item("k", "2").unwrap();

        let names: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["k".to_string()]);
    }

    #[test]
    fn poll_reports_changes_from_other_processes() {
        let tmp = tempfile::tempdir().unwrap();
        let ours = FileStore::open(tmp.path()).unwrap();
        // A second, independent open of the same directory stands in for
        // another process.
        let theirs = FileStore::open(tmp.path()).unwrap();
        let mut rx = ours.subscribe();

        ours.set_item("mine", "x").unwrap();
        assert_eq!(rx.try_recv().unwrap().origin, ours.context_id());
        assert!(ours.poll_changes().unwrap().is_empty());

        theirs.set_item("beautyroom_auth", "v1").unwrap();
        let events = ours.poll_changes().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].key, "beautyroom_auth");
        assert_eq!(events[0].new_value.as_deref(), Some("v1"));
        assert_eq!(events[0].origin, ContextId::EXTERNAL);
        assert_eq!(rx.try_recv().unwrap().new_value.as_deref(), Some("v1"));

        theirs.remove_item("beautyroom_auth").unwrap();
        let events = ours.poll_changes().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].new_value, None);
    }

    #[tokio::test]
    async fn watcher_publishes_external_writes() {
        let tmp = tempfile::tempdir().unwrap();
        let ours = FileStore::open(tmp.path()).unwrap();
        let theirs = FileStore::open(tmp.path()).unwrap();
        let mut rx = ours.subscribe();
        let watcher = ours.spawn_watcher(Duration::from_millis(10));

        theirs.set_item("beautyroom_auth", "v2").unwrap();
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.new_value.as_deref(), Some("v2"));
        assert_eq!(event.origin, ContextId::EXTERNAL);

        watcher.abort();
    }
}
