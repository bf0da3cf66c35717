/*
 * Responsibility
 * - The single persisted auth record under AUTH_KEY
 * - Best effort: storage/serialization failures are logged and absorbed
 *   (save/clear become no-ops, load returns None). A broken store must never
 *   take the session down with it.
 */
use crate::dto::auth::{AuthRecord, StoredAuthRecord};
use crate::repos::error::AuthRecordError;
use crate::services::normalize::normalize;
use crate::services::storage::KeyValueStore;

pub const AUTH_KEY: &str = "beautyroom_auth";

pub fn save(store: &dyn KeyValueStore, record: &AuthRecord) {
    let json = match serde_json::to_string(record) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(error = %e, "could not serialize auth record");
            return;
        }
    };

    if let Err(e) = store.set_item(AUTH_KEY, &json) {
        tracing::warn!(error = %e, backend = store.backend_name(), "could not save auth record");
    }
}

pub fn load(store: &dyn KeyValueStore) -> Option<AuthRecord> {
    let raw = match store.get_item(AUTH_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(
                error = %e,
                backend = store.backend_name(),
                "could not read auth record"
            );
            return None;
        }
    };

    decode(&raw)
        .map_err(|e| tracing::warn!(error = %e, "ignoring stored auth record"))
        .ok()
}

pub fn clear(store: &dyn KeyValueStore) {
    if let Err(e) = store.remove_item(AUTH_KEY) {
        tracing::warn!(error = %e, backend = store.backend_name(), "could not clear auth record");
    }
}

/// Parse a raw stored value. The stored user is re-normalized, so records
/// written by older versions (or holding a backend-shaped user) still load.
pub fn decode(raw: &str) -> Result<AuthRecord, AuthRecordError> {
    if raw.trim().is_empty() {
        return Err(AuthRecordError::Empty);
    }
    let stored: StoredAuthRecord = serde_json::from_str(raw)?;

    Ok(AuthRecord {
        token: stored.token.filter(|t| !t.is_empty()),
        user: stored.user.as_ref().and_then(normalize),
        raw: stored.raw,
    })
}
