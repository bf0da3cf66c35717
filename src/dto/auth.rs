/*
 * Responsibility
 * - AuthRecord: the persisted session bundle (token, normalized user, raw payload)
 * - StoredAuthRecord: the lenient shape read back from storage before normalization
 */
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dto::users::{NormalizedUser, UserId};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuthRecord {
    pub token: Option<String>,
    pub user: Option<NormalizedUser>,
    // Original backend payload, kept for diagnostics only.
    pub raw: Value,
}

impl AuthRecord {
    /// A record counts as a session when it carries a token or a user.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() || self.user.is_some()
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user.as_ref().and_then(|u| u.id.as_ref())
    }
}

/// What is read back from storage. The user stays untyped here: it is
/// re-normalized on load so older stored shapes keep working.
#[derive(Debug, Deserialize)]
pub struct StoredAuthRecord {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<Value>,
    #[serde(default)]
    pub raw: Value,
}
