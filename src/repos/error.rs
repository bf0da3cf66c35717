/**
 * Responsibility
 * - What the auth repo reports upward when a stored value cannot be used
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthRecordError {
    #[error("stored auth record is empty")]
    Empty,
    #[error("malformed auth record: {0}")]
    Malformed(#[from] serde_json::Error),
}
