/*
 * Responsibility
 * - AppError: failures of the command-line front end (config, storage setup, bad input)
 * - Library layers keep their own error types; the session controller never
 *   surfaces any of them to consumers
 */
use thiserror::Error;

use crate::config::ConfigError;
use crate::services::api::ApiError;
use crate::services::storage::StorageError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("profile update was not applied")]
    UpdateRejected,
    #[error("not logged in")]
    NotLoggedIn,
}

impl AppError {
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload(message.into())
    }
}
