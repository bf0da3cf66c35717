//! Backend user API used by the session controller (refresh + profile update).
use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::dto::users::UserId;

/// Result type for backend calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Backend-call errors.
///
/// Note:
/// - The controller never lets these cross its public surface: a failed
///   refresh keeps the stored session, a failed update becomes `false`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend responded with HTTP {status}: {body}")]
    Status { status: u16, body: Value },
    #[error("invalid response body: {0}")]
    InvalidBody(String),
    #[error("invalid API base url: {0}")]
    InvalidBaseUrl(String),
}

/// Users endpoints of the BeautyRoom backend.
///
/// Implementations must be cheap to share (`Arc<dyn UserApi>`).
#[async_trait]
pub trait UserApi: Send + Sync + 'static {
    // Returns the backend name (for logging).
    fn backend_name(&self) -> &'static str;

    // GET /api/users/{id} with a bearer token. Returns the raw JSON body.
    async fn fetch_user(&self, id: &UserId, token: &str) -> ApiResult<Value>;

    // PATCH /api/users/{id} with a bearer token and the mapped fields.
    async fn update_user(
        &self,
        id: &UserId,
        token: &str,
        body: &Map<String, Value>,
    ) -> ApiResult<Value>;
}
