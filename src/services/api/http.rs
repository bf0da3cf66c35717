use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Method, Url};
use serde_json::{Map, Value, json};

use crate::dto::users::UserId;
use crate::services::api::client::{ApiError, ApiResult, UserApi};

/// reqwest-backed user API.
///
/// No timeouts are set; requests rely on the transport defaults.
#[derive(Clone, Debug)]
pub struct HttpUserApi {
    base: Url,
    client: reqwest::Client,
}

impl HttpUserApi {
    pub fn new(base: Url) -> ApiResult<Self> {
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base.to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { base, client })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// `{base}/api/users/{id}`, keeping any path prefix of the base url.
    pub fn user_url(&self, id: &UserId) -> ApiResult<Url> {
        let id = id.to_string();
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(["api", "users", id.as_str()]);
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        id: &UserId,
        token: &str,
        body: Option<&Map<String, Value>>,
    ) -> ApiResult<Value> {
        let url = self.user_url(id)?;
        tracing::debug!(%method, %url, "calling user api");

        let mut req = self.client.request(method, url).bearer_auth(token);
        req = match body {
            Some(body) => req.json(body),
            None => req.header(reqwest::header::CONTENT_TYPE, "application/json"),
        };

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            // Error bodies are diagnostic only; an unreadable one becomes `{}`.
            let body = resp.json::<Value>().await.unwrap_or_else(|_| json!({}));
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<Value>()
            .await
            .map_err(|e| ApiError::InvalidBody(e.to_string()))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transport(e.to_string())
    }
}

#[async_trait]
impl UserApi for HttpUserApi {
    fn backend_name(&self) -> &'static str {
        "http"
    }

    async fn fetch_user(&self, id: &UserId, token: &str) -> ApiResult<Value> {
        self.send(Method::GET, id, token, None).await
    }

    async fn update_user(
        &self,
        id: &UserId,
        token: &str,
        body: &Map<String, Value>,
    ) -> ApiResult<Value> {
        self.send(Method::PATCH, id, token, Some(body)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_url_appends_to_base_path() {
        let api = HttpUserApi::new(Url::parse("http://localhost:8000").unwrap()).unwrap();
        assert_eq!(
            api.user_url(&UserId::Number(4)).unwrap().as_str(),
            "http://localhost:8000/api/users/4"
        );

        let api = HttpUserApi::new(Url::parse("https://example.com/backend/").unwrap()).unwrap();
        assert_eq!(
            api.user_url(&UserId::Text("a b".into())).unwrap().as_str(),
            "https://example.com/backend/api/users/a%20b"
        );
    }

    #[test]
    fn rejects_non_base_urls() {
        let err = HttpUserApi::new(Url::parse("mailto:salon@example.com").unwrap()).unwrap_err();
        assert!(matches!(err, ApiError::InvalidBaseUrl(_)));
    }
}
