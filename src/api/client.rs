use std::time::{Duration, Instant};

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{ApiConfig, RequestConfig};
use crate::error::{ApiError, ApiResult};
use crate::store::SessionStore;

/// Whether a request must carry the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// Attach `Authorization: Bearer <token>` from the session store.
    Required,
    /// Send anonymously (login, register, refresh).
    None,
}

/// Typed HTTP wrapper for the PCF backend.
///
/// One request path for the whole crate: attaches auth headers sourced
/// from the session store, serializes JSON bodies, parses JSON or binary
/// responses, and converts failures into [`ApiError`]. Deliberately free
/// of retry logic; refresh-and-retry behavior belongs to the session
/// layer.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: SessionStore,
}

impl ApiClient {
    /// Create a new client against the configured backend.
    pub fn new(
        config: &ApiConfig,
        request_config: &RequestConfig,
        store: SessionStore,
    ) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(ApiError::from)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            store,
        })
    }

    /// The backend base URL (for testing).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a request expecting a JSON (or empty) response.
    ///
    /// A 204 or zero-length body resolves to `None`; anything else is
    /// deserialized into `T`.
    pub async fn request_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        auth: Auth,
    ) -> ApiResult<Option<T>> {
        let response = self.send(method, path, body, auth).await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let bytes = response.bytes().await.map_err(ApiError::from)?;
        if bytes.is_empty() {
            return Ok(None);
        }

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| ApiError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })
    }

    /// Issue a request expecting a binary response (exports).
    pub async fn request_bytes(
        &self,
        method: Method,
        path: &str,
        auth: Auth,
    ) -> ApiResult<Vec<u8>> {
        let response = self.send::<()>(method, path, None, auth).await?;
        let bytes = response.bytes().await.map_err(ApiError::from)?;
        Ok(bytes.to_vec())
    }

    /// GET expecting a mandatory JSON body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request_json::<(), T>(Method::GET, path, None, Auth::Required)
            .await?
            .ok_or_else(|| ApiError::InvalidResponse {
                message: format!("Empty response from GET {}", path),
            })
    }

    /// POST with a JSON body, expecting a JSON body back.
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.request_json(Method::POST, path, Some(body), Auth::Required)
            .await?
            .ok_or_else(|| ApiError::InvalidResponse {
                message: format!("Empty response from POST {}", path),
            })
    }

    /// Anonymous POST, used by the auth endpoints.
    pub async fn post_anonymous<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.request_json(Method::POST, path, Some(body), Auth::None)
            .await?
            .ok_or_else(|| ApiError::InvalidResponse {
                message: format!("Empty response from POST {}", path),
            })
    }

    /// PUT with a JSON body, expecting a JSON body back.
    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.request_json(Method::PUT, path, Some(body), Auth::Required)
            .await?
            .ok_or_else(|| ApiError::InvalidResponse {
                message: format!("Empty response from PUT {}", path),
            })
    }

    /// DELETE, tolerating the usual empty 204 reply.
    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        self.request_json::<(), serde_json::Value>(Method::DELETE, path, None, Auth::Required)
            .await?;
        Ok(())
    }

    /// Execute a single request (internal). All error mapping lives here.
    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        auth: Auth,
    ) -> ApiResult<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, path = %path, "API request");

        let start = Instant::now();
        let mut builder = self.client.request(method.clone(), &url);

        if auth == Auth::Required {
            if let Some(token) = self.store.access_token().await {
                builder = builder.header("Authorization", format!("Bearer {}", token));
            }
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(ApiError::from)?;
        let status = response.status();
        let latency = start.elapsed();

        if status.is_success() {
            info!(
                method = %method,
                path = %path,
                status = status.as_u16(),
                latency_ms = latency.as_millis(),
                "API request succeeded"
            );
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        warn!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            latency_ms = latency.as_millis(),
            "API request failed"
        );
        Err(structured_error(status.as_u16(), &error_body))
    }
}

/// Recover `{message, data}` from a non-2xx body.
///
/// The backend puts the human message under `detail` or `message`; the
/// whole parsed body rides along as `data` so form pages can map
/// per-field errors. Unparseable bodies keep their raw text as message.
fn structured_error(status: u16, body: &str) -> ApiError {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => {
            let message = value
                .get("detail")
                .or_else(|| value.get("message"))
                .and_then(|m| m.as_str())
                .unwrap_or(body)
                .to_string();
            ApiError::Status {
                status,
                message,
                data: Some(value),
            }
        }
        Err(_) => ApiError::Status {
            status,
            message: body.to_string(),
            data: None,
        },
    }
}
