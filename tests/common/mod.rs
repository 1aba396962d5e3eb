//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use pcf_client::api::ApiClient;
use pcf_client::config::{ApiConfig, RequestConfig, SessionConfig};
use pcf_client::session::Session;
use pcf_client::store::{MemoryStore, SessionStore};

/// In-memory store, fresh per test.
pub fn memory_store() -> SessionStore {
    SessionStore::new(Arc::new(MemoryStore::new()))
}

/// API client pointed at a mock server, sharing the given store.
pub fn test_client(base_url: &str, store: SessionStore) -> ApiClient {
    let config = ApiConfig {
        base_url: base_url.to_string(),
    };
    let request_config = RequestConfig { timeout_ms: 5000 };
    ApiClient::new(&config, &request_config, store).expect("Failed to create client")
}

/// Session over the same store and client.
pub fn test_session(api: ApiClient, store: SessionStore) -> Session {
    Session::new(api, store, SessionConfig::default())
}

/// Session with a custom token-lifecycle config.
pub fn test_session_with(api: ApiClient, store: SessionStore, config: SessionConfig) -> Session {
    Session::new(api, store, config)
}

/// Unsigned JWT whose claims carry the given expiry timestamp. The
/// client never verifies signatures, so "signature" suffices.
pub fn make_token(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp}}}"#));
    format!("{header}.{claims}.signature")
}

/// A token expiring one hour from now.
pub fn fresh_token() -> String {
    make_token(chrono::Utc::now().timestamp() + 3600)
}

/// A token that expired ten minutes ago.
pub fn expired_token() -> String {
    make_token(chrono::Utc::now().timestamp() - 600)
}
