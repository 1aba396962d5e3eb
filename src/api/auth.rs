//! Authentication endpoints. No business logic here; the session layer
//! owns token persistence and error classification.

use serde::Serialize;

use super::client::ApiClient;
use super::types::{AccessToken, LoginRequest, RegisterRequest, TokenPair};
use crate::error::ApiResult;

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

/// Exchange credentials for a token pair.
pub async fn login(api: &ApiClient, request: &LoginRequest) -> ApiResult<TokenPair> {
    api.post_anonymous("/api/auth/login/", request).await
}

/// Create an account and receive a token pair for it.
pub async fn register(api: &ApiClient, request: &RegisterRequest) -> ApiResult<TokenPair> {
    api.post_anonymous("/api/auth/register/", request).await
}

/// Trade a refresh token for a fresh access token.
pub async fn refresh(api: &ApiClient, refresh_token: &str) -> ApiResult<AccessToken> {
    api.post_anonymous(
        "/api/auth/refresh/",
        &RefreshRequest {
            refresh: refresh_token,
        },
    )
    .await
}
