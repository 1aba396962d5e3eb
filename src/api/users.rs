//! User profile endpoints.

use serde::Serialize;

use super::client::ApiClient;
use super::types::User;
use crate::error::ApiResult;

/// Profile fields a user may change about themselves.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Fetch the authenticated user's profile.
pub async fn profile(api: &ApiClient) -> ApiResult<User> {
    api.get("/api/users/me/").await
}

/// Update the authenticated user's profile.
pub async fn update_profile(api: &ApiClient, update: &ProfileUpdate) -> ApiResult<User> {
    api.put("/api/users/me/", update).await
}
