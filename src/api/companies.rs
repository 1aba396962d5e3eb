//! Company CRUD and membership endpoints.

use uuid::Uuid;

use super::client::ApiClient;
use super::types::{Company, CompanyInput, User};
use crate::error::ApiResult;

/// Companies the authenticated user belongs to.
pub async fn list(api: &ApiClient) -> ApiResult<Vec<Company>> {
    api.get("/api/companies/").await
}

/// Fetch one company.
pub async fn get(api: &ApiClient, company_id: Uuid) -> ApiResult<Company> {
    api.get(&format!("/api/companies/{}/", company_id)).await
}

/// Create a company. The creator becomes its first member.
pub async fn create(api: &ApiClient, input: &CompanyInput) -> ApiResult<Company> {
    api.post("/api/companies/", input).await
}

/// Update a company.
pub async fn update(api: &ApiClient, company_id: Uuid, input: &CompanyInput) -> ApiResult<Company> {
    api.put(&format!("/api/companies/{}/", company_id), input)
        .await
}

/// Delete a company.
pub async fn delete(api: &ApiClient, company_id: Uuid) -> ApiResult<()> {
    api.delete(&format!("/api/companies/{}/", company_id)).await
}

/// Users belonging to a company.
pub async fn members(api: &ApiClient, company_id: Uuid) -> ApiResult<Vec<User>> {
    api.get(&format!("/api/companies/{}/members/", company_id))
        .await
}

/// Invite a user to a company by username.
pub async fn add_member(api: &ApiClient, company_id: Uuid, username: &str) -> ApiResult<()> {
    let body = serde_json::json!({ "username": username });
    api.request_json::<_, serde_json::Value>(
        reqwest::Method::POST,
        &format!("/api/companies/{}/members/", company_id),
        Some(&body),
        super::client::Auth::Required,
    )
    .await?;
    Ok(())
}
