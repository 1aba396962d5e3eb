//! Product endpoints: CRUD plus the emission trace, AI advice and export
//! operations layered on a product.

use uuid::Uuid;

use super::client::{ApiClient, Auth};
use super::types::{Advice, ExportFormat, Product, ProductInput};
use crate::error::ApiResult;
use crate::trace::EmissionTrace;

/// Products supplied by a company.
pub async fn list(api: &ApiClient, company_id: Uuid) -> ApiResult<Vec<Product>> {
    api.get(&format!("/api/companies/{}/products/", company_id))
        .await
}

/// Fetch one product.
pub async fn get(api: &ApiClient, company_id: Uuid, product_id: Uuid) -> ApiResult<Product> {
    api.get(&format!(
        "/api/companies/{}/products/{}/",
        company_id, product_id
    ))
    .await
}

/// Create a product under the company.
pub async fn create(api: &ApiClient, company_id: Uuid, input: &ProductInput) -> ApiResult<Product> {
    api.post(&format!("/api/companies/{}/products/", company_id), input)
        .await
}

/// Update a product.
pub async fn update(
    api: &ApiClient,
    company_id: Uuid,
    product_id: Uuid,
    input: &ProductInput,
) -> ApiResult<Product> {
    api.put(
        &format!("/api/companies/{}/products/{}/", company_id, product_id),
        input,
    )
    .await
}

/// Delete a product.
pub async fn delete(api: &ApiClient, company_id: Uuid, product_id: Uuid) -> ApiResult<()> {
    api.delete(&format!(
        "/api/companies/{}/products/{}/",
        company_id, product_id
    ))
    .await
}

/// Fetch the freshly computed emission trace of a product.
///
/// The tree is denormalized per request and not cached client-side.
pub async fn emission_trace(
    api: &ApiClient,
    company_id: Uuid,
    product_id: Uuid,
) -> ApiResult<EmissionTrace> {
    api.get(&format!(
        "/api/companies/{}/products/{}/emission_trace/",
        company_id, product_id
    ))
    .await
}

/// Request AI-generated reduction advice for a product's footprint.
pub async fn ai_advice(api: &ApiClient, company_id: Uuid, product_id: Uuid) -> ApiResult<Advice> {
    api.post(
        &format!("/api/companies/{}/products/{}/ai_advice/", company_id, product_id),
        &serde_json::json!({}),
    )
    .await
}

/// Download a product report in the given format as raw bytes.
pub async fn export(
    api: &ApiClient,
    company_id: Uuid,
    product_id: Uuid,
    format: ExportFormat,
) -> ApiResult<Vec<u8>> {
    api.request_bytes(
        reqwest::Method::GET,
        &format!(
            "/api/companies/{}/products/{}/export/?format={}",
            company_id,
            product_id,
            format.as_str()
        ),
        Auth::Required,
    )
    .await
}
