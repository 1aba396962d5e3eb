//! Per-category emission record endpoints (material, transport, user
//! energy, production energy). One endpoint family per category; the
//! record shape is shared.

use uuid::Uuid;

use super::client::ApiClient;
use super::types::{EmissionCategory, EmissionRecord, EmissionRecordInput};
use crate::error::ApiResult;

fn base_path(company_id: Uuid, product_id: Uuid, category: EmissionCategory) -> String {
    format!(
        "/api/companies/{}/products/{}/{}/",
        company_id,
        product_id,
        category.as_path()
    )
}

/// Emission records of one category for a product.
pub async fn list(
    api: &ApiClient,
    company_id: Uuid,
    product_id: Uuid,
    category: EmissionCategory,
) -> ApiResult<Vec<EmissionRecord>> {
    api.get(&base_path(company_id, product_id, category)).await
}

/// Add an emission record.
pub async fn create(
    api: &ApiClient,
    company_id: Uuid,
    product_id: Uuid,
    category: EmissionCategory,
    input: &EmissionRecordInput,
) -> ApiResult<EmissionRecord> {
    api.post(&base_path(company_id, product_id, category), input)
        .await
}

/// Update an emission record.
pub async fn update(
    api: &ApiClient,
    company_id: Uuid,
    product_id: Uuid,
    category: EmissionCategory,
    record_id: Uuid,
    input: &EmissionRecordInput,
) -> ApiResult<EmissionRecord> {
    api.put(
        &format!("{}{}/", base_path(company_id, product_id, category), record_id),
        input,
    )
    .await
}

/// Delete an emission record.
pub async fn delete(
    api: &ApiClient,
    company_id: Uuid,
    product_id: Uuid,
    category: EmissionCategory,
    record_id: Uuid,
) -> ApiResult<()> {
    api.delete(&format!(
        "{}{}/",
        base_path(company_id, product_id, category),
        record_id
    ))
    .await
}
