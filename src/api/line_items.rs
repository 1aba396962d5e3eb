//! Bill-of-materials endpoints. A line item links a parent product to a
//! sub-product (or self-estimated values) with a quantity.

use uuid::Uuid;

use super::client::ApiClient;
use super::types::{LineItem, LineItemInput};
use crate::error::ApiResult;

/// Line items composing a product.
pub async fn list(api: &ApiClient, company_id: Uuid, product_id: Uuid) -> ApiResult<Vec<LineItem>> {
    api.get(&format!(
        "/api/companies/{}/products/{}/bom/",
        company_id, product_id
    ))
    .await
}

/// Add a line item to a product's BOM.
pub async fn create(
    api: &ApiClient,
    company_id: Uuid,
    product_id: Uuid,
    input: &LineItemInput,
) -> ApiResult<LineItem> {
    api.post(
        &format!("/api/companies/{}/products/{}/bom/", company_id, product_id),
        input,
    )
    .await
}

/// Update a line item.
pub async fn update(
    api: &ApiClient,
    company_id: Uuid,
    product_id: Uuid,
    line_item_id: Uuid,
    input: &LineItemInput,
) -> ApiResult<LineItem> {
    api.put(
        &format!(
            "/api/companies/{}/products/{}/bom/{}/",
            company_id, product_id, line_item_id
        ),
        input,
    )
    .await
}

/// Remove a line item.
pub async fn delete(
    api: &ApiClient,
    company_id: Uuid,
    product_id: Uuid,
    line_item_id: Uuid,
) -> ApiResult<()> {
    api.delete(&format!(
        "/api/companies/{}/products/{}/bom/{}/",
        company_id, product_id, line_item_id
    ))
    .await
}
