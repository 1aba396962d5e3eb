use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated user profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Access/refresh token pair issued at login and registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer token (~60 minutes).
    pub access: String,
    /// Longer-lived token used to re-issue access tokens.
    pub refresh: String,
}

/// Login credentials.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Registration payload.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Response of the token refresh endpoint. Only the access token is
/// re-issued; the refresh token stays valid until its own expiry.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access: String,
}

/// A company the user belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub vat_number: String,
    pub business_registration_number: String,
}

/// Payload for creating or updating a company.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyInput {
    pub name: String,
    pub vat_number: String,
    pub business_registration_number: String,
}

/// A product owned by a supplier company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    /// Owning (supplier) company.
    pub supplier: Uuid,
    pub name: String,
    pub sku: String,
    pub manufacturer_name: String,
    #[serde(default)]
    pub description: String,
    /// Total PCF in kg CO2e, as last computed by the backend.
    pub emission_total: f64,
    pub emission_total_biogenic: f64,
    pub emission_total_non_biogenic: f64,
    /// Manually supplied emission factors overriding reference data.
    #[serde(default)]
    pub override_emission_factors: Vec<OverrideFactor>,
    /// Whether other companies may reference this product in their BOMs.
    pub is_public: bool,
}

/// A manual emission factor for one lifecycle stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideFactor {
    pub lifecycle_stage: String,
    pub biogenic: f64,
    pub non_biogenic: f64,
}

/// Payload for creating or updating a product.
#[derive(Debug, Clone, Serialize)]
pub struct ProductInput {
    pub name: String,
    pub sku: String,
    pub manufacturer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub override_emission_factors: Vec<OverrideFactor>,
    pub is_public: bool,
}

/// A bill-of-materials entry linking a parent product to a sub-product
/// (or to self-estimated values when `line_item_product` is absent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub id: Uuid,
    pub parent_product: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_item_product: Option<Uuid>,
    /// Multiplier applied to the child's emission total.
    pub quantity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Payload for creating or updating a line item.
#[derive(Debug, Clone, Serialize)]
pub struct LineItemInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_item_product: Option<Uuid>,
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Per-category emission record categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmissionCategory {
    Material,
    Transport,
    UserEnergy,
    ProductionEnergy,
}

impl EmissionCategory {
    /// URL path segment of this category's endpoint family.
    pub fn as_path(&self) -> &'static str {
        match self {
            EmissionCategory::Material => "material_emissions",
            EmissionCategory::Transport => "transport_emissions",
            EmissionCategory::UserEnergy => "user_energy_emissions",
            EmissionCategory::ProductionEnergy => "production_energy_emissions",
        }
    }
}

/// An emission record attributed to one category of a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmissionRecord {
    pub id: Uuid,
    pub quantity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Reference dataset the factor was taken from, when not overridden.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Uuid>,
    #[serde(default)]
    pub override_factors: Vec<OverrideFactor>,
}

/// Payload for creating or updating an emission record.
#[derive(Debug, Clone, Serialize)]
pub struct EmissionRecordInput {
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Uuid>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub override_factors: Vec<OverrideFactor>,
}

/// Export file formats offered by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Json,
    Pdf,
}

impl ExportFormat {
    /// Query-parameter value of this format.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Json => "json",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" => Ok(ExportFormat::Xlsx),
            "json" => Ok(ExportFormat::Json),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

/// AI advice generated for a product's footprint.
#[derive(Debug, Clone, Deserialize)]
pub struct Advice {
    pub advice: String,
}

/// One audit-log entry.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    pub action: String,
    #[serde(default)]
    pub summary: String,
}
