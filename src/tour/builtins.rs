//! Built-in onboarding flows.

use super::{StepAdvance, TourFlow, TourStep};

/// All built-in flows, in registration order.
pub fn all() -> Vec<TourFlow> {
    vec![getting_started(), product_tour(), emissions_tour()]
}

/// First-login walkthrough: create a company and reach the product list.
/// Chains into the product tour when finished.
pub fn getting_started() -> TourFlow {
    TourFlow {
        id: "getting-started".to_string(),
        title: "Getting started".to_string(),
        steps: vec![
            TourStep {
                page: Some("/companies".to_string()),
                target: Some("#create-company-button".to_string()),
                content: "Create the company you will be entering products for.".to_string(),
                advance: StepAdvance::OnAction("company-created".to_string()),
            },
            TourStep {
                page: Some("/companies".to_string()),
                target: Some("#company-list".to_string()),
                content: "Select your company to make it active for this session.".to_string(),
                advance: StepAdvance::OnAction("company-selected".to_string()),
            },
            TourStep {
                page: Some("/products".to_string()),
                target: None,
                content: "This is your product list. Everything else starts here.".to_string(),
                advance: StepAdvance::Auto,
            },
        ],
        next_flow: Some("product-tour".to_string()),
    }
}

/// Walks through creating a product and filling in its BOM.
pub fn product_tour() -> TourFlow {
    TourFlow {
        id: "product-tour".to_string(),
        title: "Your first product".to_string(),
        steps: vec![
            TourStep {
                page: Some("/products".to_string()),
                target: Some("#add-product-button".to_string()),
                content: "Add a product with its SKU and manufacturer details.".to_string(),
                advance: StepAdvance::OnAction("product-created".to_string()),
            },
            TourStep {
                page: Some("/products".to_string()),
                target: Some("#bom-section".to_string()),
                content: "List the sub-components in the bill of materials; quantities \
                          weight each component's footprint."
                    .to_string(),
                advance: StepAdvance::OnAction("line-item-added".to_string()),
            },
        ],
        next_flow: Some("emissions-tour".to_string()),
    }
}

/// Shows where the computed emission breakdown lives.
pub fn emissions_tour() -> TourFlow {
    TourFlow {
        id: "emissions-tour".to_string(),
        title: "Reading the emission breakdown".to_string(),
        steps: vec![
            TourStep {
                page: Some("/products".to_string()),
                target: Some("#emissions-tree".to_string()),
                content: "Each row breaks the footprint down by source; drill into \
                          children to see how quantities weight their totals."
                    .to_string(),
                advance: StepAdvance::Auto,
            },
            TourStep {
                page: Some("/products".to_string()),
                target: Some("#export-button".to_string()),
                content: "Export the report, or ask for AI reduction advice.".to_string(),
                advance: StepAdvance::Auto,
            },
        ],
        next_flow: None,
    }
}
