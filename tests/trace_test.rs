//! Integration tests for emission-trace aggregation: the aggregation law
//! over realistic nested trees, fetched through the API client.

mod common;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{memory_store, test_client};
use pcf_client::api::products;
use pcf_client::trace::{EmissionSource, EmissionTrace, MentionSeverity};

/// Three-level bicycle fixture: frame (2 kg steel each, 2 per bike),
/// wheels with nested tyres, and transport. All totals are consistent.
fn bicycle_trace() -> serde_json::Value {
    json!({
        "label": "City bike",
        "reference_impact_unit": "piece",
        "source": "Product",
        "methodology": "ISO 14067",
        "emissions_subtotal": {
            "A3": {"biogenic": 0.5, "non_biogenic": 2.5}
        },
        "children": [
            {
                "quantity": 2.0,
                "emission_trace": {
                    "label": "Frame half",
                    "reference_impact_unit": "kg",
                    "source": "Material",
                    "emissions_subtotal": {
                        "A1": {"biogenic": 0.0, "non_biogenic": 4.0}
                    },
                    "children": [],
                    "mentions": [],
                    "total": 4.0
                }
            },
            {
                "quantity": 2.0,
                "emission_trace": {
                    "label": "Wheel",
                    "reference_impact_unit": "piece",
                    "source": "Product",
                    "emissions_subtotal": {
                        "A3": {"biogenic": 0.0, "non_biogenic": 1.0}
                    },
                    "children": [
                        {
                            "quantity": 1.0,
                            "emission_trace": {
                                "label": "Tyre",
                                "reference_impact_unit": "kg",
                                "source": "MaterialReference",
                                "emissions_subtotal": {
                                    "A1": {"biogenic": 1.5, "non_biogenic": 0.5}
                                },
                                "children": [],
                                "mentions": [
                                    {
                                        "severity": "warning",
                                        "message": "No reference data available - used default factor"
                                    }
                                ],
                                "total": 2.0
                            }
                        }
                    ],
                    "mentions": [],
                    "total": 3.0
                }
            },
            {
                "quantity": 1.0,
                "emission_trace": {
                    "label": "Factory to warehouse",
                    "reference_impact_unit": "tkm",
                    "source": "TransportReference",
                    "emissions_subtotal": {
                        "A2": {"biogenic": 0.0, "non_biogenic": 1.2}
                    },
                    "children": [],
                    "mentions": [],
                    "total": 1.2
                }
            }
        ],
        "mentions": [],
        // 3 own + 2*4 frame + 2*3 wheels + 1.2 transport
        "total": 18.2
    })
}

#[tokio::test]
async fn test_fetched_trace_satisfies_aggregation_law() {
    let mock_server = MockServer::start().await;
    let company = uuid::Uuid::new_v4();
    let product = uuid::Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(format!(
            "/api/companies/{company}/products/{product}/emission_trace/"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(bicycle_trace()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = memory_store();
    store.set_tokens("tok", "ref").await.unwrap();
    let api = test_client(&mock_server.uri(), store);

    let trace = products::emission_trace(&api, company, product)
        .await
        .unwrap();

    assert_eq!(trace.source, EmissionSource::Product);
    assert!((trace.computed_total() - 18.2).abs() < 1e-9);
    assert!(trace.verify_totals(1e-9).is_empty());
}

#[tokio::test]
async fn test_flatten_orders_and_weights_rows() {
    let trace: EmissionTrace = serde_json::from_value(bicycle_trace()).unwrap();
    let rows = trace.flatten();

    let labels: Vec<_> = rows.iter().map(|r| r.label).collect();
    assert_eq!(
        labels,
        vec![
            "City bike",
            "Frame half",
            "Wheel",
            "Tyre",
            "Factory to warehouse"
        ]
    );

    // The wheel subtree total (3.0) is doubled by its quantity.
    let wheel = &rows[2];
    assert_eq!(wheel.depth, 1);
    assert_eq!(wheel.quantity, 2.0);
    assert!((wheel.weighted_total - 6.0).abs() < 1e-9);

    // The tyre keeps its own mention; nothing is hoisted to the root.
    assert!(rows[0].mentions.is_empty());
    let tyre = &rows[3];
    assert_eq!(tyre.depth, 2);
    assert_eq!(tyre.mentions.len(), 1);
    assert_eq!(tyre.mentions[0].severity, MentionSeverity::Warning);
}

#[tokio::test]
async fn test_spec_scenario_two_children() {
    // Root subtotals sum to 10; child A quantity 2 total 5, child B
    // quantity 1 total 3: root total must be 23.
    let raw = json!({
        "label": "Root",
        "reference_impact_unit": "piece",
        "source": "Product",
        "emissions_subtotal": {
            "A1": {"biogenic": 3.0, "non_biogenic": 4.0},
            "A3": {"biogenic": 0.0, "non_biogenic": 3.0}
        },
        "children": [
            {
                "quantity": 2.0,
                "emission_trace": {
                    "label": "A",
                    "reference_impact_unit": "kg",
                    "source": "Material",
                    "emissions_subtotal": {"A1": {"biogenic": 2.0, "non_biogenic": 3.0}},
                    "children": [],
                    "mentions": [],
                    "total": 5.0
                }
            },
            {
                "quantity": 1.0,
                "emission_trace": {
                    "label": "B",
                    "reference_impact_unit": "kg",
                    "source": "Transport",
                    "emissions_subtotal": {"A2": {"biogenic": 1.0, "non_biogenic": 2.0}},
                    "children": [],
                    "mentions": [],
                    "total": 3.0
                }
            }
        ],
        "mentions": [],
        "total": 23.0
    });
    let trace: EmissionTrace = serde_json::from_value(raw).unwrap();

    assert_eq!(trace.own_contribution(), 10.0);
    assert_eq!(trace.computed_total(), 23.0);
    assert!(trace.verify_totals(1e-9).is_empty());
}

#[tokio::test]
async fn test_inconsistent_backend_totals_are_reported() {
    let mut value = bicycle_trace();
    value["children"][1]["emission_trace"]["total"] = json!(30.0);
    let trace: EmissionTrace = serde_json::from_value(value).unwrap();

    let violations = trace.verify_totals(1e-9);
    // The wheel node disagrees; ancestors recompute consistently from
    // children so only the lying node is reported.
    assert_eq!(violations.len(), 1);
    assert!(violations[0].to_string().contains("City bike/Wheel"));
}

#[tokio::test]
async fn test_deep_chain_tolerated() {
    // 200 nested single-child nodes, 1 kg CO2e each, quantity 1.
    let mut node = json!({
        "label": "level-0",
        "reference_impact_unit": "kg",
        "source": "Material",
        "emissions_subtotal": {"A1": {"biogenic": 0.0, "non_biogenic": 1.0}},
        "children": [],
        "mentions": [],
        "total": 1.0
    });
    for depth in 1..200 {
        node = json!({
            "label": format!("level-{depth}"),
            "reference_impact_unit": "kg",
            "source": "Product",
            "emissions_subtotal": {"A1": {"biogenic": 0.0, "non_biogenic": 1.0}},
            "children": [{"quantity": 1.0, "emission_trace": node}],
            "mentions": [],
            "total": (depth + 1) as f64
        });
    }
    let trace: EmissionTrace = serde_json::from_value(node).unwrap();

    assert_eq!(trace.computed_total(), 200.0);
    assert!(trace.verify_totals(1e-9).is_empty());
    let rows = trace.flatten();
    assert_eq!(rows.len(), 200);
    // The root row carries the full recomputed subtree total.
    assert!((rows[0].weighted_total - 200.0).abs() < 1e-9);
}
