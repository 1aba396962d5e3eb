//! Emission-trace model and aggregation.
//!
//! The backend answers a product-detail request with a recursive tree of
//! emission contributions: each node carries its own per-lifecycle-stage
//! subtotals and an ordered list of children weighted by BOM quantity.
//! The tree is read-only data, finite and acyclic (BOM structures are
//! denormalized into a tree per request), fetched fresh per view and
//! never cached.
//!
//! The backend also precomputes each node's `total`, but this module
//! recomputes totals from the leaves up instead of trusting the field,
//! turning the aggregation law into a checkable invariant:
//!
//! `total == own contribution + Σ(quantity × child total)`

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::TraceError;

/// Kind of contribution a trace node represents. `...Reference` variants
/// mark contributions derived from reference datasets rather than data
/// the supplier entered directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmissionSource {
    Product,
    ProductReference,
    Material,
    MaterialReference,
    Transport,
    TransportReference,
    UserEnergy,
    UserEnergyReference,
    ProductionEnergy,
    ProductionEnergyReference,
    Other,
    OtherReference,
}

impl EmissionSource {
    /// Short human-readable name for rendering.
    pub fn display_name(&self) -> &'static str {
        match self {
            EmissionSource::Product => "Product",
            EmissionSource::ProductReference => "Product (reference)",
            EmissionSource::Material => "Material",
            EmissionSource::MaterialReference => "Material (reference)",
            EmissionSource::Transport => "Transport",
            EmissionSource::TransportReference => "Transport (reference)",
            EmissionSource::UserEnergy => "User energy",
            EmissionSource::UserEnergyReference => "User energy (reference)",
            EmissionSource::ProductionEnergy => "Production energy",
            EmissionSource::ProductionEnergyReference => "Production energy (reference)",
            EmissionSource::Other => "Other",
            EmissionSource::OtherReference => "Other (reference)",
        }
    }
}

/// Biogenic/non-biogenic split of a subtotal, in kg CO2e.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SubtotalSplit {
    pub biogenic: f64,
    pub non_biogenic: f64,
}

impl SubtotalSplit {
    /// Combined contribution of both carbon origins.
    pub fn combined(&self) -> f64 {
        self.biogenic + self.non_biogenic
    }
}

/// Severity of an annotation attached to a trace node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentionSeverity {
    Info,
    Warning,
    Error,
}

/// An annotation qualifying one specific contribution, e.g. "no reference
/// data available - used default factor". Mentions belong to the node
/// they were attached to and are never hoisted to the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    pub severity: MentionSeverity,
    pub message: String,
}

/// A child contribution weighted by BOM quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceChild {
    /// The child's own trace subtree.
    #[serde(rename = "emission_trace")]
    pub trace: EmissionTrace,
    /// Multiplier applied to the child's emission total.
    pub quantity: f64,
}

/// One node of the recursive emission breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmissionTrace {
    pub label: String,
    /// Unit the impact refers to, e.g. "kg" or "piece".
    pub reference_impact_unit: String,
    pub source: EmissionSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methodology: Option<String>,
    /// Per-lifecycle-stage subtotals contributed by this node itself,
    /// keyed by stage code (e.g. "A1", "A3", "B1").
    #[serde(default)]
    pub emissions_subtotal: BTreeMap<String, SubtotalSplit>,
    /// Ordered children; insertion order reflects BOM ordering and is
    /// preserved through aggregation and rendering.
    #[serde(default)]
    pub children: Vec<TraceChild>,
    #[serde(default)]
    pub mentions: Vec<Mention>,
    /// Aggregate precomputed by the backend. Display-only; use
    /// [`EmissionTrace::computed_total`] for anything that matters.
    pub total: f64,
}

impl EmissionTrace {
    /// This node's direct contribution: the sum over all subtotal
    /// entries of biogenic + non-biogenic.
    pub fn own_contribution(&self) -> f64 {
        self.emissions_subtotal
            .values()
            .map(SubtotalSplit::combined)
            .sum()
    }

    /// Recompute the aggregate from the leaves up, depth-first.
    ///
    /// Leaves have no children, so their total equals their own
    /// contribution.
    pub fn computed_total(&self) -> f64 {
        self.own_contribution()
            + self
                .children
                .iter()
                .map(|child| child.quantity * child.trace.computed_total())
                .sum::<f64>()
    }

    /// Check every node's reported `total` against the recomputed one.
    ///
    /// Returns one error per disagreeing node, identified by its
    /// slash-separated label path from the root. An empty result means
    /// the backend's aggregation is consistent.
    pub fn verify_totals(&self, epsilon: f64) -> Vec<TraceError> {
        let mut violations = Vec::new();
        self.verify_node(self.label.clone(), epsilon, &mut violations);
        violations
    }

    /// Single bottom-up pass: checks the subtree rooted here and returns
    /// its recomputed total so each node is visited exactly once.
    fn verify_node(&self, path: String, epsilon: f64, violations: &mut Vec<TraceError>) -> f64 {
        let mut computed = self.own_contribution();
        for child in &self.children {
            let child_total = child.trace.verify_node(
                format!("{}/{}", path, child.trace.label),
                epsilon,
                violations,
            );
            computed += child.quantity * child_total;
        }
        if (computed - self.total).abs() > epsilon {
            violations.push(TraceError::TotalMismatch {
                path,
                reported: self.total,
                computed,
            });
        }
        computed
    }

    /// Flatten the tree into ordered drill-down rows.
    ///
    /// Depth-first, children in supplied order. Each row carries the
    /// quantity multiplier its parent applies to it (1 for the root) and
    /// the mentions attached to that exact node.
    pub fn flatten(&self) -> Vec<TraceRow<'_>> {
        let mut rows = Vec::new();
        self.flatten_into(0, 1.0, &mut rows);
        rows
    }

    /// Single bottom-up pass: the row is pushed pre-order to keep BOM
    /// ordering, its weighted total patched in once the subtree total is
    /// known, and that total returned to the parent.
    fn flatten_into<'a>(&'a self, depth: usize, quantity: f64, rows: &mut Vec<TraceRow<'a>>) -> f64 {
        let index = rows.len();
        rows.push(TraceRow {
            depth,
            label: &self.label,
            source: self.source,
            unit: &self.reference_impact_unit,
            quantity,
            own_contribution: self.own_contribution(),
            weighted_total: 0.0,
            subtotals: &self.emissions_subtotal,
            mentions: &self.mentions,
        });
        let mut total = self.own_contribution();
        for child in &self.children {
            total += child.quantity * child.trace.flatten_into(depth + 1, child.quantity, rows);
        }
        rows[index].weighted_total = quantity * total;
        total
    }
}

/// One row of the drill-down rendering of a trace.
#[derive(Debug, Clone)]
pub struct TraceRow<'a> {
    /// Nesting level, 0 for the root.
    pub depth: usize,
    pub label: &'a str,
    pub source: EmissionSource,
    pub unit: &'a str,
    /// Multiplier the parent applies to this subtree.
    pub quantity: f64,
    /// The node's direct contribution across all lifecycle stages.
    pub own_contribution: f64,
    /// Recomputed subtree total times the quantity multiplier.
    pub weighted_total: f64,
    /// Per-stage splits of the node's direct contribution.
    pub subtotals: &'a BTreeMap<String, SubtotalSplit>,
    /// Annotations qualifying this specific contribution.
    pub mentions: &'a [Mention],
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(label: &str, source: EmissionSource, stages: &[(&str, f64, f64)]) -> EmissionTrace {
        let subtotals: BTreeMap<String, SubtotalSplit> = stages
            .iter()
            .map(|(stage, bio, non_bio)| {
                (
                    stage.to_string(),
                    SubtotalSplit {
                        biogenic: *bio,
                        non_biogenic: *non_bio,
                    },
                )
            })
            .collect();
        let total = subtotals.values().map(SubtotalSplit::combined).sum();
        EmissionTrace {
            label: label.to_string(),
            reference_impact_unit: "kg".to_string(),
            source,
            methodology: None,
            emissions_subtotal: subtotals,
            children: Vec::new(),
            mentions: Vec::new(),
            total,
        }
    }

    #[test]
    fn test_leaf_total_is_own_contribution() {
        let node = leaf(
            "Steel",
            EmissionSource::MaterialReference,
            &[("A1", 1.5, 4.5), ("A3", 0.0, 2.0)],
        );
        assert_eq!(node.own_contribution(), 8.0);
        assert_eq!(node.computed_total(), 8.0);
        assert!(node.verify_totals(1e-9).is_empty());
    }

    #[test]
    fn test_aggregation_law_two_children() {
        // Root subtotals sum to 10; child A (quantity 2, total 5) and
        // child B (quantity 1, total 3) give 10 + 2*5 + 1*3 = 23.
        let child_a = leaf("Child A", EmissionSource::Material, &[("A1", 2.0, 3.0)]);
        let child_b = leaf("Child B", EmissionSource::Transport, &[("A2", 0.0, 3.0)]);
        let root = EmissionTrace {
            label: "Widget".to_string(),
            reference_impact_unit: "piece".to_string(),
            source: EmissionSource::Product,
            methodology: None,
            emissions_subtotal: [(
                "A3".to_string(),
                SubtotalSplit {
                    biogenic: 4.0,
                    non_biogenic: 6.0,
                },
            )]
            .into_iter()
            .collect(),
            children: vec![
                TraceChild {
                    trace: child_a,
                    quantity: 2.0,
                },
                TraceChild {
                    trace: child_b,
                    quantity: 1.0,
                },
            ],
            mentions: Vec::new(),
            total: 23.0,
        };

        assert_eq!(root.own_contribution(), 10.0);
        assert_eq!(root.computed_total(), 23.0);
        assert!(root.verify_totals(1e-9).is_empty());
    }

    #[test]
    fn test_verify_reports_mismatch_with_path() {
        let mut child = leaf("Bolt", EmissionSource::Material, &[("A1", 0.0, 1.0)]);
        child.total = 99.0; // deliberately wrong
        let root = EmissionTrace {
            label: "Frame".to_string(),
            reference_impact_unit: "piece".to_string(),
            source: EmissionSource::Product,
            methodology: None,
            emissions_subtotal: BTreeMap::new(),
            children: vec![TraceChild {
                trace: child,
                quantity: 4.0,
            }],
            mentions: Vec::new(),
            total: 4.0,
        };

        let violations = root.verify_totals(1e-9);
        assert_eq!(violations.len(), 1);
        match &violations[0] {
            TraceError::TotalMismatch {
                path,
                reported,
                computed,
            } => {
                assert_eq!(path, "Frame/Bolt");
                assert_eq!(*reported, 99.0);
                assert_eq!(*computed, 1.0);
            }
        }
    }

    #[test]
    fn test_flatten_preserves_bom_order() {
        let root = EmissionTrace {
            label: "Root".to_string(),
            reference_impact_unit: "piece".to_string(),
            source: EmissionSource::Product,
            methodology: None,
            emissions_subtotal: BTreeMap::new(),
            children: vec![
                TraceChild {
                    // Smaller contribution listed first must stay first.
                    trace: leaf("Zinc coating", EmissionSource::Material, &[("A1", 0.0, 0.1)]),
                    quantity: 1.0,
                },
                TraceChild {
                    trace: leaf("Steel body", EmissionSource::Material, &[("A1", 0.0, 9.0)]),
                    quantity: 1.0,
                },
            ],
            mentions: Vec::new(),
            total: 9.1,
        };

        let rows = root.flatten();
        let labels: Vec<_> = rows.iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["Root", "Zinc coating", "Steel body"]);
        assert_eq!(rows[1].depth, 1);
        assert_eq!(rows[2].weighted_total, 9.0);
    }

    #[test]
    fn test_mentions_stay_on_their_node() {
        let mut child = leaf("Foam", EmissionSource::MaterialReference, &[("A1", 0.0, 2.0)]);
        child.mentions.push(Mention {
            severity: MentionSeverity::Warning,
            message: "No reference data available - used default factor".to_string(),
        });
        let root = EmissionTrace {
            label: "Seat".to_string(),
            reference_impact_unit: "piece".to_string(),
            source: EmissionSource::Product,
            methodology: None,
            emissions_subtotal: BTreeMap::new(),
            children: vec![TraceChild {
                trace: child,
                quantity: 1.0,
            }],
            mentions: Vec::new(),
            total: 2.0,
        };

        let rows = root.flatten();
        assert!(rows[0].mentions.is_empty());
        assert_eq!(rows[1].mentions.len(), 1);
        assert_eq!(rows[1].mentions[0].severity, MentionSeverity::Warning);
    }

    #[test]
    fn test_deserializes_backend_shape() {
        let raw = r#"{
            "label": "Bike",
            "reference_impact_unit": "piece",
            "source": "Product",
            "methodology": "ISO 14067",
            "emissions_subtotal": {"A1": {"biogenic": 1.0, "non_biogenic": 2.0}},
            "children": [
                {
                    "emission_trace": {
                        "label": "Frame",
                        "reference_impact_unit": "kg",
                        "source": "MaterialReference",
                        "emissions_subtotal": {"A1": {"biogenic": 0.0, "non_biogenic": 5.0}},
                        "mentions": [{"severity": "warning", "message": "default factor"}],
                        "total": 5.0
                    },
                    "quantity": 2.0
                }
            ],
            "total": 13.0
        }"#;
        let trace: EmissionTrace = serde_json::from_str(raw).unwrap();
        assert_eq!(trace.source, EmissionSource::Product);
        assert_eq!(trace.computed_total(), 13.0);
        assert!(trace.verify_totals(1e-9).is_empty());
        assert_eq!(trace.children[0].trace.mentions[0].message, "default factor");
    }
}
