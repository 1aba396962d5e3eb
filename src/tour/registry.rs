//! Flow registry: thread-safe storage for tour definitions with the
//! built-in flows registered on creation.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::error;

use super::builtins;
use super::{StepAdvance, TourFlow};

/// Registry of tour flows.
pub struct TourRegistry {
    flows: RwLock<HashMap<String, TourFlow>>,
}

impl TourRegistry {
    /// Create a new registry with built-in flows.
    pub fn new() -> Self {
        let registry = Self {
            flows: RwLock::new(HashMap::new()),
        };
        registry.register_builtins();
        registry
    }

    /// Register a flow.
    ///
    /// # Errors
    /// Returns error if the flow is malformed or its id is taken.
    pub fn register(&self, flow: TourFlow) -> Result<(), String> {
        if flow.id.is_empty() {
            return Err("Flow id is required".to_string());
        }
        if flow.title.is_empty() {
            return Err("Flow title is required".to_string());
        }
        if flow.steps.is_empty() {
            return Err("Flow must have at least one step".to_string());
        }
        for (i, step) in flow.steps.iter().enumerate() {
            if let StepAdvance::OnAction(name) = &step.advance {
                if name.is_empty() {
                    return Err(format!("Step {i} waits on an unnamed action"));
                }
            }
        }

        let mut flows = self.flows.write().unwrap();
        if flows.contains_key(&flow.id) {
            return Err(format!("Flow '{}' already exists", flow.id));
        }

        flows.insert(flow.id.clone(), flow);
        Ok(())
    }

    /// Get a flow by id.
    pub fn get(&self, id: &str) -> Option<TourFlow> {
        self.flows.read().unwrap().get(id).cloned()
    }

    /// Ids of all registered flows, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.flows.read().unwrap().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of registered flows.
    pub fn count(&self) -> usize {
        self.flows.read().unwrap().len()
    }

    fn register_builtins(&self) {
        for flow in builtins::all() {
            let id = flow.id.clone();
            if let Err(e) = self.register(flow) {
                error!(
                    flow = %id,
                    error = %e,
                    "Failed to register builtin flow - this indicates a programming error"
                );
            }
        }
    }
}

impl Default for TourRegistry {
    fn default() -> Self {
        Self::new()
    }
}
