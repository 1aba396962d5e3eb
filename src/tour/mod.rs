//! Step-sequenced onboarding flows.
//!
//! A flow is a fixed ordered list of steps; a step may name the page it
//! belongs to, a target element on that page, and either auto-advances
//! or waits for a named user action. Progress (`{flow, step}`) is
//! persisted in the session store so a flow survives full page
//! navigations and is resumed on the next mount; completion is recorded
//! per user and survives logout.

mod builtins;
mod registry;

pub use registry::TourRegistry;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::store::{keys, SessionStore, StoreEvent};

/// How a step is left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAdvance {
    /// The step advances as soon as the user acknowledges it.
    Auto,
    /// The step waits for this named user action.
    OnAction(String),
}

/// One step of a flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TourStep {
    /// Path of the page the step belongs to, `None` for anywhere.
    pub page: Option<String>,
    /// Selector of the element the overlay points at.
    pub target: Option<String>,
    /// Copy shown to the user.
    pub content: String,
    pub advance: StepAdvance,
}

/// A fixed ordered sequence of steps, optionally chaining into another
/// flow on completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TourFlow {
    pub id: String,
    pub title: String,
    pub steps: Vec<TourStep>,
    pub next_flow: Option<String>,
}

/// Persisted progress of the active flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourState {
    pub flow: String,
    pub step: usize,
}

/// Drives flows against the registry and the session store.
pub struct TourEngine {
    registry: Arc<TourRegistry>,
    store: SessionStore,
}

impl TourEngine {
    /// Create an engine over a registry and store.
    pub fn new(registry: Arc<TourRegistry>, store: SessionStore) -> Self {
        Self { registry, store }
    }

    /// The registry this engine draws flows from.
    pub fn registry(&self) -> &TourRegistry {
        &self.registry
    }

    /// Progress of the active flow, if one is running.
    ///
    /// An unparseable persisted state is treated as no active flow.
    pub async fn state(&self) -> Option<TourState> {
        let raw = self.store.get(keys::TOUR_STATE).await?;
        match serde_json::from_str(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(error = %e, "Unreadable tour state, discarding");
                None
            }
        }
    }

    /// The step the active flow currently points at.
    pub async fn current_step(&self) -> Option<(TourState, TourStep)> {
        let state = self.state().await?;
        let flow = self.registry.get(&state.flow)?;
        let step = flow.steps.get(state.step)?.clone();
        Some((state, step))
    }

    /// Start a flow for the user, unless they already completed it.
    ///
    /// Returns the initial state, or `None` when the flow was skipped.
    pub async fn start(&self, user_id: &str, flow_id: &str) -> AppResult<Option<TourState>> {
        let Some(_flow) = self.registry.get(flow_id) else {
            return Err(AppError::Internal {
                message: format!("Unknown tour flow: {flow_id}"),
            });
        };
        if self.store.completed_flows(user_id).await.contains(flow_id) {
            debug!(flow = %flow_id, "Flow already completed, not starting");
            return Ok(None);
        }

        let state = TourState {
            flow: flow_id.to_string(),
            step: 0,
        };
        self.persist(&state).await?;
        Ok(Some(state))
    }

    /// Advance the active flow one step.
    ///
    /// Leaving the final step completes the flow: the per-user completion
    /// set is updated, progress is cleared, and a declared `next_flow` is
    /// started (unless itself already completed).
    pub async fn next(&self, user_id: &str) -> AppResult<Option<TourState>> {
        let Some(state) = self.state().await else {
            return Ok(None);
        };
        let Some(flow) = self.registry.get(&state.flow) else {
            self.dismiss().await?;
            return Ok(None);
        };

        let next_index = state.step + 1;
        if next_index < flow.steps.len() {
            let state = TourState {
                flow: state.flow,
                step: next_index,
            };
            self.persist(&state).await?;
            return Ok(Some(state));
        }

        // Final step left: complete and optionally chain.
        self.store.mark_flow_complete(user_id, &flow.id).await?;
        self.store.remove(keys::TOUR_STATE).await?;
        if let Some(next_flow) = &flow.next_flow {
            return self.start(user_id, next_flow).await;
        }
        Ok(None)
    }

    /// Step back within the active flow, saturating at the first step.
    pub async fn prev(&self) -> AppResult<Option<TourState>> {
        let Some(state) = self.state().await else {
            return Ok(None);
        };
        if state.step == 0 {
            return Ok(Some(state));
        }
        let state = TourState {
            flow: state.flow,
            step: state.step - 1,
        };
        self.persist(&state).await?;
        Ok(Some(state))
    }

    /// React to a named user action.
    ///
    /// Advances only when the active step is waiting for exactly this
    /// action; anything else is ignored.
    pub async fn handle_action(&self, user_id: &str, action: &str) -> AppResult<Option<TourState>> {
        let Some((_, step)) = self.current_step().await else {
            return Ok(None);
        };
        match &step.advance {
            StepAdvance::OnAction(expected) if expected == action => self.next(user_id).await,
            _ => Ok(self.state().await),
        }
    }

    /// Resume the active flow after a navigation-triggered remount.
    ///
    /// Returns the current step when its declared page matches `path`
    /// (or declares no page); otherwise the overlay stays hidden but the
    /// persisted progress is kept.
    pub async fn resume_on_page(&self, path: &str) -> Option<(TourState, TourStep)> {
        let (state, step) = self.current_step().await?;
        match &step.page {
            Some(page) if page != path => None,
            _ => Some((state, step)),
        }
    }

    /// Abandon the active flow without marking it complete.
    pub async fn dismiss(&self) -> AppResult<()> {
        self.store.remove(keys::TOUR_STATE).await?;
        Ok(())
    }

    async fn persist(&self, state: &TourState) -> AppResult<()> {
        let raw = serde_json::to_string(state).map_err(|e| AppError::Internal {
            message: e.to_string(),
        })?;
        self.store.set(keys::TOUR_STATE, &raw).await?;
        self.store.emit(StoreEvent::TourAdvanced {
            flow: state.flow.clone(),
            step: state.step,
        });
        Ok(())
    }
}

/// Poll `probe` until it succeeds or `timeout` elapses.
///
/// Stands in for the DOM mutation-observer retry of the original UI:
/// the deadline bounds the search, and there is nothing left running
/// after this returns, on any path.
pub async fn wait_for_target<F>(mut probe: F, timeout: Duration, poll: Duration) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if probe() {
            return true;
        }
        if tokio::time::Instant::now() + poll > deadline {
            return false;
        }
        tokio::time::sleep(poll).await;
    }
}
