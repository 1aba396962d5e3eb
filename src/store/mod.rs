//! Client-side state: tokens, the selected company, tour progress.
//!
//! The browser original kept this in ambient local storage and broadcast
//! changes as stringly-typed DOM events. Here the storage is an injected
//! [`StateStore`] (file-backed in production, in-memory in tests) and the
//! event bus is a typed broadcast channel, so both can be observed and
//! faked deterministically.

mod backend;

pub use backend::{FileStore, MemoryStore};

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::warn;

use crate::error::StoreResult;

/// Well-known state keys.
pub mod keys {
    /// Short-lived bearer token.
    pub const ACCESS_TOKEN: &str = "access_token";
    /// Long-lived token exchanged for new access tokens.
    pub const REFRESH_TOKEN: &str = "refresh_token";
    /// Id of the company the user is currently working in.
    pub const SELECTED_COMPANY: &str = "selected_company";
    /// Id of an assessment the user left half-finished.
    pub const ASSESSMENT_ID: &str = "assessment_id";
    /// Set after registration, consumed once by onboarding.
    pub const NEW_USER: &str = "new_user";
    /// Persisted `{flow, step}` of an in-progress tour.
    pub const TOUR_STATE: &str = "tour_state";
    /// Prefix of the per-user completed-flows set. Survives logout.
    pub const TOUR_COMPLETED_PREFIX: &str = "tour_completed:";
}

/// Keyed string storage the session layer is injected with.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read a value, `None` when the key is absent.
    async fn get(&self, key: &str) -> Option<String>;
    /// Write a value, overwriting any previous one.
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    /// Remove a key. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> StoreResult<()>;
}

/// Change notifications broadcast to interested components.
///
/// Consumers must tolerate lagging (the channel drops the oldest events
/// under backpressure) and should treat every event as a hint to re-read
/// the store, not as the value itself.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// The selected company changed. Carries the new id, `None` when cleared.
    CompanyChanged(Option<String>),
    /// The set of companies the user belongs to changed.
    CompanyListChanged,
    /// A product was created, updated or deleted.
    ProductListChanged,
    /// The active tour moved to a new step.
    TourAdvanced { flow: String, step: usize },
    /// A tour flow was completed.
    TourCompleted { flow: String },
    /// Logout wiped all session-scoped keys.
    SessionCleared,
}

/// Typed facade over a [`StateStore`] plus the event bus.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<dyn StateStore>,
    events: broadcast::Sender<StoreEvent>,
}

impl SessionStore {
    /// Wrap a backing store. The event channel keeps the last 64 events
    /// for slow subscribers.
    pub fn new(inner: Arc<dyn StateStore>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self { inner, events }
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Broadcast an event. A send error only means nobody is listening.
    pub fn emit(&self, event: StoreEvent) {
        let _ = self.events.send(event);
    }

    /// Raw read, for keys without a typed accessor.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).await
    }

    /// Raw write.
    pub async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.inner.set(key, value).await
    }

    /// Raw removal.
    pub async fn remove(&self, key: &str) -> StoreResult<()> {
        self.inner.remove(key).await
    }

    /// Current access token, if any.
    pub async fn access_token(&self) -> Option<String> {
        self.inner.get(keys::ACCESS_TOKEN).await
    }

    /// Current refresh token, if any.
    pub async fn refresh_token(&self) -> Option<String> {
        self.inner.get(keys::REFRESH_TOKEN).await
    }

    /// Persist both tokens of a freshly issued pair.
    pub async fn set_tokens(&self, access: &str, refresh: &str) -> StoreResult<()> {
        self.inner.set(keys::ACCESS_TOKEN, access).await?;
        self.inner.set(keys::REFRESH_TOKEN, refresh).await
    }

    /// Replace only the access token, keeping the refresh token.
    pub async fn set_access_token(&self, access: &str) -> StoreResult<()> {
        self.inner.set(keys::ACCESS_TOKEN, access).await
    }

    /// Drop both tokens. Used when the refresh token itself is rejected.
    pub async fn clear_tokens(&self) -> StoreResult<()> {
        self.inner.remove(keys::ACCESS_TOKEN).await?;
        self.inner.remove(keys::REFRESH_TOKEN).await
    }

    /// Id of the currently selected company.
    pub async fn selected_company(&self) -> Option<String> {
        self.inner.get(keys::SELECTED_COMPANY).await
    }

    /// Select a company (or clear the selection with `None`).
    ///
    /// Writing the value already held is a no-op and emits nothing;
    /// an actual change emits exactly one [`StoreEvent::CompanyChanged`].
    pub async fn set_selected_company(&self, company_id: Option<&str>) -> StoreResult<()> {
        let current = self.selected_company().await;
        if current.as_deref() == company_id {
            return Ok(());
        }
        match company_id {
            Some(id) => self.inner.set(keys::SELECTED_COMPANY, id).await?,
            None => self.inner.remove(keys::SELECTED_COMPANY).await?,
        }
        self.emit(StoreEvent::CompanyChanged(
            company_id.map(|s| s.to_string()),
        ));
        Ok(())
    }

    /// Id of the assessment the user left in progress.
    pub async fn assessment_id(&self) -> Option<String> {
        self.inner.get(keys::ASSESSMENT_ID).await
    }

    /// Remember an in-progress assessment.
    pub async fn set_assessment_id(&self, id: &str) -> StoreResult<()> {
        self.inner.set(keys::ASSESSMENT_ID, id).await
    }

    /// Mark the user as freshly registered.
    pub async fn set_new_user(&self) -> StoreResult<()> {
        self.inner.set(keys::NEW_USER, "1").await
    }

    /// Consume the new-user flag, returning whether it was set.
    pub async fn take_new_user(&self) -> StoreResult<bool> {
        let set = self.inner.get(keys::NEW_USER).await.is_some();
        if set {
            self.inner.remove(keys::NEW_USER).await?;
        }
        Ok(set)
    }

    /// Flows the given user has completed. Persisted indefinitely.
    pub async fn completed_flows(&self, user_id: &str) -> HashSet<String> {
        let key = format!("{}{}", keys::TOUR_COMPLETED_PREFIX, user_id);
        match self.inner.get(&key).await {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, user = %user_id, "Unreadable tour-completion set, resetting");
                HashSet::new()
            }),
            None => HashSet::new(),
        }
    }

    /// Record a completed flow for the user.
    pub async fn mark_flow_complete(&self, user_id: &str, flow_id: &str) -> StoreResult<()> {
        let mut flows = self.completed_flows(user_id).await;
        if flows.insert(flow_id.to_string()) {
            let key = format!("{}{}", keys::TOUR_COMPLETED_PREFIX, user_id);
            let raw = serde_json::to_string(&flows).map_err(|e| crate::error::StoreError::Write {
                message: e.to_string(),
            })?;
            self.inner.set(&key, &raw).await?;
            self.emit(StoreEvent::TourCompleted {
                flow: flow_id.to_string(),
            });
        }
        Ok(())
    }

    /// Wipe every session-scoped key on logout.
    ///
    /// Per-user tour-completion sets are long-lived and deliberately
    /// survive this.
    pub async fn clear_session(&self) -> StoreResult<()> {
        for key in [
            keys::ACCESS_TOKEN,
            keys::REFRESH_TOKEN,
            keys::SELECTED_COMPANY,
            keys::ASSESSMENT_ID,
            keys::NEW_USER,
            keys::TOUR_STATE,
        ] {
            self.inner.remove(key).await?;
        }
        self.emit(StoreEvent::SessionCleared);
        Ok(())
    }
}
