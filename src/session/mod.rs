//! Auth/session lifecycle.
//!
//! Owns the current user, the stored token pair and every transition
//! between them. Each entry point that can fail degrades to a safe state
//! (no partial or stale session) rather than leaving an
//! authenticated-but-broken limbo.
//!
//! Token refresh is a single coalesced operation: every refresh path
//! (on-demand, bootstrap, the recurring timer) goes through one async
//! mutex, and callers re-check the stored token after acquiring it, so
//! at most one refresh request is ever in flight and a timer tick racing
//! an on-demand refresh issues no second request.

pub mod token;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::types::{LoginRequest, RegisterRequest, User};
use crate::api::{auth, users, ApiClient};
use crate::config::SessionConfig;
use crate::error::{ApiError, AppResult, AuthError, AuthResult};
use crate::store::SessionStore;

/// Where the session currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// No user; no usable tokens are assumed.
    Unauthenticated,
    /// A stored token exists and is being validated against the backend.
    Checking,
    /// A profile was fetched with a live token.
    Authenticated(User),
}

/// Session manager tying the API client, the state store and the token
/// lifecycle together.
pub struct Session {
    api: ApiClient,
    store: SessionStore,
    config: SessionConfig,
    state: RwLock<SessionState>,
    /// Serializes refreshes and remembers when the last one succeeded,
    /// so a caller queued behind an in-flight refresh can skip its own.
    refresh_gate: Mutex<Option<Instant>>,
}

impl Session {
    /// Create a session manager in the unauthenticated state.
    pub fn new(api: ApiClient, store: SessionStore, config: SessionConfig) -> Self {
        Self {
            api,
            store,
            config,
            state: RwLock::new(SessionState::Unauthenticated),
            refresh_gate: Mutex::new(None),
        }
    }

    /// Current state snapshot.
    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// The authenticated user, if any.
    pub async fn current_user(&self) -> Option<User> {
        match &*self.state.read().await {
            SessionState::Authenticated(user) => Some(user.clone()),
            _ => None,
        }
    }

    /// The store this session reads tokens from.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Resolve the stored tokens into a definite state on startup.
    ///
    /// With nothing stored this resolves immediately, without network
    /// traffic. A stored-but-expired access token is refreshed before
    /// the profile fetch; a profile fetch rejected with 401 (token
    /// revoked server-side) gets exactly one refresh-and-retry before
    /// the session gives up and logs out.
    pub async fn bootstrap(&self) -> AppResult<SessionState> {
        let access = self.store.access_token().await;
        let refresh = self.store.refresh_token().await;

        if access.is_none() && refresh.is_none() {
            *self.state.write().await = SessionState::Unauthenticated;
            return Ok(SessionState::Unauthenticated);
        }

        *self.state.write().await = SessionState::Checking;

        let needs_refresh = match &access {
            Some(tok) => token::is_expired(tok, self.config.expiry_leeway_secs),
            None => true,
        };
        if needs_refresh && !self.refresh().await {
            info!("Stored tokens unusable, starting unauthenticated");
            return self.give_up().await;
        }

        match users::profile(&self.api).await {
            Ok(user) => self.establish(user).await,
            Err(ApiError::Status { status: 401, .. }) => {
                debug!("Profile fetch rejected, attempting one refresh-and-retry");
                if !self.refresh().await {
                    return self.give_up().await;
                }
                match users::profile(&self.api).await {
                    Ok(user) => self.establish(user).await,
                    Err(e) => {
                        warn!(error = %e, "Profile fetch failed after refresh, logging out");
                        self.give_up().await
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Profile fetch failed, logging out");
                self.give_up().await
            }
        }
    }

    /// Exchange credentials for a session.
    ///
    /// On any failure partial token state is cleared before the
    /// classified error is returned.
    pub async fn login(&self, credentials: &LoginRequest) -> AuthResult<User> {
        let pair = match auth::login(&self.api, credentials).await {
            Ok(pair) => pair,
            Err(e) => {
                self.discard_tokens().await;
                return Err(AuthError::classify(&e, true));
            }
        };

        if self.store.set_tokens(&pair.access, &pair.refresh).await.is_err() {
            self.discard_tokens().await;
            return Err(AuthError::Server { status: 0 });
        }

        match users::profile(&self.api).await {
            Ok(user) => {
                *self.state.write().await = SessionState::Authenticated(user.clone());
                info!(user = %user.username, "Login succeeded");
                Ok(user)
            }
            Err(e) => {
                self.discard_tokens().await;
                Err(AuthError::classify(&e, true))
            }
        }
    }

    /// Create an account and open a session for it. Marks the new-user
    /// flag consumed by onboarding.
    pub async fn register(&self, data: &RegisterRequest) -> AuthResult<User> {
        let pair = match auth::register(&self.api, data).await {
            Ok(pair) => pair,
            Err(e) => {
                self.discard_tokens().await;
                return Err(AuthError::classify(&e, true));
            }
        };

        if self.store.set_tokens(&pair.access, &pair.refresh).await.is_err() {
            self.discard_tokens().await;
            return Err(AuthError::Server { status: 0 });
        }
        if let Err(e) = self.store.set_new_user().await {
            warn!(error = %e, "Could not persist new-user flag");
        }

        match users::profile(&self.api).await {
            Ok(user) => {
                *self.state.write().await = SessionState::Authenticated(user.clone());
                info!(user = %user.username, "Registration succeeded");
                Ok(user)
            }
            Err(e) => {
                self.discard_tokens().await;
                Err(AuthError::classify(&e, true))
            }
        }
    }

    /// Drop the session: clears every session-scoped store key (tokens,
    /// selected company, in-progress assessment) while preserving
    /// long-lived per-user data, then resets the state.
    pub async fn logout(&self) -> AppResult<()> {
        self.store.clear_session().await?;
        *self.state.write().await = SessionState::Unauthenticated;
        info!("Logged out");
        Ok(())
    }

    /// Exchange the stored refresh token for a new access token, behind
    /// the coalescing gate.
    ///
    /// Concurrent callers serialize on the gate, and one finding that a
    /// refresh completed within the expiry leeway window skips its own
    /// request: a timer tick racing an on-demand refresh issues no
    /// second POST. Returns whether a usable access token is now stored.
    pub async fn refresh(&self) -> bool {
        let mut last = self.refresh_gate.lock().await;
        if just_refreshed(*last, self.config.expiry_leeway_secs) {
            return true;
        }
        let refreshed = self.request_refresh().await;
        if refreshed {
            *last = Some(Instant::now());
        }
        refreshed
    }

    /// Perform the refresh request itself. Callers must hold the gate.
    ///
    /// A 401/403 from the refresh endpoint means the refresh token
    /// itself is dead, so both tokens are cleared immediately; retrying
    /// would not help.
    async fn request_refresh(&self) -> bool {
        let Some(refresh_token) = self.store.refresh_token().await else {
            return false;
        };

        match auth::refresh(&self.api, &refresh_token).await {
            Ok(token) => match self.store.set_access_token(&token.access).await {
                Ok(()) => {
                    debug!("Access token refreshed");
                    true
                }
                Err(e) => {
                    warn!(error = %e, "Could not persist refreshed access token");
                    false
                }
            },
            Err(e) => {
                if matches!(e.status(), 401 | 403) {
                    info!("Refresh token rejected, clearing token pair");
                    self.discard_tokens().await;
                } else {
                    warn!(error = %e, "Token refresh failed");
                }
                false
            }
        }
    }

    /// Produce an access token that is valid right now, refreshing at
    /// most once.
    ///
    /// Callers arriving while a refresh is in flight wait on the gate
    /// and find the fresh token on their re-check instead of issuing a
    /// second refresh request.
    pub async fn ensure_valid_token(&self) -> AuthResult<String> {
        if let Some(tok) = self.store.access_token().await {
            if !token::is_expired(&tok, self.config.expiry_leeway_secs) {
                return Ok(tok);
            }
        }

        let mut last = self.refresh_gate.lock().await;

        // Someone else may have refreshed while we waited for the gate.
        if let Some(tok) = self.store.access_token().await {
            if !token::is_expired(&tok, self.config.expiry_leeway_secs) {
                return Ok(tok);
            }
        }

        if self.request_refresh().await {
            *last = Some(Instant::now());
            if let Some(tok) = self.store.access_token().await {
                return Ok(tok);
            }
        }
        Err(AuthError::SessionExpired)
    }

    /// Start the recurring background refresh.
    ///
    /// Runs while a user is present, at the configured interval (45
    /// minutes by default, against a 60-minute token lifetime). Each
    /// tick goes through the coalescing gate like every other refresh
    /// path. Failures are logged and never surfaced; the next API call
    /// detects expiry on its own.
    pub fn spawn_refresh_task(self: &Arc<Self>) -> JoinHandle<()> {
        let session = Arc::clone(self);
        let period = std::time::Duration::from_secs(session.config.refresh_interval_secs);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            interval.tick().await; // first tick fires immediately, skip it
            loop {
                interval.tick().await;
                if session.current_user().await.is_none() {
                    continue;
                }
                if !session.refresh().await {
                    debug!("Opportunistic token refresh failed");
                }
            }
        })
    }

    async fn establish(&self, user: User) -> AppResult<SessionState> {
        let state = SessionState::Authenticated(user);
        *self.state.write().await = state.clone();
        Ok(state)
    }

    async fn give_up(&self) -> AppResult<SessionState> {
        self.store.clear_session().await?;
        *self.state.write().await = SessionState::Unauthenticated;
        Ok(SessionState::Unauthenticated)
    }

    async fn discard_tokens(&self) {
        if let Err(e) = self.store.clear_tokens().await {
            warn!(error = %e, "Could not clear tokens");
        }
        *self.state.write().await = SessionState::Unauthenticated;
    }
}

/// Whether a refresh succeeded within the leeway window, making another
/// one pointless.
fn just_refreshed(last: Option<Instant>, leeway_secs: i64) -> bool {
    let window = Duration::from_secs(leeway_secs.max(0) as u64);
    last.map_or(false, |at| at.elapsed() < window)
}
