//! # PCF Client
//!
//! Client SDK and CLI for a product carbon-footprint (PCF) calculator
//! backend. The backend computes footprints; this crate owns everything
//! a front-end needs around that: the typed API surface, the
//! token-lifecycle/session state machine, client-side state with change
//! notifications, onboarding flows, and the recursive emission-trace
//! aggregation with its verifiable invariant.
//!
//! ## Architecture
//!
//! ```text
//! CLI / UI → session (token lifecycle) → api (typed REST) → PCF backend
//!                ↓                            ↓
//!            store (state + events)      trace (pure aggregation)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pcf_client::{api::ApiClient, config::Config, session::Session};
//! use pcf_client::store::{FileStore, SessionStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let store = SessionStore::new(Arc::new(FileStore::open(&config.storage.state_path).await?));
//!     let api = ApiClient::new(&config.api, &config.request, store.clone())?;
//!     let session = Arc::new(Session::new(api, store, config.session.clone()));
//!     session.bootstrap().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Typed API client and domain endpoint modules.
pub mod api;
/// Configuration management.
pub mod config;
/// Error types and result aliases for the crate.
pub mod error;
/// Auth/session lifecycle and token handling.
pub mod session;
/// Client-side state store and typed event bus.
pub mod store;
/// Onboarding tour flows and engine.
pub mod tour;
/// Emission-trace model and aggregation.
pub mod trace;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use session::{Session, SessionState};
