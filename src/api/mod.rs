//! Typed access to the PCF backend.
//!
//! [`client::ApiClient`] is the single HTTP wrapper; the submodules map
//! REST endpoint families to typed functions and hold no business logic.
//! Errors are never caught here; the session layer and callers classify
//! them.

pub mod audit;
pub mod auth;
pub mod client;
pub mod companies;
pub mod emissions;
pub mod line_items;
pub mod products;
pub mod types;
pub mod users;

pub use client::{ApiClient, Auth};
