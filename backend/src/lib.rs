//! Student task planner API.
//!
//! Owner-scoped task CRUD over a document store, behind bearer-token
//! authentication. The binary in `main.rs` wires configuration, storage and
//! identity verification together; everything else lives here so the
//! router can be driven directly from tests.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod query;
pub mod store;
pub mod validation;

pub use app::{router, AppState};
pub use config::AppConfig;
pub use error::ApiError;
