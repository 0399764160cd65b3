//! # aquagrow-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Liveness probes (`/health`, `/irrigation`)
//! - Operator endpoints behind JWT Bearer auth:
//!   - `POST   /irrigation/toggle/{device_id}` — manual override
//!   - `GET    /irrigation/thresholds/{device_id}` — effective thresholds
//!   - `DELETE /irrigation/thresholds/{device_id}` — drop the cached entry
//! - Map application results and errors into JSON responses
//!
//! ## Dependency rule
//! Depends on `aquagrow-app` (for port traits and services) and
//! `aquagrow-domain` (for domain types used in request/response mapping).
//! Never leaks axum types into the domain.

pub mod api;
pub mod auth;
pub mod error;
pub mod router;
pub mod state;

pub use router::build;
pub use state::AppState;
