//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /              - Static order lookup page
//! GET  /health        - Liveness check
//! GET  /health/ready  - Readiness check (probes storage)
//! GET  /order/{id}    - Order lookup by id (cache only)
//! ```

pub mod home;
pub mod orders;

use axum::extract::State;
use axum::{Router, routing::get};

use crate::db::OrderStore;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Create all routes for the server.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/order/{id}", get(orders::show))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK. Responds 503 Service
/// Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> Result<&'static str> {
    state.store().ping().await.map_err(AppError::from)?;
    Ok("ok")
}
