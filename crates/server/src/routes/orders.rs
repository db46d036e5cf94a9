//! Order lookup handlers.

use axum::Json;
use axum::extract::{Path, State};

use orderline_core::Order;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Look up an order by id.
///
/// Answers from the cache only; a miss is authoritative for "currently
/// unknown to this process" even if storage might hold the order (e.g.
/// warm-load still incomplete after a restart).
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Order>> {
    state
        .cache()
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order".to_string()))
}
