use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{app_state::AppState, error::AppError, solver::Solver};

/// Flips the proxy flag and swaps in a freshly built solver. The write lock
/// waits for in-flight solver calls, so the swap is atomic from the point of
/// view of every request.
pub async fn toggle(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let mut solver = state.solver.write().await;

    let enabled = !solver.proxy_enabled();
    *solver = Solver::build(&state.config, enabled)?;

    tracing::info!(proxy_enabled = enabled, "Proxy toggled, solver client rebuilt");

    Ok(Json(json!({
        "status":        "success",
        "proxy_enabled": enabled,
        "message":       format!("Proxy {}", if enabled { "enabled" } else { "disabled" }),
    })))
}
