use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::app_state::AppState;

/// Probes the OpenAI API by listing models and reports connectivity,
/// key presence, and the current proxy state.
pub async fn handler(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let solver = state.solver.read().await;

    match solver.check_connectivity().await {
        Ok(models_count) => (
            StatusCode::OK,
            Json(json!({
                "status":             "success",
                "message":            "Successfully connected to the OpenAI API",
                "api_key_configured": solver.api_key_configured(),
                "models_count":       models_count,
                "proxy_enabled":      solver.proxy_enabled(),
            })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status":             "error",
                "message":            format!("Error connecting to the OpenAI API: {e}"),
                "api_key_configured": solver.api_key_configured(),
                "proxy_enabled":      solver.proxy_enabled(),
            })),
        ),
    }
}
