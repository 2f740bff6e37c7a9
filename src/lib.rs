pub mod app_state;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod ocr;
pub mod routes;
pub mod solver;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use app_state::AppState;

/// Hard cap on request bodies, matching the largest accepted image upload.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/",                   get(routes::ui::handler))
        .route("/api_test",           get(routes::api_test::handler))
        .route("/toggle_proxy",       get(routes::proxy::toggle))
        .route("/process",            post(routes::process::question))
        .route("/process_file",       post(routes::process::file))
        .route("/process_image",      post(routes::process::image))
        .route("/export",             post(routes::export::export))
        .route("/download/:filename", get(routes::export::download))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        // Allow the frontend (any local origin) to reach this server.
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
