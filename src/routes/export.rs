use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    app_state::AppState,
    error::AppError,
    export::{self, ExportFormat},
    models::AnswerResult,
};

#[derive(Deserialize)]
pub struct ExportRequest {
    results: Vec<AnswerResult>,
    format: Option<String>,
}

/// `POST /export` — renders the accumulated results to PDF or DOCX and
/// returns the download URL.
pub async fn export(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExportRequest>,
) -> Result<Json<Value>, AppError> {
    let format = ExportFormat::parse(request.format.as_deref().unwrap_or("pdf"))?;

    // Rendering is synchronous disk and CPU work.
    let dir = state.config.upload_dir.clone();
    let results = request.results;
    let filename = tokio::task::spawn_blocking(move || export::write_document(&results, format, &dir))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

    Ok(Json(json!({ "file_url": format!("/download/{filename}") })))
}

/// `GET /download/:filename` — streams a previously exported file as an
/// attachment.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    // The route only matches a single path segment, but reject traversal
    // characters outright anyway.
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return Err(AppError::NotFound);
    }

    let path = state.config.upload_dir.join(&filename);
    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::NotFound
        } else {
            AppError::Io(e)
        }
    })?;

    let headers = [
        (header::CONTENT_TYPE, content_type_for(&filename).to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];

    Ok((headers, bytes).into_response())
}

fn content_type_for(filename: &str) -> &'static str {
    if filename.ends_with(".pdf") {
        "application/pdf"
    } else if filename.ends_with(".docx") {
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    } else {
        "application/octet-stream"
    }
}
