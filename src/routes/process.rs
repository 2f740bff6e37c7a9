use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::{app_state::AppState, error::AppError, ocr};

#[derive(Deserialize)]
pub struct ProcessRequest {
    question: Option<String>,
    questions: Option<Vec<String>>,
}

/// `POST /process` — one question or a batch, as JSON.
pub async fn question(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProcessRequest>,
) -> Result<Response, AppError> {
    let solver = state.solver.read().await;

    if let Some(questions) = request.questions {
        let results = solver.solve_batch(&questions).await;
        return Ok(Json(json!({ "results": results })).into_response());
    }

    if let Some(question) = request.question {
        if question.trim().is_empty() {
            return Err(AppError::InvalidRequest);
        }
        let result = solver.answer(question).await;
        return Ok(Json(result).into_response());
    }

    Err(AppError::InvalidRequest)
}

/// `POST /process_file` — a `.txt` upload, one question per nonblank line.
pub async fn file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Multipart(e.to_string()))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Multipart(e.to_string()))?;
            upload = Some((filename, bytes.to_vec()));
        }
    }

    let (filename, bytes) = upload.ok_or(AppError::MissingField("file"))?;
    if filename.is_empty() {
        return Err(AppError::MissingField("file"));
    }
    if !filename.ends_with(".txt") {
        return Err(AppError::NotTextFile);
    }

    let questions: Vec<String> = String::from_utf8_lossy(&bytes)
        .lines()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    if questions.is_empty() {
        return Err(AppError::EmptyBatch);
    }

    tracing::info!(count = questions.len(), "Processing question file");

    let solver = state.solver.read().await;
    let results = solver.solve_batch(&questions).await;

    Ok(Json(json!({ "results": results })).into_response())
}

/// `POST /process_image` — an image upload, OCR'd into one question. The
/// extension gate runs before anything touches disk or the OCR engine, and
/// the saved file is removed again whatever the outcome.
pub async fn image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Multipart(e.to_string()))?
    {
        if field.name() == Some("image") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Multipart(e.to_string()))?;
            upload = Some((filename, bytes.to_vec()));
        }
    }

    let (filename, bytes) = upload.ok_or(AppError::MissingField("image"))?;
    if filename.is_empty() {
        return Err(AppError::MissingField("image"));
    }
    if !ocr::allowed_image(&filename) {
        return Err(AppError::UnsupportedImage);
    }

    let filename = sanitize_filename(&filename).ok_or(AppError::UnsupportedImage)?;
    tokio::fs::create_dir_all(&state.config.upload_dir).await?;
    let path = state.config.upload_dir.join(filename);
    tokio::fs::write(&path, &bytes).await?;

    let extracted = ocr::extract_text(&state.config.tesseract_path, &path).await;

    // The upload is transient; remove it even when extraction failed.
    if let Err(e) = tokio::fs::remove_file(&path).await {
        tracing::warn!(file = %path.display(), error = %e, "Failed to remove uploaded image");
    }

    let question = extracted?;

    let solver = state.solver.read().await;
    let result = solver.answer(question).await;

    Ok(Json(result).into_response())
}

/// Keeps only the final path component and characters safe for a filename.
fn sanitize_filename(raw: &str) -> Option<String> {
    let name: String = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();

    let name = name.trim_matches('.').to_string();
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directories_and_odd_characters() {
        assert_eq!(
            sanitize_filename("../../etc/passwd.png").as_deref(),
            Some("passwd.png")
        );
        assert_eq!(
            sanitize_filename("C:\\upload\\my scan.jpg").as_deref(),
            Some("myscan.jpg")
        );
        assert!(sanitize_filename("...").is_none());
    }
}
