use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("No {0} provided")]
    MissingField(&'static str),

    #[error("Failed to read multipart form: {0}")]
    Multipart(String),

    #[error("Invalid request format")]
    InvalidRequest,

    #[error("Invalid file format. Only .txt files are supported")]
    NotTextFile,

    #[error("Invalid file format")]
    UnsupportedImage,

    #[error("No questions found in file")]
    EmptyBatch,

    #[error("Could not extract text from image: {0}")]
    Extraction(String),

    #[error("Unsupported format: {0}")]
    UnsupportedExportFormat(String),

    #[error("Failed to render document: {0}")]
    Export(String),

    #[error("File not found")]
    NotFound,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::MissingField(_)
            | AppError::Multipart(_)
            | AppError::InvalidRequest
            | AppError::NotTextFile
            | AppError::UnsupportedImage
            | AppError::EmptyBatch
            | AppError::Extraction(_)
            | AppError::UnsupportedExportFormat(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Export(_) | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        tracing::error!(error = %self);

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
