use std::path::Path;

use tokio::process::Command;

use crate::error::AppError;

const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Checks the upload's extension before any disk or OCR work happens.
pub fn allowed_image(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ALLOWED_IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Runs Tesseract on the image and returns the trimmed text. Best effort:
/// accuracy is whatever the engine gives us. Fails when the binary can't be
/// spawned, exits nonzero, or produces only whitespace.
pub async fn extract_text(tesseract_path: &str, image: &Path) -> Result<String, AppError> {
    tracing::debug!(image = %image.display(), "Running OCR");

    let output = Command::new(tesseract_path)
        .arg(image)
        .arg("stdout")
        .output()
        .await
        .map_err(|e| AppError::Extraction(format!("failed to run `{tesseract_path}`: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::Extraction(stderr.trim().to_string()));
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if text.is_empty() {
        return Err(AppError::Extraction("no text found in image".into()));
    }

    tracing::info!(chars = text.len(), "OCR extraction complete");

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_image_extensions() {
        assert!(allowed_image("scan.png"));
        assert!(allowed_image("photo.jpeg"));
        assert!(allowed_image("CAPTURE.JPG"));
        assert!(allowed_image("anim.gif"));
    }

    #[test]
    fn rejects_everything_else() {
        assert!(!allowed_image("scan.bmp"));
        assert!(!allowed_image("notes.txt"));
        assert!(!allowed_image("no_extension"));
        assert!(!allowed_image(""));
    }

    #[tokio::test]
    async fn missing_binary_reports_extraction_error() {
        let err = extract_text("definitely-not-tesseract", Path::new("missing.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }
}
