use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name    = "fysikk-bridge",
    about   = "Physics question solver bridge: OCR intake, LLM solving, PDF/DOCX export",
    version
)]
pub struct Config {
    /// OpenAI API key used for chat completions.
    /// Can also be set via the OPENAI_API_KEY environment variable.
    /// May be left empty; /api_test reports whether one is configured.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, default_value = "")]
    pub openai_api_key: String,

    /// Chat model used to solve questions.
    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o")]
    pub openai_model: String,

    /// Proxy URL for plain-HTTP upstream traffic when the proxy is enabled.
    #[arg(long, env = "HTTP_PROXY", default_value = "http://proxy:8080")]
    pub http_proxy: String,

    /// Proxy URL for HTTPS upstream traffic when the proxy is enabled.
    #[arg(long, env = "HTTPS_PROXY", default_value = "http://proxy:8080")]
    pub https_proxy: String,

    /// Whether outbound OpenAI calls start out routed through the proxy.
    /// Flipped at runtime via GET /toggle_proxy.
    #[arg(long, env = "FYSIKK_USE_PROXY", default_value_t = false)]
    pub use_proxy: bool,

    /// Tesseract executable invoked for image OCR.
    #[arg(long, env = "TESSERACT_PATH", default_value = "tesseract")]
    pub tesseract_path: String,

    /// Directory holding uploaded images and exported documents.
    #[arg(long, env = "FYSIKK_UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: PathBuf,

    /// Host address to listen on.
    #[arg(long, env = "FYSIKK_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, env = "FYSIKK_PORT", default_value_t = 3000)]
    pub port: u16,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.openai_model.trim().is_empty() {
            anyhow::bail!("OPENAI_MODEL must not be empty");
        }
        if self.use_proxy {
            // Fail at startup rather than on the first solver call.
            reqwest::Proxy::http(&self.http_proxy)
                .map_err(|e| anyhow::anyhow!("Invalid HTTP_PROXY `{}`: {e}", self.http_proxy))?;
            reqwest::Proxy::https(&self.https_proxy)
                .map_err(|e| anyhow::anyhow!("Invalid HTTPS_PROXY `{}`: {e}", self.https_proxy))?;
        }
        if self.openai_api_key.trim().is_empty() {
            tracing::warn!(
                "OPENAI_API_KEY is not set; solver calls will fail until one is configured"
            );
        }
        Ok(())
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
