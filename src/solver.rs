use std::time::Duration;

use anyhow::Context;
use reqwest::{header::AUTHORIZATION, Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    config::Config,
    models::{AnswerResult, TokenUsage},
};

const CHAT_URL:   &str = "https://api.openai.com/v1/chat/completions";
const MODELS_URL: &str = "https://api.openai.com/v1/models";

const SYSTEM_PROMPT: &str = "You are a physics problem solver for JEE/NEET. Be concise. \
     For each problem: 1. Provide step-by-step numerical solution with proper units \
     2. End with a shortcut technique/trick for similar problems. No explanatory fluff.";

// Sampling is pinned for reproducible-ish answers.
const TEMPERATURE: f32 = 0.1;
const MAX_TOKENS: u32 = 2000;

/// Classified failure of one upstream call, carrying the user-facing message
/// that ends up in the answer field when the outcome is collapsed.
#[derive(Debug, Error)]
pub enum SolveError {
    #[error("Connection error: could not reach the OpenAI API. Please check your internet connection and try again.")]
    Connection(#[source] reqwest::Error),

    #[error("API key error: please check your OpenAI API key configuration.")]
    Auth,

    #[error("Model error: the model {0} was not found. Please try another model.")]
    ModelNotFound(String),

    #[error("Error processing your question: {0}")]
    Other(String),
}

/// Tagged result of one solver call. Callers that care whether the model
/// actually answered can branch on this; the HTTP layer collapses it into an
/// `AnswerResult` where a failure message takes the place of the answer.
#[derive(Debug)]
pub enum SolveOutcome {
    Answered { content: String, usage: TokenUsage },
    Failed(SolveError),
}

/// Wraps the chat completions API with a fixed prompt and pinned sampling.
/// Rebuilt wholesale whenever the proxy flag flips.
pub struct Solver {
    client: Client,
    api_key: String,
    model: String,
    proxy_enabled: bool,
}

impl Solver {
    pub fn build(config: &Config, proxy_enabled: bool) -> anyhow::Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10));

        if proxy_enabled {
            builder = builder
                .proxy(reqwest::Proxy::http(&config.http_proxy).context("Invalid HTTP proxy URL")?)
                .proxy(
                    reqwest::Proxy::https(&config.https_proxy)
                        .context("Invalid HTTPS proxy URL")?,
                );
        } else {
            // reqwest picks up HTTP_PROXY/HTTPS_PROXY from the environment by
            // default; the toggle must stay the only source of proxy state.
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build().context("Failed to build HTTP client")?,
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
            proxy_enabled,
        })
    }

    pub fn proxy_enabled(&self) -> bool {
        self.proxy_enabled
    }

    pub fn api_key_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Solves one question. Never returns an `Err`: every upstream failure is
    /// classified and carried inside the outcome.
    pub async fn solve(&self, question: &str) -> SolveOutcome {
        tracing::debug!(chars = question.len(), model = %self.model, "Sending question to chat completions");

        match self.request_completion(question).await {
            Ok((content, usage)) => {
                tracing::debug!(
                    completion_tokens = usage.completion_tokens,
                    "Received completion"
                );
                SolveOutcome::Answered { content, usage }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Solver call failed");
                SolveOutcome::Failed(e)
            }
        }
    }

    /// Solves one question and collapses the outcome into the wire shape:
    /// on failure the explanatory message becomes the answer and the token
    /// usage is all zero.
    pub async fn answer(&self, question: String) -> AnswerResult {
        match self.solve(&question).await {
            SolveOutcome::Answered { content, usage } => AnswerResult {
                question,
                answer: content,
                token_usage: usage,
            },
            SolveOutcome::Failed(e) => AnswerResult {
                question,
                answer: e.to_string(),
                token_usage: TokenUsage::default(),
            },
        }
    }

    /// Solves a batch strictly sequentially, preserving input order. Blank
    /// questions are dropped before any upstream call is made, so the result
    /// list matches the nonblank inputs one to one.
    pub async fn solve_batch(&self, questions: &[String]) -> Vec<AnswerResult> {
        let questions = nonblank(questions);
        let mut results = Vec::with_capacity(questions.len());
        for question in questions {
            results.push(self.answer(question.to_string()).await);
        }
        results
    }

    /// Lists models as a cheap connectivity probe for `/api_test`.
    pub async fn check_connectivity(&self) -> Result<usize, SolveError> {
        let response = self
            .client
            .get(MODELS_URL)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(classify_transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body, &self.model));
        }

        let listing: ModelList = response
            .json()
            .await
            .map_err(|e| SolveError::Other(e.to_string()))?;

        Ok(listing.data.len())
    }

    async fn request_completion(
        &self,
        question: &str,
    ) -> Result<(String, TokenUsage), SolveError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Solve: {question}"),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .client
            .post(CHAT_URL)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(classify_transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body, &self.model));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| SolveError::Other(e.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| SolveError::Other("the model returned an empty completion".into()))?;

        Ok((content, completion.usage.unwrap_or_default()))
    }
}

fn nonblank(questions: &[String]) -> Vec<&str> {
    questions
        .iter()
        .map(String::as_str)
        .filter(|q| !q.trim().is_empty())
        .collect()
}

fn classify_transport(e: reqwest::Error) -> SolveError {
    if e.is_connect() || e.is_timeout() {
        SolveError::Connection(e)
    } else {
        SolveError::Other(e.to_string())
    }
}

fn classify_status(status: StatusCode, body: &str, model: &str) -> SolveError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SolveError::Auth,
        StatusCode::NOT_FOUND => SolveError::ModelNotFound(model.to_string()),
        _ => SolveError::Other(format!("HTTP {status}: {body}")),
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_questions_are_dropped() {
        let questions = vec![
            "A ball is thrown upward at 20 m/s".to_string(),
            "   ".to_string(),
            "Find the equivalent resistance".to_string(),
        ];
        let kept = nonblank(&questions);
        assert_eq!(
            kept,
            vec![
                "A ball is thrown upward at 20 m/s",
                "Find the equivalent resistance"
            ]
        );
    }

    #[test]
    fn all_blank_batch_keeps_nothing() {
        let questions = vec![String::new(), "\t\n".to_string()];
        assert!(nonblank(&questions).is_empty());
    }

    #[test]
    fn unauthorized_maps_to_auth_error() {
        let err = classify_status(StatusCode::UNAUTHORIZED, "", "gpt-4o");
        assert!(matches!(err, SolveError::Auth));
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn not_found_names_the_model() {
        let err = classify_status(StatusCode::NOT_FOUND, "", "gpt-4o");
        assert!(matches!(err, SolveError::ModelNotFound(_)));
        assert!(err.to_string().contains("gpt-4o"));
    }

    #[test]
    fn other_status_carries_body() {
        let err = classify_status(StatusCode::TOO_MANY_REQUESTS, "rate limited", "gpt-4o");
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn failed_outcome_collapses_to_zero_usage() {
        let outcome = SolveOutcome::Failed(SolveError::Auth);
        let result = match outcome {
            SolveOutcome::Answered { content, usage } => AnswerResult {
                question: "q".into(),
                answer: content,
                token_usage: usage,
            },
            SolveOutcome::Failed(e) => AnswerResult {
                question: "q".into(),
                answer: e.to_string(),
                token_usage: TokenUsage::default(),
            },
        };
        assert_eq!(result.token_usage, TokenUsage::default());
        assert!(result.answer.contains("API key"));
    }

    /// A solver whose every upstream call fails fast: it is routed through a
    /// proxy on a port nothing listens on.
    fn dead_proxy_solver() -> Solver {
        let config = Config {
            openai_api_key: "test-key".into(),
            openai_model: "gpt-4o".into(),
            http_proxy: "http://127.0.0.1:9".into(),
            https_proxy: "http://127.0.0.1:9".into(),
            use_proxy: true,
            tesseract_path: "tesseract".into(),
            upload_dir: "uploads".into(),
            host: "127.0.0.1".into(),
            port: 0,
        };
        Solver::build(&config, true).unwrap()
    }

    #[tokio::test]
    async fn connection_failure_yields_explanatory_answer() {
        // The call must fail with a connection-classified error, not a
        // panic or an Err.
        let solver = dead_proxy_solver();
        let result = solver.answer("What is 2 + 2?".into()).await;
        assert!(result.answer.contains("Connection error"));
        assert_eq!(result.token_usage, TokenUsage::default());
    }

    #[tokio::test]
    async fn batch_results_match_nonblank_inputs_in_order() {
        let solver = dead_proxy_solver();
        let questions = vec![
            "A 5 kg mass hangs from a spring of stiffness 200 N/m".to_string(),
            "   ".to_string(),
            "Find the time period of a 1 m pendulum".to_string(),
            "A charge of 2 uC sits 3 m from a charge of -4 uC".to_string(),
        ];

        let results = solver.solve_batch(&questions).await;

        // One blank dropped, the rest answered (here: failure-explained)
        // one to one in input order.
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].question, questions[0]);
        assert_eq!(results[1].question, questions[2]);
        assert_eq!(results[2].question, questions[3]);
    }
}
