use serde::{Deserialize, Serialize};

/// Token counts reported by the chat completions API for one call.
/// All-zero when the call failed and no completion was produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// One solved (or failure-explained) question. Round-trips through the wire:
/// produced by the solver routes and accepted back by `/export`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    pub question: String,
    pub answer: String,
    pub token_usage: TokenUsage,
}
