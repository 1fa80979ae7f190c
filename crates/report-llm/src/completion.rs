//! Single-prompt completion types
//!
//! Scoring never holds a conversation: each call is one set of instructions
//! plus one rendered prompt, answered by one block of text.

use serde::{Deserialize, Serialize};

const DEFAULT_MAX_TOKENS: usize = 1024;

/// One prompt sent to a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    /// Standing instructions, sent as the system prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub prompt: String,
    pub max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Ask providers that support it to constrain output to a JSON object
    #[serde(default)]
    pub json_output: bool,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            instructions: None,
            prompt: prompt.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            json_output: false,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_json_output(mut self, json_output: bool) -> Self {
        self.json_output = json_output;
        self
    }
}

/// Text a model produced for a [`CompletionRequest`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub finish: FinishReason,
    pub usage: TokenUsage,
}

impl Completion {
    /// The model ran out of tokens before finishing its answer
    pub fn is_truncated(&self) -> bool {
        self.finish == FinishReason::Truncated
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Complete,
    Truncated,
}

impl FinishReason {
    /// Map OpenAI `finish_reason` / Anthropic `stop_reason` values
    pub fn from_provider(reason: Option<&str>) -> Self {
        match reason {
            Some("length" | "max_tokens") => Self::Truncated,
            _ => Self::Complete,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: usize,
    pub answer_tokens: usize,
}

impl TokenUsage {
    pub fn total(&self) -> usize {
        self.prompt_tokens + self.answer_tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_and_overrides() {
        let request = CompletionRequest::new("gpt-4o-mini", "Rate ACME")
            .with_instructions("Answer in JSON")
            .with_max_tokens(512)
            .with_temperature(Some(0.2))
            .with_json_output(true);

        assert_eq!(request.prompt, "Rate ACME");
        assert_eq!(request.max_tokens, 512);
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.instructions.as_deref(), Some("Answer in JSON"));
        assert!(request.json_output);

        let bare = CompletionRequest::new("m", "p");
        assert_eq!(bare.max_tokens, DEFAULT_MAX_TOKENS);
        assert!(!bare.json_output);
    }

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(FinishReason::from_provider(Some("stop")), FinishReason::Complete);
        assert_eq!(FinishReason::from_provider(Some("end_turn")), FinishReason::Complete);
        assert_eq!(FinishReason::from_provider(Some("length")), FinishReason::Truncated);
        assert_eq!(FinishReason::from_provider(Some("max_tokens")), FinishReason::Truncated);
        assert_eq!(FinishReason::from_provider(None), FinishReason::Complete);
    }
}
