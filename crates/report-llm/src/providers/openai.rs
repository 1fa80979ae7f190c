//! OpenAI-compatible chat completions backend
//!
//! Works against api.openai.com and any server exposing the same
//! `/chat/completions` route (vLLM, llama.cpp, LM Studio). Local servers
//! usually accept any API key.
//!
//! ```no_run
//! use report_llm::providers::{OpenAIConfig, OpenAIProvider};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = OpenAIProvider::with_config(
//!     OpenAIConfig::new("not-needed").with_api_base("http://localhost:8000/v1"),
//! )?;
//! # Ok(())
//! # }
//! ```

use super::{DEFAULT_TIMEOUT_SECS, http_client, send_json, trim_base};
use crate::{Completion, CompletionRequest, FinishReason, LLMError, LLMProvider, Result, TokenUsage};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: OPENAI_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Point at another OpenAI-compatible server; a trailing `/` is dropped
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = trim_base(api_base);
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            config,
        })
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip_all, fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let model = request.model.clone();
        let body = ChatRequest::from(request);
        debug!(json = body.response_format.is_some(), "Posting chat completion");

        let http = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&body);
        let response: ChatResponse = send_json(http, &model).await?;

        response.into_completion()
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

impl From<CompletionRequest> for ChatRequest {
    fn from(request: CompletionRequest) -> Self {
        let system = request.instructions.map(|content| ChatMessage {
            role: "system",
            content,
        });
        let user = ChatMessage {
            role: "user",
            content: request.prompt,
        };

        Self {
            model: request.model,
            messages: system.into_iter().chain([user]).collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: request.json_output.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AnswerMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnswerMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

impl ChatResponse {
    /// Only the first choice is used
    fn into_completion(self) -> Result<Completion> {
        let usage = self.usage.map_or_else(TokenUsage::default, |u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            answer_tokens: u.completion_tokens,
        });
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::MalformedResponse("response has no choices".to_string()))?;
        let text = choice
            .message
            .content
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| LLMError::MalformedResponse("answer is empty".to_string()))?;

        Ok(Completion {
            text,
            finish: FinishReason::from_provider(choice.finish_reason.as_deref()),
            usage,
        })
    }
}
