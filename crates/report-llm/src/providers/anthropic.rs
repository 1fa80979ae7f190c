//! Anthropic Messages API backend

use super::{DEFAULT_TIMEOUT_SECS, http_client, send_json, trim_base};
use crate::{Completion, CompletionRequest, FinishReason, LLMError, LLMProvider, Result, TokenUsage};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: ANTHROPIC_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = trim_base(api_base);
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

pub struct AnthropicProvider {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicProvider {
    pub fn with_config(config: AnthropicConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LLMError::Config("Anthropic API key is empty".to_string()));
        }
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            config,
        })
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    #[instrument(skip_all, fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let model = request.model.clone();
        let body = MessagesRequest::from(request);

        let http = self
            .client
            .post(format!("{}/messages", self.config.api_base))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);
        let response: MessagesResponse = send_json(http, &model).await?;
        debug!(
            stop_reason = response.stop_reason.as_deref().unwrap_or("none"),
            "Messages response received"
        );

        response.into_completion()
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: [UserTurn; 1],
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct UserTurn {
    role: &'static str,
    content: String,
}

// No JSON mode on this API; the instructions carry the answer format
impl From<CompletionRequest> for MessagesRequest {
    fn from(request: CompletionRequest) -> Self {
        Self {
            model: request.model,
            system: request.instructions,
            messages: [UserTurn {
                role: "user",
                content: request.prompt,
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: usize,
    output_tokens: usize,
}

impl MessagesResponse {
    fn into_completion(self) -> Result<Completion> {
        let text = self
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");
        if text.trim().is_empty() {
            return Err(LLMError::MalformedResponse(
                "no text blocks in answer".to_string(),
            ));
        }

        Ok(Completion {
            text,
            finish: FinishReason::from_provider(self.stop_reason.as_deref()),
            usage: TokenUsage {
                prompt_tokens: self.usage.input_tokens,
                answer_tokens: self.usage.output_tokens,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_key_is_rejected() {
        assert!(AnthropicProvider::with_config(AnthropicConfig::new(" ")).is_err());
        let provider = AnthropicProvider::with_config(AnthropicConfig::new("test-key")).unwrap();
        assert_eq!(provider.name(), "anthropic");
    }

    #[test]
    fn test_request_shape() {
        let request = CompletionRequest::new("claude-3-5-haiku-latest", "Rate ACME")
            .with_instructions("Answer in JSON")
            .with_json_output(true);
        let body = serde_json::to_value(MessagesRequest::from(request)).unwrap();

        assert_eq!(body["system"], "Answer in JSON");
        assert_eq!(body["messages"][0]["content"], "Rate ACME");
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_text_blocks_are_joined() {
        let raw = json!({
            "content": [
                {"type": "text", "text": "{\"score\": 1,"},
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "\"explanation\": \"ok\"}"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 12, "output_tokens": 8}
        });
        let completion = serde_json::from_value::<MessagesResponse>(raw)
            .unwrap()
            .into_completion()
            .unwrap();
        assert!(completion.text.starts_with("{\"score\": 1,"));
        assert!(completion.text.ends_with('}'));
        assert!(!completion.is_truncated());
        assert_eq!(completion.usage.total(), 20);
    }

    #[test]
    fn test_empty_content_is_malformed() {
        let raw = json!({
            "content": [],
            "stop_reason": "max_tokens",
            "usage": {"input_tokens": 1, "output_tokens": 0}
        });
        let err = serde_json::from_value::<MessagesResponse>(raw)
            .unwrap()
            .into_completion()
            .unwrap_err();
        assert!(matches!(err, LLMError::MalformedResponse(_)));
    }
}
