//! Structured reasoning on top of an LLM provider
//!
//! A reasoning call takes a fully rendered prompt and returns an
//! [`Assessment`]: an integer score, a non-empty explanation, and any extra
//! fields the model supplied. Calls are synchronous from the caller's point of
//! view and are never retried.

use crate::{CompletionRequest, LLMError, LLMProvider, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, instrument};

const DEFAULT_SYSTEM_PROMPT: &str = "You are an equity research analyst. \
Answer with a single JSON object of the form \
{\"score\": <integer>, \"explanation\": \"<two to four sentences>\"} \
and nothing else.";

/// Parsed `{score, explanation}` answer from the reasoning service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub score: i32,
    pub explanation: String,
    /// Additional fields returned by multi-field prompts
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// External reasoning capability: prompt text in, assessment out
#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn invoke(&self, prompt: &str) -> Result<Assessment>;

    /// Name used in logs
    fn name(&self) -> &str;
}

/// Settings for [`LlmReasoner`]
#[derive(Debug, Clone)]
pub struct ReasonerConfig {
    pub model: String,
    pub max_tokens: usize,
    pub temperature: Option<f32>,
    pub system_prompt: String,
    /// Request JSON-constrained output where the backend supports it
    pub json_output: bool,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 800,
            temperature: Some(0.2),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            json_output: false,
        }
    }
}

/// Reasoning service backed by any [`LLMProvider`]
pub struct LlmReasoner {
    provider: Arc<dyn LLMProvider>,
    config: ReasonerConfig,
}

impl LlmReasoner {
    pub fn new(provider: Arc<dyn LLMProvider>, config: ReasonerConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &ReasonerConfig {
        &self.config
    }
}

#[async_trait]
impl ReasoningService for LlmReasoner {
    #[instrument(
        skip(self, prompt),
        fields(provider = %self.provider.name(), model = %self.config.model)
    )]
    async fn invoke(&self, prompt: &str) -> Result<Assessment> {
        let request = CompletionRequest::new(&self.config.model, prompt)
            .with_instructions(&self.config.system_prompt)
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature)
            .with_json_output(self.config.json_output);

        let completion = self.provider.complete(request).await?;
        debug!(
            finish = ?completion.finish,
            tokens = completion.usage.total(),
            "Reasoning answer received"
        );

        parse_assessment(&completion.text).map_err(|e| {
            if completion.is_truncated() {
                LLMError::InvalidAssessment(format!(
                    "answer cut off at {} tokens: {e}",
                    self.config.max_tokens
                ))
            } else {
                e
            }
        })
    }

    fn name(&self) -> &str {
        self.provider.name()
    }
}

/// Parse a model answer into an [`Assessment`]
///
/// Tolerates code fences and prose around the JSON object. The score may be
/// an integer, an integral float, or a numeric string.
pub fn parse_assessment(text: &str) -> Result<Assessment> {
    let body = extract_json_object(text).ok_or_else(|| {
        LLMError::InvalidAssessment(format!("no JSON object in response: {}", preview(text)))
    })?;

    let mut fields: Map<String, Value> = serde_json::from_str(body)
        .map_err(|e| LLMError::InvalidAssessment(format!("malformed JSON: {e}")))?;

    let score = fields
        .remove("score")
        .ok_or_else(|| LLMError::InvalidAssessment("missing 'score'".to_string()))
        .and_then(|value| score_from_value(&value))?;

    let explanation = fields
        .remove("explanation")
        .and_then(|value| value.as_str().map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            LLMError::InvalidAssessment("missing or empty 'explanation'".to_string())
        })?;

    Ok(Assessment {
        score,
        explanation,
        details: fields,
    })
}

fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn score_from_value(value: &Value) -> Result<i32> {
    let invalid = || LLMError::InvalidAssessment(format!("score is not an integer: {value}"));
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).map_err(|_| invalid())
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() <= f64::from(i32::MAX) => Ok(f as i32),
                    _ => Err(invalid()),
                }
            }
        }
        Value::String(s) => s.trim().parse::<i32>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn preview(text: &str) -> String {
    text.chars().take(80).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Completion, FinishReason, TokenUsage};
    use std::sync::Mutex;

    struct ScriptedProvider {
        reply: String,
        finish: FinishReason,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        fn replying(reply: &str, finish: FinishReason) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                finish,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
            self.seen.lock().unwrap().push(request);
            Ok(Completion {
                text: self.reply.clone(),
                finish: self.finish,
                usage: TokenUsage::default(),
            })
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    #[test]
    fn test_parse_plain_json() {
        let a = parse_assessment(r#"{"score": 3, "explanation": "Wide moat."}"#).unwrap();
        assert_eq!(a.score, 3);
        assert_eq!(a.explanation, "Wide moat.");
        assert!(a.details.is_empty());
    }

    #[test]
    fn test_parse_fenced_with_extra_fields() {
        let text = "Here you go:\n```json\n\
            {\"score\": \"-2\", \"explanation\": \" Weak. \", \"confidence\": 0.7}\n```";
        let a = parse_assessment(text).unwrap();
        assert_eq!(a.score, -2);
        assert_eq!(a.explanation, "Weak.");
        assert_eq!(a.details.get("confidence"), Some(&serde_json::json!(0.7)));
    }

    #[test]
    fn test_parse_integral_float() {
        let a = parse_assessment(r#"{"score": 4.0, "explanation": "ok"}"#).unwrap();
        assert_eq!(a.score, 4);
        assert!(parse_assessment(r#"{"score": 4.5, "explanation": "ok"}"#).is_err());
    }

    #[test]
    fn test_parse_rejects_incomplete_answers() {
        assert!(parse_assessment("I cannot answer that.").is_err());
        assert!(parse_assessment(r#"{"explanation": "no score"}"#).is_err());
        assert!(parse_assessment(r#"{"score": 1, "explanation": "  "}"#).is_err());
        assert!(parse_assessment(r#"{"score": 1, "explanation": "x""#).is_err());
    }

    #[tokio::test]
    async fn test_reasoner_sends_system_prompt_and_parses() {
        let provider = ScriptedProvider::replying(
            r#"{"score": 2, "explanation": "Solid guidance."}"#,
            FinishReason::Complete,
        );
        let reasoner = LlmReasoner::new(provider.clone(), ReasonerConfig::default());

        let assessment = reasoner.invoke("Rate guidance for ACME").await.unwrap();
        assert_eq!(assessment.score, 2);

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].prompt, "Rate guidance for ACME");
        assert!(seen[0].instructions.as_deref().unwrap_or_default().contains("JSON"));
        assert_eq!(reasoner.name(), "scripted");
    }

    #[tokio::test]
    async fn test_truncated_answer_is_reported() {
        let cut_off = r#"{"score": 2, "explanation": "Sol"#;
        let provider = ScriptedProvider::replying(cut_off, FinishReason::Truncated);
        let reasoner = LlmReasoner::new(provider, ReasonerConfig::default());

        let err = reasoner.invoke("Rate ACME").await.unwrap_err();
        assert!(err.to_string().contains("cut off at 800 tokens"));
    }
}
