//! Reasoning-service boundary for stock-report
//!
//! This crate provides the provider-agnostic LLM layer used by reasoning
//! scoring tasks. It includes:
//!
//! - Single-prompt completion request/response types
//! - The `LLMProvider` trait and concrete providers (behind feature flags)
//! - The `ReasoningService` trait: prompt text in, `{score, explanation}` out
//! - `LlmReasoner`, which adapts any provider into a reasoning service

pub mod completion;
pub mod error;
pub mod provider;
pub mod reasoner;

// Re-export main types
pub use completion::{Completion, CompletionRequest, FinishReason, TokenUsage};
pub use error::{LLMError, Result};
pub use provider::LLMProvider;
pub use reasoner::{Assessment, LlmReasoner, ReasonerConfig, ReasoningService, parse_assessment};

// Provider implementations (feature-gated)
#[cfg(any(feature = "openai", feature = "anthropic"))]
pub mod providers;
