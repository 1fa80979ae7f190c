//! Model backend boundary

use crate::{Completion, CompletionRequest, Result};
use async_trait::async_trait;

/// A hosted model that answers one prompt at a time
///
/// One call is one HTTP request. Failures are returned as-is and never
/// retried here.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion>;

    /// Short backend name for logs ("openai", "anthropic")
    fn name(&self) -> &str;
}
