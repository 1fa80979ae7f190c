//! HTTP model backends
//!
//! Both backends share the client setup and the status handling below; they
//! differ only in request and response shapes.

#[cfg(feature = "anthropic")]
pub mod anthropic;
#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "anthropic")]
pub use anthropic::{AnthropicConfig, AnthropicProvider};
#[cfg(feature = "openai")]
pub use openai::{OpenAIConfig, OpenAIProvider};

use crate::{LLMError, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub(crate) fn http_client(timeout_secs: u64) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// Send a request and decode the success body, mapping error statuses
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    model: &str,
) -> Result<T> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LLMError::from_status(status, body, model));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| LLMError::MalformedResponse(e.to_string()))
}

pub(crate) fn trim_base(api_base: impl Into<String>) -> String {
    api_base.into().trim_end_matches('/').to_string()
}
