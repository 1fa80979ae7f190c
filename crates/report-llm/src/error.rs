//! Reasoning-layer errors

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LLMError>;

#[derive(Error, Debug)]
pub enum LLMError {
    /// Transport-level failure or a non-success status not covered below
    #[error("Model request failed: {0}")]
    RequestFailed(String),

    #[error("Model backend rejected the API key")]
    Unauthorized,

    #[error("Model backend is rate limiting: {0}")]
    RateLimited(String),

    /// 400 or 404: bad parameters or an unknown model
    #[error("Model backend rejected the request for '{model}': {body}")]
    Rejected { model: String, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend answered, but not in its documented shape
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    /// The model answered, but not with a usable assessment
    #[error("Invalid assessment: {0}")]
    InvalidAssessment(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LLMError {
    pub(crate) fn from_status(status: reqwest::StatusCode, body: String, model: &str) -> Self {
        match status.as_u16() {
            401 | 403 => Self::Unauthorized,
            429 => Self::RateLimited(body),
            400 | 404 => Self::Rejected {
                model: model.to_string(),
                body,
            },
            _ => Self::RequestFailed(format!("HTTP {status}: {body}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            LLMError::from_status(StatusCode::UNAUTHORIZED, String::new(), "m"),
            LLMError::Unauthorized
        ));
        assert!(matches!(
            LLMError::from_status(StatusCode::TOO_MANY_REQUESTS, "slow down".into(), "m"),
            LLMError::RateLimited(body) if body == "slow down"
        ));
        assert!(matches!(
            LLMError::from_status(StatusCode::NOT_FOUND, String::new(), "gpt-x"),
            LLMError::Rejected { model, .. } if model == "gpt-x"
        ));
        assert!(matches!(
            LLMError::from_status(StatusCode::BAD_GATEWAY, "upstream".into(), "m"),
            LLMError::RequestFailed(msg) if msg.contains("502")
        ));
    }
}
