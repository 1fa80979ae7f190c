//! Error types for report generation

use report_core::DatasetKind;
use thiserror::Error;

/// Report generation errors
#[derive(Debug, Error)]
pub enum ReportError {
    /// Entity identifier was rejected
    #[error("Invalid entity: {0}")]
    InvalidEntity(String),

    /// A data provider could not supply a dataset
    #[error("Provider error for {kind}: {reason}")]
    Provider { kind: DatasetKind, reason: String },

    /// Persistence failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Reasoning service failed
    #[error("Reasoning error: {0}")]
    Reasoning(#[from] report_llm::LLMError),

    /// A scoring task lacked an input it cannot do without
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Prompt template failed to compile or render
    #[error("Template error: {0}")]
    Template(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The fan-out/join machinery itself failed
    #[error("Orchestration failed: {0}")]
    Orchestration(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReportError {
    pub fn provider(kind: DatasetKind, reason: impl ToString) -> Self {
        Self::Provider {
            kind,
            reason: reason.to_string(),
        }
    }

    /// Upstream-unavailable errors that callers absorb instead of failing
    pub fn is_provider(&self) -> bool {
        matches!(self, Self::Provider { .. })
    }
}

/// Result type alias for report operations
pub type Result<T> = std::result::Result<T, ReportError>;

impl From<report_core::Error> for ReportError {
    fn from(err: report_core::Error) -> Self {
        use report_core::Error as Core;
        match err {
            Core::InvalidEntity { .. } => ReportError::InvalidEntity(err.to_string()),
            Core::UnknownReportKind(_) | Core::UnknownDatasetKind(_) => {
                ReportError::Config(err.to_string())
            }
            Core::PayloadDecode { .. } => ReportError::Storage(err.to_string()),
        }
    }
}

impl From<minijinja::Error> for ReportError {
    fn from(err: minijinja::Error) -> Self {
        ReportError::Template(err.to_string())
    }
}

impl From<report_utils::EnvError> for ReportError {
    fn from(err: report_utils::EnvError) -> Self {
        ReportError::Config(err.to_string())
    }
}
