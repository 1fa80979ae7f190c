//! Configuration for report generation

use crate::error::{ReportError, Result};
use report_core::DatasetKind;
use report_utils::{env_bool, env_parse, env_secs, env_string};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const MINUTE: u64 = 60;
const DAY: u64 = 24 * 60 * MINUTE;

/// Per-kind dataset time-to-live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetTtls {
    pub quotes: Duration,
    pub statements: Duration,
    pub ratios: Duration,
    pub estimates: Duration,
    pub segmentation: Duration,
    pub filings: Duration,
    pub transcripts: Duration,
}

impl Default for DatasetTtls {
    fn default() -> Self {
        let week = Duration::from_secs(7 * DAY);
        Self {
            quotes: Duration::from_secs(100 * MINUTE),
            statements: week,
            ratios: week,
            estimates: week,
            segmentation: week,
            filings: week,
            transcripts: week,
        }
    }
}

impl DatasetTtls {
    pub fn ttl_for(&self, kind: DatasetKind) -> Duration {
        match kind {
            DatasetKind::Quotes => self.quotes,
            DatasetKind::IncomeStatements | DatasetKind::BalanceSheets | DatasetKind::CashFlows => {
                self.statements
            }
            DatasetKind::Ratios => self.ratios,
            DatasetKind::Estimates => self.estimates,
            DatasetKind::Segmentation => self.segmentation,
            DatasetKind::AnnualFilings => self.filings,
            DatasetKind::EarningsTranscripts => self.transcripts,
        }
    }
}

/// Which LLM backend serves reasoning tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningBackend {
    #[default]
    OpenAI,
    Anthropic,
}

impl FromStr for ReasoningBackend {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(ReportError::Config(format!(
                "unknown reasoning backend '{other}'"
            ))),
        }
    }
}

/// Reasoning-service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    pub backend: ReasoningBackend,
    pub model: String,
    /// Overrides the backend's default API base
    pub api_base: Option<String>,
    pub api_key: Option<String>,
    pub max_tokens: usize,
    pub temperature: Option<f32>,
    pub timeout: Duration,
    /// Ask OpenAI-compatible servers for JSON-object responses
    pub json_mode: bool,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            backend: ReasoningBackend::OpenAI,
            model: "gpt-4o-mini".to_string(),
            api_base: None,
            api_key: None,
            max_tokens: 800,
            temperature: Some(0.2),
            timeout: Duration::from_secs(180),
            json_mode: false,
        }
    }
}

/// Financial data REST provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            base_url: "https://financialmodelingprep.com/api/v3".to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Configuration for report generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Freshness window per dataset kind
    pub dataset_ttls: DatasetTtls,

    /// Worker permits for per-request scoring tasks
    pub task_pool_size: usize,

    /// Worker permits for top-level request dispatch
    pub request_pool_size: usize,

    /// Progress stream gives up after this long without an event
    pub progress_idle_timeout: Duration,

    /// Maximum characters of filing/transcript text placed in one prompt
    pub excerpt_chars: usize,

    pub reasoning: ReasoningConfig,

    pub data: DataConfig,

    /// Directory for file-backed stores; `None` keeps everything in memory
    pub storage_dir: Option<PathBuf>,
}

/// Twice the available parallelism
pub fn default_pool_size() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get) * 2
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            dataset_ttls: DatasetTtls::default(),
            task_pool_size: default_pool_size(),
            request_pool_size: default_pool_size(),
            progress_idle_timeout: Duration::from_secs(60 * MINUTE),
            excerpt_chars: 12_000,
            reasoning: ReasoningConfig::default(),
            data: DataConfig::default(),
            storage_dir: None,
        }
    }
}

impl ReportConfig {
    /// Create a new configuration builder
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder::default()
    }

    /// Load defaults overridden by environment variables
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `STOCK_REPORT_TASK_POOL` | `task_pool_size` |
    /// | `STOCK_REPORT_REQUEST_POOL` | `request_pool_size` |
    /// | `STOCK_REPORT_IDLE_TIMEOUT_SECS` | `progress_idle_timeout` |
    /// | `STOCK_REPORT_QUOTES_TTL_SECS` | quotes TTL |
    /// | `STOCK_REPORT_FUNDAMENTALS_TTL_SECS` | statements, ratios, estimates, segmentation TTL |
    /// | `STOCK_REPORT_FILINGS_TTL_SECS` | filings and transcripts TTL |
    /// | `STOCK_REPORT_EXCERPT_CHARS` | `excerpt_chars` |
    /// | `STOCK_REPORT_STORAGE_DIR` | `storage_dir` |
    /// | `STOCK_REPORT_DATA_URL`, `STOCK_REPORT_DATA_API_KEY` | `data` |
    /// | `STOCK_REPORT_LLM_BACKEND` | `reasoning.backend` |
    /// | `OPENAI_MODEL`, `OPENAI_API_BASE`, `OPENAI_API_KEY` | `reasoning` (OpenAI) |
    /// | `ANTHROPIC_MODEL`, `ANTHROPIC_API_KEY` | `reasoning` (Anthropic) |
    /// | `STOCK_REPORT_LLM_JSON_MODE` | `reasoning.json_mode` |
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(size) = env_parse("STOCK_REPORT_TASK_POOL")? {
            config.task_pool_size = size;
        }
        if let Some(size) = env_parse("STOCK_REPORT_REQUEST_POOL")? {
            config.request_pool_size = size;
        }
        if let Some(timeout) = env_secs("STOCK_REPORT_IDLE_TIMEOUT_SECS")? {
            config.progress_idle_timeout = timeout;
        }
        if let Some(ttl) = env_secs("STOCK_REPORT_QUOTES_TTL_SECS")? {
            config.dataset_ttls.quotes = ttl;
        }
        if let Some(ttl) = env_secs("STOCK_REPORT_FUNDAMENTALS_TTL_SECS")? {
            config.dataset_ttls.statements = ttl;
            config.dataset_ttls.ratios = ttl;
            config.dataset_ttls.estimates = ttl;
            config.dataset_ttls.segmentation = ttl;
        }
        if let Some(ttl) = env_secs("STOCK_REPORT_FILINGS_TTL_SECS")? {
            config.dataset_ttls.filings = ttl;
            config.dataset_ttls.transcripts = ttl;
        }
        if let Some(chars) = env_parse("STOCK_REPORT_EXCERPT_CHARS")? {
            config.excerpt_chars = chars;
        }
        config.storage_dir = env_string("STOCK_REPORT_STORAGE_DIR").map(PathBuf::from);

        if let Some(url) = env_string("STOCK_REPORT_DATA_URL") {
            config.data.base_url = url;
        }
        config.data.api_key = env_string("STOCK_REPORT_DATA_API_KEY");

        if let Some(backend) = env_string("STOCK_REPORT_LLM_BACKEND") {
            config.reasoning.backend = backend.parse()?;
        }
        match config.reasoning.backend {
            ReasoningBackend::OpenAI => {
                if let Some(model) = env_string("OPENAI_MODEL") {
                    config.reasoning.model = model;
                }
                config.reasoning.api_base = env_string("OPENAI_API_BASE");
                config.reasoning.api_key = env_string("OPENAI_API_KEY");
            }
            ReasoningBackend::Anthropic => {
                config.reasoning.model = env_string("ANTHROPIC_MODEL")
                    .unwrap_or_else(|| "claude-sonnet-4-5-20250929".to_string());
                config.reasoning.api_key = env_string("ANTHROPIC_API_KEY");
            }
        }
        if let Some(json_mode) = env_bool("STOCK_REPORT_LLM_JSON_MODE")? {
            config.reasoning.json_mode = json_mode;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.task_pool_size == 0 || self.request_pool_size == 0 {
            return Err(ReportError::Config(
                "pool sizes must be greater than 0".to_string(),
            ));
        }

        if self.progress_idle_timeout.is_zero() {
            return Err(ReportError::Config(
                "progress_idle_timeout must be greater than 0".to_string(),
            ));
        }

        if let Some(kind) = DatasetKind::ALL
            .into_iter()
            .find(|kind| self.dataset_ttls.ttl_for(*kind).is_zero())
        {
            return Err(ReportError::Config(format!(
                "TTL for {kind} must be greater than 0"
            )));
        }

        if self.excerpt_chars == 0 {
            return Err(ReportError::Config(
                "excerpt_chars must be greater than 0".to_string(),
            ));
        }

        if self.reasoning.backend == ReasoningBackend::Anthropic
            && self.reasoning.api_key.is_none()
        {
            return Err(ReportError::Config(
                "Anthropic API key required when using the Anthropic backend".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for ReportConfig
#[derive(Debug, Default)]
pub struct ReportConfigBuilder {
    dataset_ttls: Option<DatasetTtls>,
    task_pool_size: Option<usize>,
    request_pool_size: Option<usize>,
    progress_idle_timeout: Option<Duration>,
    excerpt_chars: Option<usize>,
    reasoning: Option<ReasoningConfig>,
    data: Option<DataConfig>,
    storage_dir: Option<PathBuf>,
}

impl ReportConfigBuilder {
    /// Set the per-kind dataset TTLs
    pub fn dataset_ttls(mut self, ttls: DatasetTtls) -> Self {
        self.dataset_ttls = Some(ttls);
        self
    }

    /// Set the scoring task pool size
    pub fn task_pool_size(mut self, size: usize) -> Self {
        self.task_pool_size = Some(size);
        self
    }

    /// Set the request dispatch pool size
    pub fn request_pool_size(mut self, size: usize) -> Self {
        self.request_pool_size = Some(size);
        self
    }

    /// Set the progress stream idle timeout
    pub fn progress_idle_timeout(mut self, timeout: Duration) -> Self {
        self.progress_idle_timeout = Some(timeout);
        self
    }

    /// Set the prompt excerpt length
    pub fn excerpt_chars(mut self, chars: usize) -> Self {
        self.excerpt_chars = Some(chars);
        self
    }

    /// Set the reasoning-service settings
    pub fn reasoning(mut self, reasoning: ReasoningConfig) -> Self {
        self.reasoning = Some(reasoning);
        self
    }

    /// Set the data provider settings
    pub fn data(mut self, data: DataConfig) -> Self {
        self.data = Some(data);
        self
    }

    /// Use file-backed stores under this directory
    pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ReportConfig> {
        let defaults = ReportConfig::default();

        let config = ReportConfig {
            dataset_ttls: self.dataset_ttls.unwrap_or(defaults.dataset_ttls),
            task_pool_size: self.task_pool_size.unwrap_or(defaults.task_pool_size),
            request_pool_size: self.request_pool_size.unwrap_or(defaults.request_pool_size),
            progress_idle_timeout: self
                .progress_idle_timeout
                .unwrap_or(defaults.progress_idle_timeout),
            excerpt_chars: self.excerpt_chars.unwrap_or(defaults.excerpt_chars),
            reasoning: self.reasoning.unwrap_or(defaults.reasoning),
            data: self.data.unwrap_or(defaults.data),
            storage_dir: self.storage_dir,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReportConfig::default();
        assert_eq!(config.dataset_ttls.quotes, Duration::from_secs(6000));
        assert_eq!(
            config.dataset_ttls.ttl_for(DatasetKind::BalanceSheets),
            Duration::from_secs(7 * DAY)
        );
        assert_eq!(config.progress_idle_timeout, Duration::from_secs(3600));
        assert!(config.task_pool_size >= 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ReportConfig::builder()
            .task_pool_size(4)
            .request_pool_size(2)
            .excerpt_chars(500)
            .storage_dir("/tmp/reports")
            .build()
            .unwrap();

        assert_eq!(config.task_pool_size, 4);
        assert_eq!(config.request_pool_size, 2);
        assert_eq!(config.excerpt_chars, 500);
        assert_eq!(config.storage_dir, Some(PathBuf::from("/tmp/reports")));
    }

    #[test]
    fn test_validation_rejects_zero_pool() {
        assert!(ReportConfig::builder().task_pool_size(0).build().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_ttl() {
        let ttls = DatasetTtls {
            segmentation: Duration::ZERO,
            ..DatasetTtls::default()
        };
        let err = ReportConfig::builder().dataset_ttls(ttls).build().unwrap_err();
        assert!(err.to_string().contains("segmentation"));
    }

    #[test]
    fn test_validation_anthropic_needs_key() {
        let reasoning = ReasoningConfig {
            backend: ReasoningBackend::Anthropic,
            ..ReasoningConfig::default()
        };
        assert!(ReportConfig::builder().reasoning(reasoning.clone()).build().is_err());

        let reasoning = ReasoningConfig {
            api_key: Some("key".to_string()),
            ..reasoning
        };
        assert!(ReportConfig::builder().reasoning(reasoning).build().is_ok());
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("OpenAI".parse::<ReasoningBackend>().unwrap(), ReasoningBackend::OpenAI);
        assert_eq!(
            "anthropic".parse::<ReasoningBackend>().unwrap(),
            ReasoningBackend::Anthropic
        );
        assert!("ollama".parse::<ReasoningBackend>().is_err());
    }
}
