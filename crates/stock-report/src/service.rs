//! Load-or-generate entry point
//!
//! A request either replays the stored report for `(entity, kind)` or, on a
//! miss or when forced, refreshes the required datasets, runs the kind's task
//! schema, stores the new report and completes the progress stream with it.
//! Fatal errors (storage, orchestration) end the stream with `ERROR` and
//! nothing is stored.

use crate::api::{DatasetProvider, ProviderRouter, RestDatasetProvider, YahooQuoteProvider};
use crate::cache::DatasetCache;
use crate::clock::{Clock, SystemClock};
use crate::config::{ReasoningBackend, ReasoningConfig, ReportConfig};
use crate::engine::{Orchestrator, ScoringContext, WorkerPool};
use crate::error::{ReportError, Result};
use crate::progress::{self, ProgressChannel, ProgressStream};
use crate::store::{DatasetRepository, FileStore, MemoryStore, ReportRepository};
use crate::tasks::TaskSchema;
use report_core::{DatasetKind, EntityId, ProgressSink, Report, ReportKind};
use report_llm::providers::{AnthropicConfig, AnthropicProvider, OpenAIConfig, OpenAIProvider};
use report_llm::{LLMProvider, LlmReasoner, ReasonerConfig, ReasoningService};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// What a purge removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PurgeSummary {
    pub datasets: usize,
    pub reports: usize,
}

/// Report entry point; cheap to clone
#[derive(Clone)]
pub struct ReportService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    cache: DatasetCache,
    reports: Arc<dyn ReportRepository>,
    schemas: HashMap<ReportKind, TaskSchema>,
    orchestrator: Orchestrator,
    request_pool: WorkerPool,
    clock: Arc<dyn Clock>,
    idle_timeout: Duration,
    excerpt_chars: usize,
}

impl ReportService {
    pub fn builder(config: ReportConfig) -> ReportServiceBuilder {
        ReportServiceBuilder::new(config)
    }

    /// Production wiring: file or memory store, Yahoo quotes, REST
    /// fundamentals, and the configured LLM backend
    pub fn from_config(config: ReportConfig) -> Result<Self> {
        let rest: Arc<dyn DatasetProvider> = Arc::new(RestDatasetProvider::new(&config.data)?);
        let router = ProviderRouter::new()
            .route(DatasetKind::Quotes, Arc::new(YahooQuoteProvider::new()))
            .route_all(
                DatasetKind::ALL
                    .into_iter()
                    .filter(|kind| *kind != DatasetKind::Quotes),
                &rest,
            );
        let reasoner = build_reasoner(&config.reasoning)?;

        let builder = match config.storage_dir.clone() {
            Some(dir) => {
                info!("Using file store at {}", dir.display());
                Self::builder(config).store(Arc::new(FileStore::new(dir)))
            }
            None => Self::builder(config).store(Arc::new(MemoryStore::new())),
        };
        builder.provider(Arc::new(router)).reasoner(reasoner).build()
    }

    /// Stream the report for `raw_entity`, generating it if needed
    ///
    /// Only an invalid entity identifier fails here; every later problem is
    /// delivered as the stream's terminal `ERROR` event.
    pub fn get_or_generate(
        &self,
        raw_entity: &str,
        kind: ReportKind,
        force: bool,
    ) -> Result<ProgressStream> {
        let entity = EntityId::parse(raw_entity)?;
        let request_id = Uuid::new_v4();
        let (channel, stream) = progress::channel(self.inner.idle_timeout);

        let inner = Arc::clone(&self.inner);
        let worker_channel = channel.clone();
        let handle = self.inner.request_pool.spawn(async move {
            match inner
                .handle(request_id, entity, kind, force, &worker_channel)
                .await
            {
                Ok(report) => {
                    worker_channel.complete(report);
                }
                Err(e) => {
                    error!(%request_id, "Report request failed: {e}");
                    worker_channel.fail(e.to_string());
                }
            }
        });

        // Covers a shut-down request pool and a panicking request
        tokio::spawn(async move {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    channel.fail(e.to_string());
                }
                Err(e) => {
                    error!(%request_id, "Report request aborted: {e}");
                    channel.fail(format!("report request aborted: {e}"));
                }
            }
        });

        Ok(stream)
    }

    /// Read a stored report without generating one
    pub async fn load(&self, raw_entity: &str, kind: ReportKind) -> Result<Option<Report>> {
        let entity = EntityId::parse(raw_entity)?;
        self.inner.reports.load_report(&entity, kind).await
    }

    /// Remove every dataset and stored report for the entity
    pub async fn purge(&self, raw_entity: &str) -> Result<PurgeSummary> {
        let entity = EntityId::parse(raw_entity)?;
        let datasets = self.inner.cache.purge(&entity).await?;
        let reports = self.inner.reports.delete_reports(&entity).await?;
        info!(%entity, datasets, reports, "Purged entity");
        Ok(PurgeSummary { datasets, reports })
    }

    pub fn schema(&self, kind: ReportKind) -> Option<&TaskSchema> {
        self.inner.schemas.get(&kind)
    }

    /// Stop accepting requests; in-flight work runs to completion
    pub fn shutdown(&self) {
        self.inner.request_pool.shutdown();
        self.inner.orchestrator.pool().shutdown();
    }
}

impl ServiceInner {
    #[instrument(
        name = "report_request",
        skip_all,
        fields(request_id = %request_id, entity = %entity, kind = %kind, force)
    )]
    async fn handle(
        &self,
        request_id: Uuid,
        entity: EntityId,
        kind: ReportKind,
        force: bool,
        channel: &ProgressChannel,
    ) -> Result<Report> {
        if !force {
            if let Some(report) = self.reports.load_report(&entity, kind).await? {
                info!("Serving stored report");
                channel.message(&format!(
                    "Loaded stored {kind} report for {entity} generated at {}",
                    report.generated_at.to_rfc3339()
                ));
                return Ok(report);
            }
        }

        let schema = self.schemas.get(&kind).ok_or_else(|| {
            ReportError::Config(format!("no task schema configured for {kind} reports"))
        })?;
        info!(tasks = schema.len(), "Generating report");
        channel.message(&format!("Generating {kind} report for {entity}"));

        let required = schema.required_datasets();
        channel.message(&format!("Refreshing {} datasets", required.len()));
        let ensured = self.cache.ensure_all(&entity, &required).await?;
        for (dataset, reason) in &ensured.missing {
            channel.message(&format!("{dataset} unavailable: {reason}"));
        }

        let sink: Arc<dyn ProgressSink> = Arc::new(channel.clone());
        let ctx = Arc::new(ScoringContext::new(
            entity.clone(),
            kind,
            ensured,
            self.excerpt_chars,
            sink,
        ));
        channel.message(&format!("Running {} scoring tasks", schema.len()));
        let items = self.orchestrator.run(schema, ctx).await?;

        let report = Report::new(entity, kind, items, self.clock.now());
        self.reports.save_report(&report).await?;
        info!(
            total_score = report.total_score(),
            failed = report.failed_count(),
            "Report stored"
        );
        Ok(report)
    }
}

fn build_reasoner(config: &ReasoningConfig) -> Result<Arc<dyn ReasoningService>> {
    let timeout_secs = config.timeout.as_secs();
    let provider: Arc<dyn LLMProvider> = match config.backend {
        ReasoningBackend::OpenAI => {
            // Local OpenAI-compatible servers accept any key
            let key = config.api_key.clone().unwrap_or_else(|| "not-needed".to_string());
            let mut openai = OpenAIConfig::new(key).with_timeout(timeout_secs);
            if let Some(base) = &config.api_base {
                openai = openai.with_api_base(base);
            }
            Arc::new(OpenAIProvider::with_config(openai)?)
        }
        ReasoningBackend::Anthropic => {
            let key = config.api_key.clone().ok_or_else(|| {
                ReportError::Config("Anthropic backend needs an API key".to_string())
            })?;
            let mut anthropic = AnthropicConfig::new(key).with_timeout(timeout_secs);
            if let Some(base) = &config.api_base {
                anthropic = anthropic.with_api_base(base);
            }
            Arc::new(AnthropicProvider::with_config(anthropic)?)
        }
    };

    let reasoner_config = ReasonerConfig {
        model: config.model.clone(),
        max_tokens: config.max_tokens,
        temperature: config.temperature,
        json_output: config.json_mode,
        ..ReasonerConfig::default()
    };
    Ok(Arc::new(LlmReasoner::new(provider, reasoner_config)))
}

/// Assembles a [`ReportService`] from its collaborators
pub struct ReportServiceBuilder {
    config: ReportConfig,
    datasets: Option<Arc<dyn DatasetRepository>>,
    reports: Option<Arc<dyn ReportRepository>>,
    provider: Option<Arc<dyn DatasetProvider>>,
    reasoner: Option<Arc<dyn ReasoningService>>,
    clock: Arc<dyn Clock>,
    schemas: HashMap<ReportKind, TaskSchema>,
}

impl ReportServiceBuilder {
    pub fn new(config: ReportConfig) -> Self {
        Self {
            config,
            datasets: None,
            reports: None,
            provider: None,
            reasoner: None,
            clock: Arc::new(SystemClock),
            schemas: HashMap::new(),
        }
    }

    /// Use one store for both datasets and reports
    pub fn store<S>(mut self, store: Arc<S>) -> Self
    where
        S: DatasetRepository + ReportRepository + 'static,
    {
        self.datasets = Some(Arc::clone(&store) as Arc<dyn DatasetRepository>);
        self.reports = Some(store);
        self
    }

    pub fn dataset_repository(mut self, repo: Arc<dyn DatasetRepository>) -> Self {
        self.datasets = Some(repo);
        self
    }

    pub fn report_repository(mut self, repo: Arc<dyn ReportRepository>) -> Self {
        self.reports = Some(repo);
        self
    }

    pub fn provider(mut self, provider: Arc<dyn DatasetProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn reasoner(mut self, reasoner: Arc<dyn ReasoningService>) -> Self {
        self.reasoner = Some(reasoner);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the factor-derived schema of a report kind
    pub fn schema(mut self, kind: ReportKind, schema: TaskSchema) -> Self {
        self.schemas.insert(kind, schema);
        self
    }

    pub fn build(mut self) -> Result<ReportService> {
        self.config.validate()?;

        let provider = self
            .provider
            .ok_or_else(|| ReportError::Config("a dataset provider is required".to_string()))?;

        for kind in ReportKind::ALL {
            if self.schemas.contains_key(&kind) {
                continue;
            }
            let reasoner = self.reasoner.as_ref().ok_or_else(|| {
                ReportError::Config(format!("{kind} reports need a reasoning service"))
            })?;
            self.schemas.insert(kind, TaskSchema::for_kind(kind, reasoner)?);
        }

        let memory = Arc::new(MemoryStore::new());
        let datasets = self
            .datasets
            .unwrap_or_else(|| Arc::clone(&memory) as Arc<dyn DatasetRepository>);
        let reports = self.reports.unwrap_or(memory);

        let cache = DatasetCache::new(
            datasets,
            provider,
            self.config.dataset_ttls.clone(),
            Arc::clone(&self.clock),
        );

        Ok(ReportService {
            inner: Arc::new(ServiceInner {
                cache,
                reports,
                schemas: self.schemas,
                orchestrator: Orchestrator::new(WorkerPool::new(
                    "task",
                    self.config.task_pool_size,
                )),
                request_pool: WorkerPool::new("request", self.config.request_pool_size),
                clock: self.clock,
                idle_timeout: self.config.progress_idle_timeout,
                excerpt_chars: self.config.excerpt_chars,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockDatasetProvider;
    use crate::tasks::{ScoringTask, TaskDescriptor};
    use async_trait::async_trait;
    use report_core::{ProgressEvent, ScoringTaskResult};
    use serde_json::json;

    struct Fixed;

    #[async_trait]
    impl ScoringTask for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn required_datasets(&self) -> &[DatasetKind] {
            &[DatasetKind::Quotes]
        }

        async fn score(&self, ctx: &ScoringContext) -> ScoringTaskResult {
            ctx.progress().message("fixed running");
            ScoringTaskResult::ok("fixed", 1, "ok")
        }
    }

    fn single_task_schema() -> TaskSchema {
        TaskSchema::new(vec![TaskDescriptor::new(Arc::new(Fixed))])
    }

    fn service(provider: MockDatasetProvider) -> ReportService {
        ReportService::builder(ReportConfig::default())
            .provider(Arc::new(provider))
            .schema(ReportKind::Fundamental, single_task_schema())
            .schema(ReportKind::Growth, single_task_schema())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_invalid_entity_fails_before_streaming() {
        let service = service(MockDatasetProvider::new());
        let err = service
            .get_or_generate("  ", ReportKind::Fundamental, false)
            .unwrap_err();
        assert!(matches!(err, ReportError::InvalidEntity(_)));
    }

    #[tokio::test]
    async fn test_provider_failure_is_reported_and_absorbed() {
        let mut provider = MockDatasetProvider::new();
        provider
            .expect_fetch_dataset()
            .returning(|_, kind, _| Err(ReportError::provider(kind, "HTTP 503")));

        let events = service(provider)
            .get_or_generate("acme", ReportKind::Fundamental, false)
            .unwrap()
            .collect_events()
            .await;

        assert!(events.iter().any(
            |e| matches!(e, ProgressEvent::Message(text) if text.contains("quotes unavailable"))
        ));
        assert!(events.iter().any(|e| *e == ProgressEvent::Message("fixed running".into())));
        let ProgressEvent::Completed(report) = events.last().unwrap() else {
            panic!("expected COMPLETED, got {events:?}");
        };
        assert_eq!(report.entity.as_str(), "ACME");
        assert_eq!(report.names(), vec!["fixed"]);
    }

    #[tokio::test]
    async fn test_shut_down_service_streams_error() {
        let mut provider = MockDatasetProvider::new();
        provider.expect_fetch_dataset().returning(|_, _, _| Ok(json!([])));
        let service = service(provider);
        service.shutdown();

        let events = service
            .get_or_generate("ACME", ReportKind::Growth, true)
            .unwrap()
            .collect_events()
            .await;
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], ProgressEvent::Error(text) if text.contains("shut down")));
    }

    #[tokio::test]
    async fn test_missing_reasoner_is_config_error() {
        let result = ReportService::builder(ReportConfig::default())
            .provider(Arc::new(MockDatasetProvider::new()))
            .build();
        assert!(matches!(result, Err(ReportError::Config(_))));
    }

    #[test]
    fn test_openai_reasoner_without_key() {
        let config = ReasoningConfig {
            api_base: Some("http://localhost:1234/v1".to_string()),
            ..ReasoningConfig::default()
        };
        let reasoner = build_reasoner(&config).unwrap();
        assert_eq!(reasoner.name(), "openai");
    }
}
