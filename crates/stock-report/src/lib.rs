//! Multi-factor stock reports
//!
//! This crate turns a ticker into a fixed-schema report of scored factors.
//! It includes:
//!
//! - A dataset freshness cache that refetches per-kind data once its TTL lapses
//! - Local scoring tasks (threshold tables over financial metrics and RSI)
//! - Reasoning scoring tasks (prompt templates answered by an LLM)
//! - An orchestrator that runs every task concurrently on a bounded pool and
//!   assembles the results in declared order
//! - A per-request progress stream ending in exactly one terminal event
//! - File and in-memory stores for datasets and reports
//! - An axum SSE server and the `stock-report` CLI
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use report_core::{ProgressEvent, ReportKind};
//! use stock_report::{ReportConfig, ReportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let service = ReportService::from_config(ReportConfig::from_env()?)?;
//!
//!     let mut progress = service.get_or_generate("AAPL", ReportKind::Fundamental, false)?;
//!     while let Some(event) = progress.next().await {
//!         if let ProgressEvent::Completed(report) = event {
//!             println!("total score: {}", report.total_score());
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod datasets;
pub mod engine;
pub mod error;
pub mod progress;
pub mod prompts;
pub mod server;
pub mod service;
pub mod store;
pub mod tasks;

pub use api::{DatasetProvider, ProviderRouter, RestDatasetProvider, YahooQuoteProvider};
pub use cache::{DatasetCache, EnsuredDatasets};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{DataConfig, DatasetTtls, ReasoningBackend, ReasoningConfig, ReportConfig};
pub use engine::{Orchestrator, ScoringContext, WorkerPool};
pub use error::{ReportError, Result};
pub use progress::{ProgressChannel, ProgressStream};
pub use service::{PurgeSummary, ReportService, ReportServiceBuilder};
pub use store::{DatasetRepository, FileStore, MemoryStore, ReportRepository};
pub use tasks::{Factor, ReportSchema, ScoringTask, TaskDescriptor, TaskSchema};
