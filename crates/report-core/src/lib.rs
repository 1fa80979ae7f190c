//! Core data model for stock-report
//!
//! This crate defines the types shared by every layer of the report pipeline:
//! the normalised entity identifier, TTL-governed datasets, scoring task results,
//! the fixed-schema report, and the progress events streamed to callers.

pub mod dataset;
pub mod entity;
pub mod error;
pub mod progress;
pub mod report;

pub use dataset::{Dataset, DatasetKind, Period};
pub use entity::EntityId;
pub use error::{Error, Result};
pub use progress::{NoopProgress, ProgressEvent, ProgressSink};
pub use report::{
    FAILED_SCORE, MAX_SCORE, MIN_SCORE, Report, ReportKind, ScoringTaskResult, TaskStatus,
};
