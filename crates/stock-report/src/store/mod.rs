//! Persistence for datasets and reports
//!
//! Both repositories are plain key-value stores with last-write-wins
//! semantics. There is no per-key locking: two concurrent writers for the
//! same key race and the later save is what remains.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;
use async_trait::async_trait;
use report_core::{Dataset, DatasetKind, EntityId, Report, ReportKind};

/// Storage for datasets keyed by `(entity, kind)`
#[async_trait]
pub trait DatasetRepository: Send + Sync {
    async fn load_dataset(&self, entity: &EntityId, kind: DatasetKind) -> Result<Option<Dataset>>;

    /// Replace whatever is stored for `(dataset.entity, dataset.kind)`
    async fn save_dataset(&self, dataset: &Dataset) -> Result<()>;

    /// Delete every dataset for the entity, returning how many were removed
    async fn delete_datasets(&self, entity: &EntityId) -> Result<usize>;
}

/// Storage for reports keyed by `(entity, report kind)`
#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn load_report(&self, entity: &EntityId, kind: ReportKind) -> Result<Option<Report>>;

    /// Store the report, overwriting any previous one for the same key
    async fn save_report(&self, report: &Report) -> Result<()>;

    /// Delete every report for the entity, returning how many were removed
    async fn delete_reports(&self, entity: &EntityId) -> Result<usize>;
}
