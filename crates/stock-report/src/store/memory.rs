//! In-process store

use super::{DatasetRepository, ReportRepository};
use crate::error::Result;
use async_trait::async_trait;
use report_core::{Dataset, DatasetKind, EntityId, Report, ReportKind};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Volatile store backed by hash maps
#[derive(Debug, Default)]
pub struct MemoryStore {
    datasets: RwLock<HashMap<(EntityId, DatasetKind), Dataset>>,
    reports: RwLock<HashMap<(EntityId, ReportKind), Report>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn dataset_count(&self) -> usize {
        self.datasets.read().await.len()
    }

    pub async fn report_count(&self) -> usize {
        self.reports.read().await.len()
    }
}

#[async_trait]
impl DatasetRepository for MemoryStore {
    async fn load_dataset(&self, entity: &EntityId, kind: DatasetKind) -> Result<Option<Dataset>> {
        let datasets = self.datasets.read().await;
        Ok(datasets.get(&(entity.clone(), kind)).cloned())
    }

    async fn save_dataset(&self, dataset: &Dataset) -> Result<()> {
        let mut datasets = self.datasets.write().await;
        datasets.insert((dataset.entity.clone(), dataset.kind), dataset.clone());
        Ok(())
    }

    async fn delete_datasets(&self, entity: &EntityId) -> Result<usize> {
        let mut datasets = self.datasets.write().await;
        let before = datasets.len();
        datasets.retain(|(owner, _), _| owner != entity);
        Ok(before - datasets.len())
    }
}

#[async_trait]
impl ReportRepository for MemoryStore {
    async fn load_report(&self, entity: &EntityId, kind: ReportKind) -> Result<Option<Report>> {
        let reports = self.reports.read().await;
        Ok(reports.get(&(entity.clone(), kind)).cloned())
    }

    async fn save_report(&self, report: &Report) -> Result<()> {
        let mut reports = self.reports.write().await;
        reports.insert((report.entity.clone(), report.kind), report.clone());
        Ok(())
    }

    async fn delete_reports(&self, entity: &EntityId) -> Result<usize> {
        let mut reports = self.reports.write().await;
        let before = reports.len();
        reports.retain(|(owner, _), _| owner != entity);
        Ok(before - reports.len())
    }
}
