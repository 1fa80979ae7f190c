//! Read-only inputs shared by every scoring task of one request

use super::derived::DerivedInputs;
use crate::cache::EnsuredDatasets;
use report_core::{Dataset, DatasetKind, EntityId, NoopProgress, ProgressSink, ReportKind};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Everything a scoring task may read
///
/// Tasks share one context behind an `Arc` and never mutate it; each task
/// writes only its own result.
pub struct ScoringContext {
    pub entity: EntityId,
    pub report_kind: ReportKind,
    pub derived: DerivedInputs,
    datasets: HashMap<DatasetKind, Arc<Dataset>>,
    /// Kinds the provider could not supply, with the reason
    missing: HashMap<DatasetKind, String>,
    progress: Arc<dyn ProgressSink>,
}

impl ScoringContext {
    pub fn new(
        entity: EntityId,
        report_kind: ReportKind,
        ensured: EnsuredDatasets,
        excerpt_chars: usize,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        let derived = DerivedInputs::derive(&ensured.datasets, excerpt_chars);
        Self {
            entity,
            report_kind,
            derived,
            datasets: ensured.datasets,
            missing: ensured.missing.into_iter().collect(),
            progress,
        }
    }

    /// Context with no datasets and a silent progress sink
    pub fn empty(entity: EntityId, report_kind: ReportKind) -> Self {
        Self::new(
            entity,
            report_kind,
            EnsuredDatasets::default(),
            1,
            Arc::new(NoopProgress),
        )
    }

    pub fn dataset(&self, kind: DatasetKind) -> Option<&Dataset> {
        self.datasets.get(&kind).map(AsRef::as_ref)
    }

    /// Why a dataset is absent, for no-data explanations
    pub fn missing_reason(&self, kind: DatasetKind) -> String {
        self.missing
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| format!("{kind} not available"))
    }

    pub fn progress(&self) -> &dyn ProgressSink {
        self.progress.as_ref()
    }
}

impl fmt::Debug for ScoringContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoringContext")
            .field("entity", &self.entity)
            .field("report_kind", &self.report_kind)
            .field("datasets", &self.datasets.keys().collect::<Vec<_>>())
            .field("missing", &self.missing.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
