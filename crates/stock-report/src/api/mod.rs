//! Data provider clients
//!
//! A provider turns `(entity, kind, period)` into the raw JSON payload that
//! the dataset cache stores. Providers never retry; failures surface as
//! [`ReportError::Provider`](crate::error::ReportError::Provider).

pub mod rest;
pub mod yahoo;

pub use rest::RestDatasetProvider;
pub use yahoo::YahooQuoteProvider;

use crate::error::{ReportError, Result};
use async_trait::async_trait;
use report_core::{DatasetKind, EntityId, Period};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Origin of dataset payloads
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatasetProvider: Send + Sync {
    async fn fetch_dataset(
        &self,
        entity: &EntityId,
        kind: DatasetKind,
        period: Option<Period>,
    ) -> Result<serde_json::Value>;
}

/// Routes each dataset kind to the provider registered for it
#[derive(Default, Clone)]
pub struct ProviderRouter {
    routes: HashMap<DatasetKind, Arc<dyn DatasetProvider>>,
}

impl ProviderRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` for `kind`, replacing any previous route
    pub fn route(mut self, kind: DatasetKind, provider: Arc<dyn DatasetProvider>) -> Self {
        self.routes.insert(kind, provider);
        self
    }

    /// Register `provider` for several kinds
    pub fn route_all(
        mut self,
        kinds: impl IntoIterator<Item = DatasetKind>,
        provider: &Arc<dyn DatasetProvider>,
    ) -> Self {
        for kind in kinds {
            self.routes.insert(kind, Arc::clone(provider));
        }
        self
    }

    pub fn has_route(&self, kind: DatasetKind) -> bool {
        self.routes.contains_key(&kind)
    }
}

#[async_trait]
impl DatasetProvider for ProviderRouter {
    async fn fetch_dataset(
        &self,
        entity: &EntityId,
        kind: DatasetKind,
        period: Option<Period>,
    ) -> Result<serde_json::Value> {
        let provider = self
            .routes
            .get(&kind)
            .ok_or_else(|| ReportError::provider(kind, "no provider configured"))?;
        debug!(%entity, %kind, "Routing dataset fetch");
        provider.fetch_dataset(entity, kind, period).await
    }
}
