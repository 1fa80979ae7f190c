//! Dataset freshness cache
//!
//! A read-through cache over the dataset repository. Each dataset kind has
//! its own TTL; a stale or outdated-schema dataset is re-fetched from the
//! provider and replaced wholesale. Concurrent `ensure` calls for the same
//! key are not deduplicated.

use crate::api::DatasetProvider;
use crate::clock::Clock;
use crate::config::DatasetTtls;
use crate::error::Result;
use crate::store::DatasetRepository;
use futures::future::join_all;
use report_core::{Dataset, DatasetKind, EntityId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Datasets gathered for one request
#[derive(Debug, Default, Clone)]
pub struct EnsuredDatasets {
    pub datasets: HashMap<DatasetKind, Arc<Dataset>>,
    /// Kinds the provider could not supply, with the reason
    pub missing: Vec<(DatasetKind, String)>,
}

impl EnsuredDatasets {
    pub fn get(&self, kind: DatasetKind) -> Option<&Arc<Dataset>> {
        self.datasets.get(&kind)
    }

    pub fn is_missing(&self, kind: DatasetKind) -> bool {
        self.missing.iter().any(|(missing, _)| *missing == kind)
    }
}

/// Read-through, per-kind TTL cache of provider datasets
#[derive(Clone)]
pub struct DatasetCache {
    repo: Arc<dyn DatasetRepository>,
    provider: Arc<dyn DatasetProvider>,
    ttls: DatasetTtls,
    clock: Arc<dyn Clock>,
}

impl DatasetCache {
    pub fn new(
        repo: Arc<dyn DatasetRepository>,
        provider: Arc<dyn DatasetProvider>,
        ttls: DatasetTtls,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            provider,
            ttls,
            clock,
        }
    }

    /// Return a fresh dataset, fetching and persisting it if needed
    ///
    /// Provider and storage errors propagate; nothing is retried.
    #[instrument(skip(self), fields(entity = %entity, kind = %kind))]
    pub async fn ensure(&self, entity: &EntityId, kind: DatasetKind) -> Result<Arc<Dataset>> {
        let now = self.clock.now();
        let ttl = self.ttls.ttl_for(kind);

        if let Some(stored) = self.repo.load_dataset(entity, kind).await? {
            if stored.is_fresh(now, ttl) {
                debug!("Dataset cache hit");
                return Ok(Arc::new(stored));
            }
            debug!(last_updated = %stored.last_updated, "Dataset stale, refreshing");
        } else {
            debug!("Dataset cache miss");
        }

        let payload = self
            .provider
            .fetch_dataset(entity, kind, kind.period())
            .await?;
        let dataset = Dataset::new(entity.clone(), kind, payload, now);
        self.repo.save_dataset(&dataset).await?;

        Ok(Arc::new(dataset))
    }

    /// Ensure every kind concurrently
    ///
    /// Provider failures are collected into [`EnsuredDatasets::missing`];
    /// any other failure aborts the whole call.
    pub async fn ensure_all(
        &self,
        entity: &EntityId,
        kinds: &[DatasetKind],
    ) -> Result<EnsuredDatasets> {
        let results = join_all(kinds.iter().map(|kind| async move {
            (*kind, self.ensure(entity, *kind).await)
        }))
        .await;

        let mut ensured = EnsuredDatasets::default();
        for (kind, result) in results {
            match result {
                Ok(dataset) => {
                    ensured.datasets.insert(kind, dataset);
                }
                Err(e) if e.is_provider() => {
                    warn!(%entity, %kind, "Dataset unavailable: {e}");
                    ensured.missing.push((kind, e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(ensured)
    }

    /// Delete every stored dataset for the entity
    pub async fn purge(&self, entity: &EntityId) -> Result<usize> {
        let removed = self.repo.delete_datasets(entity).await?;
        info!(%entity, removed, "Purged datasets");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockDatasetProvider;
    use crate::clock::FixedClock;
    use crate::error::ReportError;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::{TimeDelta, Utc};
    use serde_json::json;
    use std::time::Duration;

    const QUOTES_TTL_SECS: i64 = 6000;

    fn acme() -> EntityId {
        EntityId::parse("ACME").unwrap()
    }

    fn cache_with(
        store: Arc<MemoryStore>,
        provider: MockDatasetProvider,
        clock: Arc<FixedClock>,
    ) -> DatasetCache {
        let ttls = DatasetTtls {
            quotes: Duration::from_secs(QUOTES_TTL_SECS as u64),
            ..DatasetTtls::default()
        };
        DatasetCache::new(store, Arc::new(provider), ttls, clock)
    }

    #[tokio::test]
    async fn test_fresh_dataset_is_not_refetched() {
        let now = Utc::now();
        let store = Arc::new(MemoryStore::new());
        let seeded = Dataset::new(
            acme(),
            DatasetKind::Quotes,
            json!(["old"]),
            now - TimeDelta::seconds(QUOTES_TTL_SECS - 1),
        );
        store.save_dataset(&seeded).await.unwrap();

        let mut provider = MockDatasetProvider::new();
        provider.expect_fetch_dataset().times(0);

        let cache = cache_with(store, provider, Arc::new(FixedClock::new(now)));
        let dataset = cache.ensure(&acme(), DatasetKind::Quotes).await.unwrap();
        assert_eq!(*dataset, seeded);
    }

    #[tokio::test]
    async fn test_stale_dataset_is_replaced() {
        let now = Utc::now();
        let store = Arc::new(MemoryStore::new());
        let seeded = Dataset::new(
            acme(),
            DatasetKind::Quotes,
            json!(["old"]),
            now - TimeDelta::seconds(QUOTES_TTL_SECS + 1),
        );
        store.save_dataset(&seeded).await.unwrap();

        let mut provider = MockDatasetProvider::new();
        provider
            .expect_fetch_dataset()
            .times(1)
            .returning(|_, _, _| Ok(json!(["new"])));

        let cache = cache_with(Arc::clone(&store), provider, Arc::new(FixedClock::new(now)));
        let dataset = cache.ensure(&acme(), DatasetKind::Quotes).await.unwrap();
        assert_eq!(dataset.payload, json!(["new"]));
        assert_eq!(dataset.last_updated, now);

        let stored = store
            .load_dataset(&acme(), DatasetKind::Quotes)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.last_updated, now);
        assert_eq!(stored.payload, json!(["new"]));
    }

    #[tokio::test]
    async fn test_outdated_schema_forces_refetch() {
        let now = Utc::now();
        let store = Arc::new(MemoryStore::new());
        let mut seeded = Dataset::new(acme(), DatasetKind::AnnualFilings, json!([]), now);
        seeded.version = 1;
        store.save_dataset(&seeded).await.unwrap();

        let mut provider = MockDatasetProvider::new();
        provider
            .expect_fetch_dataset()
            .withf(|_, kind, period| {
                *kind == DatasetKind::AnnualFilings && *period == kind.period()
            })
            .times(1)
            .returning(|_, _, _| Ok(json!([{"fiscalYear": 2024}])));

        let cache = cache_with(store, provider, Arc::new(FixedClock::new(now)));
        let dataset = cache
            .ensure(&acme(), DatasetKind::AnnualFilings)
            .await
            .unwrap();
        assert_eq!(dataset.version, DatasetKind::AnnualFilings.schema_version());
    }

    #[tokio::test]
    async fn test_provider_error_propagates_from_ensure() {
        let store = Arc::new(MemoryStore::new());
        let mut provider = MockDatasetProvider::new();
        provider
            .expect_fetch_dataset()
            .returning(|_, kind, _| Err(ReportError::provider(kind, "HTTP 503")));

        let cache = cache_with(Arc::clone(&store), provider, Arc::new(FixedClock::new(Utc::now())));
        let err = cache.ensure(&acme(), DatasetKind::Ratios).await.unwrap_err();
        assert!(err.is_provider());
        assert_eq!(store.dataset_count().await, 0);
    }

    #[tokio::test]
    async fn test_ensure_all_collects_missing_kinds() {
        let store = Arc::new(MemoryStore::new());
        let mut provider = MockDatasetProvider::new();
        provider.expect_fetch_dataset().returning(|_, kind, _| {
            if kind == DatasetKind::Estimates {
                Err(ReportError::provider(kind, "not covered"))
            } else {
                Ok(json!([]))
            }
        });

        let cache = cache_with(store, provider, Arc::new(FixedClock::new(Utc::now())));
        let ensured = cache
            .ensure_all(
                &acme(),
                &[DatasetKind::Quotes, DatasetKind::Estimates, DatasetKind::Ratios],
            )
            .await
            .unwrap();

        assert_eq!(ensured.datasets.len(), 2);
        assert!(ensured.is_missing(DatasetKind::Estimates));
        assert!(ensured.get(DatasetKind::Quotes).is_some());
    }

    struct BrokenRepository;

    #[async_trait]
    impl DatasetRepository for BrokenRepository {
        async fn load_dataset(&self, _: &EntityId, _: DatasetKind) -> Result<Option<Dataset>> {
            Ok(None)
        }

        async fn save_dataset(&self, _: &Dataset) -> Result<()> {
            Err(ReportError::Storage("read-only".to_string()))
        }

        async fn delete_datasets(&self, _: &EntityId) -> Result<usize> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_storage_failure_aborts_ensure_all() {
        let mut provider = MockDatasetProvider::new();
        provider.expect_fetch_dataset().returning(|_, _, _| Ok(json!([])));

        let cache = DatasetCache::new(
            Arc::new(BrokenRepository),
            Arc::new(provider),
            DatasetTtls::default(),
            Arc::new(FixedClock::new(Utc::now())),
        );
        let err = cache
            .ensure_all(&acme(), &[DatasetKind::Quotes])
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Storage(_)));
    }

    #[tokio::test]
    async fn test_purge_removes_entity_datasets() {
        let store = Arc::new(MemoryStore::new());
        let mut provider = MockDatasetProvider::new();
        provider.expect_fetch_dataset().returning(|_, _, _| Ok(json!([])));

        let cache = cache_with(Arc::clone(&store), provider, Arc::new(FixedClock::new(Utc::now())));
        cache
            .ensure_all(&acme(), &[DatasetKind::Quotes, DatasetKind::Ratios])
            .await
            .unwrap();

        assert_eq!(cache.purge(&acme()).await.unwrap(), 2);
        assert_eq!(store.dataset_count().await, 0);
    }
}
