//! Daily price history from Yahoo Finance

use super::DatasetProvider;
use crate::datasets::PriceBar;
use crate::error::{ReportError, Result};
use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use report_core::{DatasetKind, EntityId, Period};
use time::OffsetDateTime;
use tracing::{debug, instrument};
use yahoo_finance_api as yahoo;

const DEFAULT_HISTORY_DAYS: i64 = 365;

/// Quote provider backed by the Yahoo Finance chart API
#[derive(Debug, Clone)]
pub struct YahooQuoteProvider {
    history: TimeDelta,
}

impl Default for YahooQuoteProvider {
    fn default() -> Self {
        Self {
            history: TimeDelta::days(DEFAULT_HISTORY_DAYS),
        }
    }
}

impl YahooQuoteProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// How far back to request bars
    pub fn with_history(mut self, history: TimeDelta) -> Self {
        self.history = history;
        self
    }

    async fn price_history(&self, symbol: &str) -> Result<Vec<PriceBar>> {
        let quotes_err = |e: &dyn std::fmt::Display| ReportError::provider(DatasetKind::Quotes, e);

        let connector = yahoo::YahooConnector::new().map_err(|e| quotes_err(&e))?;

        let end = Utc::now();
        let start = end - self.history;
        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| quotes_err(&format!("Invalid start timestamp: {e}")))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| quotes_err(&format!("Invalid end timestamp: {e}")))?;

        let response = connector
            .get_quote_history(symbol, start_odt, end_odt)
            .await
            .map_err(|e| quotes_err(&e))?;
        let quotes = response.quotes().map_err(|e| quotes_err(&e))?;

        Ok(quotes
            .iter()
            .map(|q| PriceBar {
                timestamp: q.timestamp as i64,
                open: q.open,
                high: q.high,
                low: q.low,
                close: q.close,
                volume: q.volume,
            })
            .collect())
    }
}

#[async_trait]
impl DatasetProvider for YahooQuoteProvider {
    #[instrument(skip(self), fields(entity = %entity))]
    async fn fetch_dataset(
        &self,
        entity: &EntityId,
        kind: DatasetKind,
        _period: Option<Period>,
    ) -> Result<serde_json::Value> {
        if kind != DatasetKind::Quotes {
            return Err(ReportError::provider(kind, "Yahoo Finance only serves quotes"));
        }

        let bars = self.price_history(entity.as_str()).await?;
        if bars.is_empty() {
            return Err(ReportError::provider(kind, "no price history returned"));
        }
        debug!("Fetched {} daily bars", bars.len());

        Ok(serde_json::to_value(bars)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_non_quote_kinds() {
        let provider = YahooQuoteProvider::new();
        let entity = EntityId::parse("ACME").unwrap();

        let err = provider
            .fetch_dataset(&entity, DatasetKind::BalanceSheets, Some(Period::Annual))
            .await
            .unwrap_err();
        assert!(err.is_provider());
    }

    #[test]
    fn test_history_window() {
        let provider = YahooQuoteProvider::new().with_history(TimeDelta::days(30));
        assert_eq!(provider.history, TimeDelta::days(30));
    }
}
