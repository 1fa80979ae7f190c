//! Generic JSON REST provider for fundamentals, filings and transcripts
//!
//! Requests take the form `GET {base}/{path}/{TICKER}?period=..&apikey=..`,
//! where `path` is fixed per dataset kind.

use super::DatasetProvider;
use crate::config::DataConfig;
use crate::error::{ReportError, Result};
use async_trait::async_trait;
use report_core::{DatasetKind, EntityId, Period};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};

/// REST client serving every non-quote dataset kind
#[derive(Debug, Clone)]
pub struct RestDatasetProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl RestDatasetProvider {
    pub fn new(config: &DataConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Resource path for a dataset kind
    pub fn path(kind: DatasetKind) -> &'static str {
        match kind {
            DatasetKind::Quotes => "historical-price-full",
            DatasetKind::IncomeStatements => "income-statement",
            DatasetKind::BalanceSheets => "balance-sheet-statement",
            DatasetKind::CashFlows => "cash-flow-statement",
            DatasetKind::Ratios => "ratios",
            DatasetKind::Estimates => "analyst-estimates",
            DatasetKind::Segmentation => "revenue-product-segmentation",
            DatasetKind::AnnualFilings => "annual-filing-sections",
            DatasetKind::EarningsTranscripts => "earning-call-transcripts",
        }
    }

    fn url(&self, entity: &EntityId, kind: DatasetKind) -> String {
        format!("{}/{}/{}", self.base_url, Self::path(kind), entity)
    }

    fn query(&self, period: Option<Period>) -> Vec<(&'static str, String)> {
        let mut query = Vec::with_capacity(2);
        if let Some(period) = period {
            query.push(("period", period.as_str().to_string()));
        }
        if let Some(key) = &self.api_key {
            query.push(("apikey", key.clone()));
        }
        query
    }
}

#[async_trait]
impl DatasetProvider for RestDatasetProvider {
    #[instrument(skip(self), fields(entity = %entity))]
    async fn fetch_dataset(
        &self,
        entity: &EntityId,
        kind: DatasetKind,
        period: Option<Period>,
    ) -> Result<Value> {
        let response = self
            .client
            .get(self.url(entity, kind))
            .query(&self.query(period))
            .send()
            .await
            .map_err(|e| ReportError::provider(kind, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::provider(kind, format!("HTTP {status}")));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ReportError::provider(kind, format!("invalid JSON: {e}")))?;

        // Error bodies from this family of APIs arrive as 200 + {"Error Message": ..}
        if let Some(message) = payload.get("Error Message").and_then(Value::as_str) {
            return Err(ReportError::provider(kind, message));
        }
        if payload.as_array().is_some_and(Vec::is_empty) {
            return Err(ReportError::provider(kind, "empty response"));
        }
        debug!("Fetched {kind} payload");

        Ok(payload)
    }
}
