//! TTL-governed datasets sourced from external data providers

use crate::{EntityId, Error, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Kind of externally sourced data bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    /// Daily price bars
    Quotes,
    /// Annual income statements
    IncomeStatements,
    /// Annual balance sheets
    BalanceSheets,
    /// Annual cash flow statements
    CashFlows,
    /// Annual key ratios
    Ratios,
    /// Analyst consensus estimates
    Estimates,
    /// Revenue by business segment
    Segmentation,
    /// Sections extracted from annual filings (10-K)
    AnnualFilings,
    /// Earnings call transcripts
    EarningsTranscripts,
}

/// Reporting period requested from a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Annual,
    Quarter,
}

impl Period {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Quarter => "quarter",
        }
    }
}

impl DatasetKind {
    /// Every dataset kind, in a stable order
    pub const ALL: [DatasetKind; 9] = [
        Self::Quotes,
        Self::IncomeStatements,
        Self::BalanceSheets,
        Self::CashFlows,
        Self::Ratios,
        Self::Estimates,
        Self::Segmentation,
        Self::AnnualFilings,
        Self::EarningsTranscripts,
    ];

    /// Stable tag used in storage paths and logs
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quotes => "quotes",
            Self::IncomeStatements => "income_statements",
            Self::BalanceSheets => "balance_sheets",
            Self::CashFlows => "cash_flows",
            Self::Ratios => "ratios",
            Self::Estimates => "estimates",
            Self::Segmentation => "segmentation",
            Self::AnnualFilings => "annual_filings",
            Self::EarningsTranscripts => "earnings_transcripts",
        }
    }

    /// Payload schema version; stored bundles with another version are stale
    pub fn schema_version(self) -> u32 {
        match self {
            Self::AnnualFilings | Self::EarningsTranscripts => 2,
            _ => 1,
        }
    }

    /// Period to request from the provider, if the kind is periodic
    pub fn period(self) -> Option<Period> {
        match self {
            Self::Quotes => None,
            Self::EarningsTranscripts => Some(Period::Quarter),
            Self::IncomeStatements
            | Self::BalanceSheets
            | Self::CashFlows
            | Self::Ratios
            | Self::Estimates
            | Self::Segmentation
            | Self::AnnualFilings => Some(Period::Annual),
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::UnknownDatasetKind(s.to_string()))
    }
}

/// A stored bundle of provider data for one entity and kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub entity: EntityId,
    pub kind: DatasetKind,
    pub version: u32,
    pub payload: serde_json::Value,
    pub last_updated: DateTime<Utc>,
}

impl Dataset {
    /// Create a dataset stamped with the kind's current schema version
    pub fn new(
        entity: EntityId,
        kind: DatasetKind,
        payload: serde_json::Value,
        last_updated: DateTime<Utc>,
    ) -> Self {
        Self {
            entity,
            kind,
            version: kind.schema_version(),
            payload,
            last_updated,
        }
    }

    /// Fresh iff the schema version is current and `now - last_updated < ttl`
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        if self.version != self.kind.schema_version() {
            return false;
        }
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        now.signed_duration_since(self.last_updated) < ttl
    }

    /// Decode the payload into typed records
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.payload.clone()).map_err(|e| Error::PayloadDecode {
            kind: self.kind.to_string(),
            detail: e.to_string(),
        })
    }
}
