//! Typed records decoded from dataset payloads
//!
//! Payloads are stored as provider JSON (camelCase fields). Every numeric
//! field is optional because providers omit values freely; scoring code
//! treats a missing value as "no data" for that factor.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One daily price bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBar {
    /// Unix timestamp (seconds)
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeStatement {
    #[serde(alias = "calendarYear")]
    pub fiscal_year: i32,
    pub revenue: Option<f64>,
    pub gross_profit: Option<f64>,
    pub operating_income: Option<f64>,
    pub net_income: Option<f64>,
    pub ebitda: Option<f64>,
    #[serde(alias = "weightedAverageShsOut")]
    pub weighted_average_shares: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheet {
    #[serde(alias = "calendarYear")]
    pub fiscal_year: i32,
    pub total_current_assets: Option<f64>,
    pub total_current_liabilities: Option<f64>,
    pub total_debt: Option<f64>,
    pub cash_and_equivalents: Option<f64>,
    #[serde(alias = "totalStockholdersEquity")]
    pub total_equity: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowStatement {
    #[serde(alias = "calendarYear")]
    pub fiscal_year: i32,
    pub operating_cash_flow: Option<f64>,
    pub capital_expenditure: Option<f64>,
    pub free_cash_flow: Option<f64>,
    pub dividends_paid: Option<f64>,
    #[serde(alias = "commonStockRepurchased")]
    pub share_repurchases: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRatios {
    #[serde(alias = "calendarYear")]
    pub fiscal_year: i32,
    #[serde(alias = "priceEarningsRatio")]
    pub pe_ratio: Option<f64>,
    pub return_on_equity: Option<f64>,
}

/// Consensus estimate for one future fiscal year
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalystEstimate {
    pub fiscal_year: i32,
    #[serde(alias = "estimatedRevenueAvg")]
    pub revenue_avg: Option<f64>,
    #[serde(alias = "estimatedEpsAvg")]
    pub eps_avg: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRevenue {
    pub fiscal_year: i32,
    /// Segment name to revenue
    pub segments: BTreeMap<String, f64>,
}

/// Narrative sections extracted from one annual filing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualFiling {
    pub fiscal_year: i32,
    #[serde(default = "default_form")]
    pub form: String,
    /// Section key (`business`, `risk_factors`, `mda`) to text
    #[serde(default)]
    pub sections: BTreeMap<String, String>,
}

fn default_form() -> String {
    "10-K".to_string()
}

impl AnnualFiling {
    pub const BUSINESS: &'static str = "business";
    pub const RISK_FACTORS: &'static str = "risk_factors";
    pub const MDA: &'static str = "mda";

    pub fn section(&self, key: &str) -> Option<&str> {
        self.sections
            .get(key)
            .map(String::as_str)
            .filter(|text| !text.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsTranscript {
    pub year: i32,
    pub quarter: u8,
    #[serde(default)]
    pub date: Option<String>,
    pub content: String,
}

/// Anything keyed by fiscal year
pub trait FiscalYear {
    fn fiscal_year(&self) -> i32;
}

macro_rules! impl_fiscal_year {
    ($($ty:ty),*) => {
        $(impl FiscalYear for $ty {
            fn fiscal_year(&self) -> i32 {
                self.fiscal_year
            }
        })*
    };
}

impl_fiscal_year!(
    IncomeStatement,
    BalanceSheet,
    CashFlowStatement,
    KeyRatios,
    AnalystEstimate,
    SegmentRevenue,
    AnnualFiling
);

/// Sort oldest first by fiscal year
pub fn chronological<T: FiscalYear>(mut rows: Vec<T>) -> Vec<T> {
    rows.sort_by_key(FiscalYear::fiscal_year);
    rows
}

/// Latest row by fiscal year
pub fn latest<T: FiscalYear>(rows: &[T]) -> Option<&T> {
    rows.iter().max_by_key(|row| row.fiscal_year())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_aliases() {
        let rows: Vec<IncomeStatement> = serde_json::from_value(json!([
            {"calendarYear": 2023, "revenue": 10.0, "weightedAverageShsOut": 5.0},
            {"fiscalYear": 2022, "revenue": 8.0}
        ]))
        .unwrap();

        let rows = chronological(rows);
        assert_eq!(rows[0].fiscal_year, 2022);
        assert_eq!(rows[1].weighted_average_shares, Some(5.0));
        assert_eq!(rows[1].net_income, None);
    }

    #[test]
    fn test_latest_by_year() {
        let rows = vec![
            KeyRatios {
                fiscal_year: 2021,
                ..KeyRatios::default()
            },
            KeyRatios {
                fiscal_year: 2023,
                pe_ratio: Some(18.0),
                ..KeyRatios::default()
            },
        ];
        assert_eq!(latest(&rows).and_then(|r| r.pe_ratio), Some(18.0));
        assert!(latest::<KeyRatios>(&[]).is_none());
    }

    #[test]
    fn test_filing_sections() {
        let filing: AnnualFiling = serde_json::from_value(json!({
            "fiscalYear": 2023,
            "sections": {"business": "We make anvils.", "mda": "  "}
        }))
        .unwrap();
        assert_eq!(filing.form, "10-K");
        assert_eq!(filing.section(AnnualFiling::BUSINESS), Some("We make anvils."));
        assert_eq!(filing.section(AnnualFiling::MDA), None);
        assert_eq!(filing.section(AnnualFiling::RISK_FACTORS), None);
    }
}
