//! Deterministic factors computed from datasets

use super::{ScoringTask, Thresholds};
use crate::datasets::{
    AnalystEstimate, BalanceSheet, CashFlowStatement, IncomeStatement, KeyRatios, PriceBar,
    SegmentRevenue, chronological, latest,
};
use crate::engine::ScoringContext;
use async_trait::async_trait;
use report_core::{DatasetKind, ScoringTaskResult};
use serde::de::DeserializeOwned;
use ta::Next;
use ta::indicators::RelativeStrengthIndex;
use tracing::debug;

const GROWTH_YEARS: usize = 4;
const RSI_PERIOD: usize = 14;

/// A measured value plus the sentence explaining it
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub value: f64,
    pub detail: String,
}

/// `Err` carries the reason a metric has no data
pub type Outcome = std::result::Result<Measurement, String>;

const GROWTH_BANDS: Thresholds = Thresholds::new(
    &[
        (-10.0, -5),
        (-5.0, -3),
        (0.0, -2),
        (3.0, -1),
        (5.0, 0),
        (8.0, 1),
        (12.0, 2),
        (18.0, 3),
        (25.0, 4),
    ],
    5,
);
const MARGIN_TREND_BANDS: Thresholds = Thresholds::new(
    &[(-5.0, -4), (-2.0, -2), (-0.5, -1), (0.5, 0), (2.0, 1), (5.0, 2)],
    3,
);
const OPERATING_MARGIN_BANDS: Thresholds = Thresholds::new(
    &[
        (-10.0, -5),
        (0.0, -3),
        (5.0, -1),
        (10.0, 0),
        (15.0, 1),
        (20.0, 2),
        (25.0, 3),
        (35.0, 4),
    ],
    5,
);
const LEVERAGE_BANDS: Thresholds =
    Thresholds::new(&[(0.0, 5), (1.0, 3), (2.0, 1), (3.0, 0), (4.0, -2), (5.0, -4)], -5);
const LIQUIDITY_BANDS: Thresholds = Thresholds::new(
    &[(0.5, -4), (0.8, -2), (1.0, -1), (1.2, 0), (1.5, 1), (2.0, 2)],
    3,
);
const FCF_MARGIN_BANDS: Thresholds = Thresholds::new(
    &[
        (-10.0, -4),
        (0.0, -2),
        (3.0, 0),
        (6.0, 1),
        (10.0, 2),
        (15.0, 3),
        (20.0, 4),
    ],
    5,
);
const DILUTION_BANDS: Thresholds = Thresholds::new(
    &[(-5.0, 5), (-3.0, 4), (-1.0, 3), (0.5, 1), (2.0, -1), (4.0, -3), (7.0, -4)],
    -5,
);
const ROE_BANDS: Thresholds = Thresholds::new(
    &[
        (-10.0, -4),
        (0.0, -2),
        (5.0, -1),
        (10.0, 0),
        (15.0, 1),
        (20.0, 2),
        (25.0, 3),
        (35.0, 4),
    ],
    5,
);
const PE_BANDS: Thresholds = Thresholds::new(
    &[
        (8.0, 5),
        (12.0, 4),
        (16.0, 3),
        (20.0, 2),
        (25.0, 1),
        (30.0, 0),
        (40.0, -1),
        (60.0, -3),
    ],
    -5,
);
const CONCENTRATION_BANDS: Thresholds =
    Thresholds::new(&[(30.0, 3), (50.0, 2), (70.0, 1), (85.0, 0), (95.0, -1)], -2);
const RSI_BANDS: Thresholds = Thresholds::new(&[(30.0, -2), (45.0, -1), (55.0, 0), (70.0, 2)], 1);

/// The deterministic metrics a local factor can compute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalMetric {
    /// Compound annual revenue growth over up to four years, in %
    RevenueGrowth,
    /// Change in gross margin over up to four years, in percentage points
    GrossMarginTrend,
    /// Latest operating margin, in %
    OperatingMargin,
    /// (total debt - cash) / EBITDA
    NetDebtToEbitda,
    /// Current assets / current liabilities
    CurrentRatio,
    /// Latest free cash flow / revenue, in %
    FreeCashFlowMargin,
    /// Annual change in weighted average share count, in %
    ShareDilution,
    /// Latest return on equity, in %
    ReturnOnEquity,
    /// Latest price / earnings ratio
    PeValuation,
    /// Consensus revenue growth for the next fiscal year, in %
    ForwardRevenueGrowth,
    /// Share of revenue from the largest segment, in %
    SegmentConcentration,
    /// RSI(14) of daily closes
    PriceMomentum,
}

impl LocalMetric {
    pub fn required_datasets(self) -> &'static [DatasetKind] {
        use DatasetKind::{
            BalanceSheets, CashFlows, Estimates, IncomeStatements, Quotes, Ratios, Segmentation,
        };
        match self {
            Self::RevenueGrowth
            | Self::GrossMarginTrend
            | Self::OperatingMargin
            | Self::ShareDilution => &[IncomeStatements],
            Self::NetDebtToEbitda => &[BalanceSheets, IncomeStatements],
            Self::CurrentRatio => &[BalanceSheets],
            Self::FreeCashFlowMargin => &[CashFlows, IncomeStatements],
            Self::ReturnOnEquity | Self::PeValuation => &[Ratios],
            Self::ForwardRevenueGrowth => &[Estimates, IncomeStatements],
            Self::SegmentConcentration => &[Segmentation],
            Self::PriceMomentum => &[Quotes],
        }
    }

    pub fn thresholds(self) -> Thresholds {
        match self {
            Self::RevenueGrowth | Self::ForwardRevenueGrowth => GROWTH_BANDS,
            Self::GrossMarginTrend => MARGIN_TREND_BANDS,
            Self::OperatingMargin => OPERATING_MARGIN_BANDS,
            Self::NetDebtToEbitda => LEVERAGE_BANDS,
            Self::CurrentRatio => LIQUIDITY_BANDS,
            Self::FreeCashFlowMargin => FCF_MARGIN_BANDS,
            Self::ShareDilution => DILUTION_BANDS,
            Self::ReturnOnEquity => ROE_BANDS,
            Self::PeValuation => PE_BANDS,
            Self::SegmentConcentration => CONCENTRATION_BANDS,
            Self::PriceMomentum => RSI_BANDS,
        }
    }

    pub fn measure(self, ctx: &ScoringContext) -> Outcome {
        match self {
            Self::RevenueGrowth => revenue_growth(ctx),
            Self::GrossMarginTrend => gross_margin_trend(ctx),
            Self::OperatingMargin => operating_margin(ctx),
            Self::NetDebtToEbitda => net_debt_to_ebitda(ctx),
            Self::CurrentRatio => current_ratio(ctx),
            Self::FreeCashFlowMargin => free_cash_flow_margin(ctx),
            Self::ShareDilution => share_dilution(ctx),
            Self::ReturnOnEquity => return_on_equity(ctx),
            Self::PeValuation => pe_valuation(ctx),
            Self::ForwardRevenueGrowth => forward_revenue_growth(ctx),
            Self::SegmentConcentration => segment_concentration(ctx),
            Self::PriceMomentum => price_momentum(ctx),
        }
    }
}

/// Scoring task wrapping one [`LocalMetric`]
#[derive(Debug, Clone)]
pub struct LocalTask {
    name: String,
    metric: LocalMetric,
}

impl LocalTask {
    pub fn new(name: impl Into<String>, metric: LocalMetric) -> Self {
        Self {
            name: name.into(),
            metric,
        }
    }
}

#[async_trait]
impl ScoringTask for LocalTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_datasets(&self) -> &[DatasetKind] {
        self.metric.required_datasets()
    }

    async fn score(&self, ctx: &ScoringContext) -> ScoringTaskResult {
        match self.metric.measure(ctx) {
            Ok(m) if m.value.is_finite() => {
                let score = self.metric.thresholds().score(m.value);
                debug!(task = %self.name, value = m.value, score, "Scored");
                ScoringTaskResult::ok(&self.name, score, m.detail)
            }
            Ok(m) => {
                ScoringTaskResult::no_data(&self.name, format!("value {} is not finite", m.value))
            }
            Err(reason) => {
                debug!(task = %self.name, "No data: {reason}");
                ScoringTaskResult::no_data(&self.name, reason)
            }
        }
    }
}

fn rows<T: DeserializeOwned>(ctx: &ScoringContext, kind: DatasetKind) -> Result<Vec<T>, String> {
    let dataset = ctx.dataset(kind).ok_or_else(|| ctx.missing_reason(kind))?;
    let rows: Vec<T> = dataset.decode().map_err(|e| e.to_string())?;
    if rows.is_empty() {
        return Err(format!("{kind} dataset is empty"));
    }
    Ok(rows)
}

/// `(fiscal year, value)` pairs, oldest first, limited to the last `years + 1` points
fn series<T>(
    rows: &[T],
    years: usize,
    mut value: impl FnMut(&T) -> Option<(i32, f64)>,
) -> Vec<(i32, f64)> {
    let points: Vec<_> = rows.iter().filter_map(&mut value).collect();
    points[points.len().saturating_sub(years + 1)..].to_vec()
}

fn endpoints(points: &[(i32, f64)], what: &str) -> Result<((i32, f64), (i32, f64)), String> {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if last.0 > first.0 => Ok((*first, *last)),
        _ => Err(format!("need at least two years of {what}")),
    }
}

fn cagr(first: f64, last: f64, years: i32) -> f64 {
    ((last / first).powf(1.0 / f64::from(years)) - 1.0) * 100.0
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}

fn revenue_growth(ctx: &ScoringContext) -> Outcome {
    let statements = chronological(rows::<IncomeStatement>(ctx, DatasetKind::IncomeStatements)?);
    let points = series(&statements, GROWTH_YEARS, |r| {
        positive(r.revenue).map(|v| (r.fiscal_year, v))
    });
    let (first, last) = endpoints(&points, "revenue")?;
    let growth = cagr(first.1, last.1, last.0 - first.0);
    Ok(Measurement {
        value: growth,
        detail: format!(
            "Revenue grew {growth:.1}% a year from FY{} to FY{}.",
            first.0, last.0
        ),
    })
}

fn gross_margin_trend(ctx: &ScoringContext) -> Outcome {
    let statements = chronological(rows::<IncomeStatement>(ctx, DatasetKind::IncomeStatements)?);
    let points = series(&statements, GROWTH_YEARS, |r| {
        let revenue = positive(r.revenue)?;
        r.gross_profit.map(|gp| (r.fiscal_year, gp / revenue * 100.0))
    });
    let (first, last) = endpoints(&points, "gross margin")?;
    let change = last.1 - first.1;
    Ok(Measurement {
        value: change,
        detail: format!(
            "Gross margin moved from {:.1}% (FY{}) to {:.1}% (FY{}), {change:+.1} points.",
            first.1, first.0, last.1, last.0
        ),
    })
}

fn operating_margin(ctx: &ScoringContext) -> Outcome {
    let statements = chronological(rows::<IncomeStatement>(ctx, DatasetKind::IncomeStatements)?);
    let (year, margin) = statements
        .iter()
        .rev()
        .find_map(|r| {
            let revenue = positive(r.revenue)?;
            r.operating_income
                .map(|oi| (r.fiscal_year, oi / revenue * 100.0))
        })
        .ok_or("no operating income with positive revenue")?;
    Ok(Measurement {
        value: margin,
        detail: format!("Operating margin was {margin:.1}% in FY{year}."),
    })
}

fn net_debt_to_ebitda(ctx: &ScoringContext) -> Outcome {
    let sheets = rows::<BalanceSheet>(ctx, DatasetKind::BalanceSheets)?;
    let statements = rows::<IncomeStatement>(ctx, DatasetKind::IncomeStatements)?;
    let sheet = latest(&sheets).ok_or("no balance sheet")?;
    let debt = sheet.total_debt.ok_or("total debt not reported")?;
    let cash = sheet.cash_and_equivalents.unwrap_or(0.0);
    let ebitda = latest(&statements)
        .and_then(|r| positive(r.ebitda))
        .ok_or("EBITDA is missing or not positive")?;

    let leverage = (debt - cash) / ebitda;
    Ok(Measurement {
        value: leverage,
        detail: format!(
            "Net debt is {leverage:.2}x EBITDA as of FY{}.",
            sheet.fiscal_year
        ),
    })
}

fn current_ratio(ctx: &ScoringContext) -> Outcome {
    let sheets = chronological(rows::<BalanceSheet>(ctx, DatasetKind::BalanceSheets)?);
    let (year, ratio) = sheets
        .iter()
        .rev()
        .find_map(|s| {
            let liabilities = positive(s.total_current_liabilities)?;
            s.total_current_assets
                .map(|assets| (s.fiscal_year, assets / liabilities))
        })
        .ok_or("current assets or liabilities not reported")?;
    Ok(Measurement {
        value: ratio,
        detail: format!("Current ratio was {ratio:.2} in FY{year}."),
    })
}

fn free_cash_flow_margin(ctx: &ScoringContext) -> Outcome {
    let flows = rows::<CashFlowStatement>(ctx, DatasetKind::CashFlows)?;
    let statements = rows::<IncomeStatement>(ctx, DatasetKind::IncomeStatements)?;
    let flow = latest(&flows).ok_or("no cash flow statement")?;
    let fcf = flow
        .free_cash_flow
        .or_else(|| {
            flow.operating_cash_flow
                .zip(flow.capital_expenditure)
                .map(|(ocf, capex)| ocf - capex.abs())
        })
        .ok_or("free cash flow not reported")?;
    let revenue = statements
        .iter()
        .find(|r| r.fiscal_year == flow.fiscal_year)
        .or_else(|| latest(&statements))
        .and_then(|r| positive(r.revenue))
        .ok_or("revenue is missing or not positive")?;

    let margin = fcf / revenue * 100.0;
    Ok(Measurement {
        value: margin,
        detail: format!(
            "Free cash flow was {margin:.1}% of revenue in FY{}.",
            flow.fiscal_year
        ),
    })
}

fn share_dilution(ctx: &ScoringContext) -> Outcome {
    let statements = chronological(rows::<IncomeStatement>(ctx, DatasetKind::IncomeStatements)?);
    let points = series(&statements, GROWTH_YEARS, |r| {
        positive(r.weighted_average_shares).map(|v| (r.fiscal_year, v))
    });
    let (first, last) = endpoints(&points, "share counts")?;
    let change = cagr(first.1, last.1, last.0 - first.0);
    Ok(Measurement {
        value: change,
        detail: format!(
            "Share count changed {change:+.1}% a year from FY{} to FY{}.",
            first.0, last.0
        ),
    })
}

fn return_on_equity(ctx: &ScoringContext) -> Outcome {
    let ratios = chronological(rows::<KeyRatios>(ctx, DatasetKind::Ratios)?);
    let (year, roe) = ratios
        .iter()
        .rev()
        .find_map(|r| r.return_on_equity.map(|roe| (r.fiscal_year, roe * 100.0)))
        .ok_or("return on equity not reported")?;
    Ok(Measurement {
        value: roe,
        detail: format!("Return on equity was {roe:.1}% in FY{year}."),
    })
}

fn pe_valuation(ctx: &ScoringContext) -> Outcome {
    let ratios = chronological(rows::<KeyRatios>(ctx, DatasetKind::Ratios)?);
    let (year, pe) = ratios
        .iter()
        .rev()
        .find_map(|r| r.pe_ratio.map(|pe| (r.fiscal_year, pe)))
        .ok_or("P/E ratio not reported")?;
    if pe <= 0.0 {
        return Err(format!("P/E of {pe:.1} is not meaningful (negative earnings)"));
    }
    Ok(Measurement {
        value: pe,
        detail: format!("Shares traded at {pe:.1}x earnings in FY{year}."),
    })
}

fn forward_revenue_growth(ctx: &ScoringContext) -> Outcome {
    let statements = chronological(rows::<IncomeStatement>(ctx, DatasetKind::IncomeStatements)?);
    let estimates = chronological(rows::<AnalystEstimate>(ctx, DatasetKind::Estimates)?);

    let (actual_year, actual) = statements
        .iter()
        .rev()
        .find_map(|r| positive(r.revenue).map(|v| (r.fiscal_year, v)))
        .ok_or("no reported revenue")?;
    let (estimate_year, estimate) = estimates
        .iter()
        .filter(|e| e.fiscal_year > actual_year)
        .find_map(|e| positive(e.revenue_avg).map(|v| (e.fiscal_year, v)))
        .ok_or_else(|| format!("no revenue estimate after FY{actual_year}"))?;

    let growth = cagr(actual, estimate, estimate_year - actual_year);
    Ok(Measurement {
        value: growth,
        detail: format!(
            "Analysts expect revenue to grow {growth:.1}% a year \
             from FY{actual_year} to FY{estimate_year}."
        ),
    })
}

fn segment_concentration(ctx: &ScoringContext) -> Outcome {
    let segments = rows::<SegmentRevenue>(ctx, DatasetKind::Segmentation)?;
    let latest = latest(&segments).ok_or("no segment data")?;
    let total: f64 = latest.segments.values().filter(|v| **v > 0.0).sum();
    let (name, largest) = latest
        .segments
        .iter()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .filter(|_| total > 0.0)
        .ok_or("segment revenue not reported")?;

    let share = largest / total * 100.0;
    Ok(Measurement {
        value: share,
        detail: format!(
            "{name} is the largest of {} segments at {share:.0}% of FY{} revenue.",
            latest.segments.len(),
            latest.fiscal_year
        ),
    })
}

fn price_momentum(ctx: &ScoringContext) -> Outcome {
    let mut bars = rows::<PriceBar>(ctx, DatasetKind::Quotes)?;
    if bars.len() <= RSI_PERIOD {
        return Err(format!(
            "need more than {RSI_PERIOD} price bars, have {}",
            bars.len()
        ));
    }
    bars.sort_by_key(|bar| bar.timestamp);

    let mut rsi = RelativeStrengthIndex::new(RSI_PERIOD).map_err(|e| e.to_string())?;
    let value = bars.iter().fold(50.0, |_, bar| rsi.next(bar.close));
    let last_close = bars.last().map_or(0.0, |bar| bar.close);

    Ok(Measurement {
        value,
        detail: format!("RSI({RSI_PERIOD}) is {value:.1} with the last close at {last_close:.2}."),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EnsuredDatasets;
    use chrono::Utc;
    use report_core::{Dataset, EntityId, NoopProgress, ReportKind, TaskStatus};
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn context(entries: Vec<(DatasetKind, Value)>) -> ScoringContext {
        let entity = EntityId::parse("ACME").unwrap();
        let mut ensured = EnsuredDatasets::default();
        for (kind, payload) in entries {
            ensured.datasets.insert(
                kind,
                Arc::new(Dataset::new(entity.clone(), kind, payload, Utc::now())),
            );
        }
        ScoringContext::new(entity, ReportKind::Fundamental, ensured, 1000, Arc::new(NoopProgress))
    }

    fn income() -> Value {
        json!([
            {"fiscalYear": 2020, "revenue": 100.0, "grossProfit": 40.0, "operatingIncome": 10.0,
             "ebitda": 20.0, "weightedAverageShares": 1000.0},
            {"fiscalYear": 2022, "revenue": 121.0, "grossProfit": 50.0, "operatingIncome": 15.0,
             "ebitda": 25.0, "weightedAverageShares": 1000.0},
            {"fiscalYear": 2024, "revenue": 146.41, "grossProfit": 65.0, "operatingIncome": 30.0,
             "ebitda": 40.0, "weightedAverageShares": 960.0}
        ])
    }

    async fn score(metric: LocalMetric, ctx: &ScoringContext) -> ScoringTaskResult {
        LocalTask::new("factor", metric).score(ctx).await
    }

    #[tokio::test]
    async fn test_revenue_growth_cagr() {
        let ctx = context(vec![(DatasetKind::IncomeStatements, income())]);
        let outcome = LocalMetric::RevenueGrowth.measure(&ctx).unwrap();
        assert!((outcome.value - 10.0).abs() < 0.01, "{}", outcome.value);

        let result = score(LocalMetric::RevenueGrowth, &ctx).await;
        assert_eq!(result.score, 2);
        assert_eq!(result.status, TaskStatus::Ok);
    }

    #[tokio::test]
    async fn test_margins() {
        let ctx = context(vec![(DatasetKind::IncomeStatements, income())]);

        let trend = LocalMetric::GrossMarginTrend.measure(&ctx).unwrap();
        assert!(trend.value > 4.0 && trend.value < 5.0);

        let margin = LocalMetric::OperatingMargin.measure(&ctx).unwrap();
        assert!((margin.value - 20.49).abs() < 0.01);
        assert_eq!(score(LocalMetric::OperatingMargin, &ctx).await.score, 3);
    }

    #[tokio::test]
    async fn test_net_cash_scores_best_leverage() {
        let ctx = context(vec![
            (DatasetKind::IncomeStatements, income()),
            (
                DatasetKind::BalanceSheets,
                json!([{"fiscalYear": 2024, "totalDebt": 10.0, "cashAndEquivalents": 50.0,
                        "totalCurrentAssets": 90.0, "totalCurrentLiabilities": 60.0}]),
            ),
        ]);
        assert_eq!(score(LocalMetric::NetDebtToEbitda, &ctx).await.score, 5);
        assert_eq!(score(LocalMetric::CurrentRatio, &ctx).await.score, 2);
    }

    #[tokio::test]
    async fn test_buybacks_reward_share_count() {
        let ctx = context(vec![(DatasetKind::IncomeStatements, income())]);
        let outcome = LocalMetric::ShareDilution.measure(&ctx).unwrap();
        assert!(outcome.value < -1.0);
        assert_eq!(score(LocalMetric::ShareDilution, &ctx).await.score, 3);
    }

    #[tokio::test]
    async fn test_missing_dataset_is_no_data() {
        let ctx = context(Vec::new());
        let result = score(LocalMetric::PeValuation, &ctx).await;
        assert_eq!(result.score, 0);
        assert_eq!(result.status, TaskStatus::Ok);
        assert!(result.explanation.starts_with("No data:"));
        assert!(result.explanation.contains("ratios"));
    }

    #[tokio::test]
    async fn test_negative_pe_is_no_data() {
        let ctx = context(vec![(
            DatasetKind::Ratios,
            json!([{"fiscalYear": 2024, "peRatio": -12.0}]),
        )]);
        let result = score(LocalMetric::PeValuation, &ctx).await;
        assert_eq!(result.score, 0);
        assert!(result.explanation.contains("negative earnings"));
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_no_data() {
        let ctx = context(vec![(DatasetKind::Segmentation, json!({"unexpected": true}))]);
        let result = score(LocalMetric::SegmentConcentration, &ctx).await;
        assert_eq!(result.score, 0);
        assert!(!result.is_failed());
    }

    #[tokio::test]
    async fn test_forward_growth_uses_next_estimate() {
        let ctx = context(vec![
            (DatasetKind::IncomeStatements, income()),
            (
                DatasetKind::Estimates,
                json!([
                    {"fiscalYear": 2024, "revenueAvg": 140.0},
                    {"fiscalYear": 2025, "revenueAvg": 175.692},
                    {"fiscalYear": 2026, "revenueAvg": 200.0}
                ]),
            ),
        ]);
        let outcome = LocalMetric::ForwardRevenueGrowth.measure(&ctx).unwrap();
        assert!((outcome.value - 20.0).abs() < 0.01);
        assert!(outcome.detail.contains("FY2025"));
    }

    #[tokio::test]
    async fn test_rising_prices_have_strong_momentum() {
        let bars: Vec<Value> = (0..30)
            .map(|i| {
                let close = 100.0 + f64::from(i) + if i % 3 == 0 { -0.5 } else { 0.0 };
                json!({"timestamp": 1_700_000_000 + i64::from(i) * 86_400,
                       "open": close, "high": close, "low": close, "close": close, "volume": 1000})
            })
            .collect();
        let ctx = context(vec![(DatasetKind::Quotes, Value::Array(bars))]);

        let outcome = LocalMetric::PriceMomentum.measure(&ctx).unwrap();
        assert!(outcome.value > 70.0, "{}", outcome.value);
        assert_eq!(score(LocalMetric::PriceMomentum, &ctx).await.score, 1);
    }

    #[tokio::test]
    async fn test_short_price_history_is_no_data() {
        let ctx = context(vec![(DatasetKind::Quotes, json!([
            {"timestamp": 1, "open": 1.0, "high": 1.0, "low": 1.0, "close": 1.0, "volume": 1}
        ]))]);
        let result = score(LocalMetric::PriceMomentum, &ctx).await;
        assert_eq!(result.score, 0);
        assert!(result.explanation.contains("price bars"));
    }
}
