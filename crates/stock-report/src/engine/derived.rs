//! Intermediates shared by several scoring tasks
//!
//! Computed once per request before fan-out so that tasks reading the same
//! transcript or filing section do not each decode and trim it again.

use crate::datasets::{
    AnalystEstimate, AnnualFiling, CashFlowStatement, EarningsTranscript, SegmentRevenue,
    chronological, latest,
};
use report_core::{Dataset, DatasetKind};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;

const TRUNCATION_MARKER: &str = " [...]";
const CASH_FLOW_YEARS: usize = 5;
const ESTIMATE_YEARS: usize = 3;

/// Latest earnings call, trimmed to `excerpt_chars`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptExcerpt {
    /// e.g. `Q3 2024`
    pub label: String,
    pub text: String,
}

/// Narrative sections of the latest annual filing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilingExcerpt {
    pub fiscal_year: i32,
    pub business: Option<String>,
    pub risk_factors: Option<String>,
    pub mda: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DerivedInputs {
    pub transcript: Option<TranscriptExcerpt>,
    pub filing: Option<FilingExcerpt>,
    /// One line per fiscal year: operating cash flow, capex, FCF, dividends, buybacks
    pub cash_flow_summary: Option<String>,
    pub estimates_summary: Option<String>,
    pub segments_summary: Option<String>,
}

impl DerivedInputs {
    pub fn derive(datasets: &HashMap<DatasetKind, Arc<Dataset>>, excerpt_chars: usize) -> Self {
        let transcripts: Option<Vec<EarningsTranscript>> =
            decode(datasets, DatasetKind::EarningsTranscripts);
        let filings: Option<Vec<AnnualFiling>> = decode(datasets, DatasetKind::AnnualFilings);
        let cash_flows: Option<Vec<CashFlowStatement>> = decode(datasets, DatasetKind::CashFlows);
        let estimates: Option<Vec<AnalystEstimate>> = decode(datasets, DatasetKind::Estimates);
        let segments: Option<Vec<SegmentRevenue>> = decode(datasets, DatasetKind::Segmentation);

        Self {
            transcript: transcripts.and_then(|rows| latest_transcript(rows, excerpt_chars)),
            filing: filings.and_then(|rows| filing_excerpt(&rows, excerpt_chars)),
            cash_flow_summary: cash_flows.and_then(summarize_cash_flows),
            estimates_summary: estimates.and_then(summarize_estimates),
            segments_summary: segments.and_then(|rows| summarize_segments(&rows)),
        }
    }
}

fn decode<T: DeserializeOwned>(
    datasets: &HashMap<DatasetKind, Arc<Dataset>>,
    kind: DatasetKind,
) -> Option<T> {
    datasets.get(&kind).and_then(|dataset| dataset.decode().ok())
}

/// Trim `text` to at most `max_chars` characters, marking the cut
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", text[..cut].trim_end()),
    }
}

fn latest_transcript(
    rows: Vec<EarningsTranscript>,
    excerpt_chars: usize,
) -> Option<TranscriptExcerpt> {
    rows.into_iter()
        .filter(|t| !t.content.trim().is_empty())
        .max_by_key(|t| (t.year, t.quarter))
        .map(|t| TranscriptExcerpt {
            label: format!("Q{} {}", t.quarter, t.year),
            text: excerpt(&t.content, excerpt_chars),
        })
}

fn filing_excerpt(rows: &[AnnualFiling], excerpt_chars: usize) -> Option<FilingExcerpt> {
    let filing = latest(rows)?;
    let section = |key| filing.section(key).map(|text| excerpt(text, excerpt_chars));
    let excerpt = FilingExcerpt {
        fiscal_year: filing.fiscal_year,
        business: section(AnnualFiling::BUSINESS),
        risk_factors: section(AnnualFiling::RISK_FACTORS),
        mda: section(AnnualFiling::MDA),
    };
    (excerpt.business.is_some() || excerpt.risk_factors.is_some() || excerpt.mda.is_some())
        .then_some(excerpt)
}

fn summarize_cash_flows(rows: Vec<CashFlowStatement>) -> Option<String> {
    let rows = chronological(rows);
    let recent = &rows[rows.len().saturating_sub(CASH_FLOW_YEARS)..];
    if recent.is_empty() {
        return None;
    }

    let mut out = String::new();
    for row in recent {
        let fcf = row.free_cash_flow.or_else(|| {
            row.operating_cash_flow
                .zip(row.capital_expenditure)
                .map(|(ocf, capex)| ocf - capex.abs())
        });
        let _ = writeln!(
            out,
            "FY{}: operating cash flow {}, capex {}, free cash flow {}, dividends {}, buybacks {}",
            row.fiscal_year,
            money(row.operating_cash_flow),
            money(row.capital_expenditure.map(f64::abs)),
            money(fcf),
            money(row.dividends_paid.map(f64::abs)),
            money(row.share_repurchases.map(f64::abs)),
        );
    }
    Some(out.trim_end().to_string())
}

fn summarize_estimates(rows: Vec<AnalystEstimate>) -> Option<String> {
    let rows = chronological(rows);
    let mut out = String::new();
    for row in rows.iter().rev().take(ESTIMATE_YEARS).rev() {
        let eps = row
            .eps_avg
            .map_or_else(|| "n/a".to_string(), |eps| format!("{eps:.2}"));
        let _ = writeln!(
            out,
            "FY{}: revenue {}, EPS {eps}",
            row.fiscal_year,
            money(row.revenue_avg)
        );
    }
    (!out.is_empty()).then(|| out.trim_end().to_string())
}

fn summarize_segments(rows: &[SegmentRevenue]) -> Option<String> {
    let latest = latest(rows)?;
    let total: f64 = latest.segments.values().sum();
    if latest.segments.is_empty() || total <= 0.0 {
        return None;
    }

    let mut segments: Vec<_> = latest.segments.iter().collect();
    segments.sort_by(|a, b| b.1.total_cmp(a.1));

    let mut out = format!("FY{}:", latest.fiscal_year);
    for (name, revenue) in segments {
        let _ = write!(out, " {name} {:.0}%,", revenue / total * 100.0);
    }
    out.pop();
    Some(out)
}

/// Compact currency formatting (`$1.2B`, `$340.0M`)
pub fn money(value: Option<f64>) -> String {
    let Some(value) = value else {
        return "n/a".to_string();
    };
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();
    if abs >= 1e12 {
        format!("{sign}${:.1}T", abs / 1e12)
    } else if abs >= 1e9 {
        format!("{sign}${:.1}B", abs / 1e9)
    } else if abs >= 1e6 {
        format!("{sign}${:.1}M", abs / 1e6)
    } else {
        format!("{sign}${abs:.0}")
    }
}
