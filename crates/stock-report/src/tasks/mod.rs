//! Scoring tasks and report schemas
//!
//! Every factor in a report is a [`ScoringTask`]. Local factors compute a
//! metric from datasets and map it through a threshold table; reasoning
//! factors render a prompt and ask the reasoning service. Either way a task
//! always returns a result: expected gaps become "no data" and anything else
//! becomes the sentinel failure.
//!
//! A [`TaskSchema`] is the ordered list of descriptors a report kind runs.
//! The order of descriptors is the order of items in the report.

pub mod local;
pub mod reasoning;
pub mod thresholds;

pub use local::{LocalMetric, LocalTask};
pub use reasoning::{ReasoningTask, ReasoningTopic};
pub use thresholds::Thresholds;

use crate::engine::ScoringContext;
use crate::error::Result;
use async_trait::async_trait;
use report_core::{DatasetKind, ReportKind, ScoringTaskResult};
use report_llm::ReasoningService;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// One independently executable factor
#[async_trait]
pub trait ScoringTask: Send + Sync {
    fn name(&self) -> &str;

    /// Datasets that must be ensured before the task runs
    fn required_datasets(&self) -> &[DatasetKind];

    /// Never fails: problems are folded into the returned result
    async fn score(&self, ctx: &ScoringContext) -> ScoringTaskResult;
}

/// A task together with the name its result carries in the report
#[derive(Clone)]
pub struct TaskDescriptor {
    pub name: String,
    pub task: Arc<dyn ScoringTask>,
}

impl TaskDescriptor {
    pub fn new(task: Arc<dyn ScoringTask>) -> Self {
        Self {
            name: task.name().to_string(),
            task,
        }
    }

    pub fn named(name: impl Into<String>, task: Arc<dyn ScoringTask>) -> Self {
        Self {
            name: name.into(),
            task,
        }
    }
}

impl fmt::Debug for TaskDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDescriptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Ordered task descriptors for one report kind
#[derive(Debug, Clone, Default)]
pub struct TaskSchema {
    descriptors: Vec<TaskDescriptor>,
}

impl TaskSchema {
    pub fn new(descriptors: Vec<TaskDescriptor>) -> Self {
        Self { descriptors }
    }

    /// Build the schema for a report kind from its factor list
    pub fn for_kind(kind: ReportKind, reasoner: &Arc<dyn ReasoningService>) -> Result<Self> {
        let descriptors = kind
            .factors()
            .iter()
            .map(|factor| factor.build(reasoner).map(TaskDescriptor::new))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(descriptors))
    }

    pub fn descriptors(&self) -> &[TaskDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.name.as_str()).collect()
    }

    /// Union of every task's required datasets
    pub fn required_datasets(&self) -> Vec<DatasetKind> {
        self.descriptors
            .iter()
            .flat_map(|d| d.task.required_datasets().iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Every factor a report can contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Factor {
    RevenueGrowth,
    GrossMarginTrend,
    OperatingMargin,
    NetDebtToEbitda,
    CurrentRatio,
    FreeCashFlowMargin,
    ShareDilution,
    ReturnOnEquity,
    PeValuation,
    ForwardRevenueGrowth,
    SegmentConcentration,
    PriceMomentum,
    CompetitiveMoat,
    ManagementQuality,
    RiskFactors,
    EarningsCallTone,
    GuidanceCredibility,
    CapitalAllocation,
    IndustryTailwinds,
    GrowthRunway,
}

/// How a factor is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorSpec {
    Local(LocalMetric),
    Reasoning(ReasoningTopic),
}

impl Factor {
    pub const ALL: [Factor; 20] = [
        Self::RevenueGrowth,
        Self::GrossMarginTrend,
        Self::OperatingMargin,
        Self::NetDebtToEbitda,
        Self::CurrentRatio,
        Self::FreeCashFlowMargin,
        Self::ShareDilution,
        Self::ReturnOnEquity,
        Self::PeValuation,
        Self::ForwardRevenueGrowth,
        Self::SegmentConcentration,
        Self::PriceMomentum,
        Self::CompetitiveMoat,
        Self::ManagementQuality,
        Self::RiskFactors,
        Self::EarningsCallTone,
        Self::GuidanceCredibility,
        Self::CapitalAllocation,
        Self::IndustryTailwinds,
        Self::GrowthRunway,
    ];

    /// Name of the factor's report item
    pub fn name(self) -> &'static str {
        match self {
            Self::RevenueGrowth => "revenue_growth",
            Self::GrossMarginTrend => "gross_margin_trend",
            Self::OperatingMargin => "operating_margin",
            Self::NetDebtToEbitda => "net_debt_to_ebitda",
            Self::CurrentRatio => "current_ratio",
            Self::FreeCashFlowMargin => "free_cash_flow_margin",
            Self::ShareDilution => "share_dilution",
            Self::ReturnOnEquity => "return_on_equity",
            Self::PeValuation => "pe_valuation",
            Self::ForwardRevenueGrowth => "forward_revenue_growth",
            Self::SegmentConcentration => "segment_concentration",
            Self::PriceMomentum => "price_momentum",
            Self::CompetitiveMoat => "competitive_moat",
            Self::ManagementQuality => "management_quality",
            Self::RiskFactors => "risk_factors",
            Self::EarningsCallTone => "earnings_call_tone",
            Self::GuidanceCredibility => "guidance_credibility",
            Self::CapitalAllocation => "capital_allocation",
            Self::IndustryTailwinds => "industry_tailwinds",
            Self::GrowthRunway => "growth_runway",
        }
    }

    pub fn spec(self) -> FactorSpec {
        use FactorSpec::{Local, Reasoning};
        match self {
            Self::RevenueGrowth => Local(LocalMetric::RevenueGrowth),
            Self::GrossMarginTrend => Local(LocalMetric::GrossMarginTrend),
            Self::OperatingMargin => Local(LocalMetric::OperatingMargin),
            Self::NetDebtToEbitda => Local(LocalMetric::NetDebtToEbitda),
            Self::CurrentRatio => Local(LocalMetric::CurrentRatio),
            Self::FreeCashFlowMargin => Local(LocalMetric::FreeCashFlowMargin),
            Self::ShareDilution => Local(LocalMetric::ShareDilution),
            Self::ReturnOnEquity => Local(LocalMetric::ReturnOnEquity),
            Self::PeValuation => Local(LocalMetric::PeValuation),
            Self::ForwardRevenueGrowth => Local(LocalMetric::ForwardRevenueGrowth),
            Self::SegmentConcentration => Local(LocalMetric::SegmentConcentration),
            Self::PriceMomentum => Local(LocalMetric::PriceMomentum),
            Self::CompetitiveMoat => Reasoning(ReasoningTopic::CompetitiveMoat),
            Self::ManagementQuality => Reasoning(ReasoningTopic::ManagementQuality),
            Self::RiskFactors => Reasoning(ReasoningTopic::RiskFactors),
            Self::EarningsCallTone => Reasoning(ReasoningTopic::EarningsCallTone),
            Self::GuidanceCredibility => Reasoning(ReasoningTopic::GuidanceCredibility),
            Self::CapitalAllocation => Reasoning(ReasoningTopic::CapitalAllocation),
            Self::IndustryTailwinds => Reasoning(ReasoningTopic::IndustryTailwinds),
            Self::GrowthRunway => Reasoning(ReasoningTopic::GrowthRunway),
        }
    }

    /// Instantiate the factor's task
    pub fn build(self, reasoner: &Arc<dyn ReasoningService>) -> Result<Arc<dyn ScoringTask>> {
        let task: Arc<dyn ScoringTask> = match self.spec() {
            FactorSpec::Local(metric) => Arc::new(LocalTask::new(self.name(), metric)),
            FactorSpec::Reasoning(topic) => Arc::new(ReasoningTask::new(
                self.name(),
                topic,
                Arc::clone(reasoner),
            )?),
        };
        Ok(task)
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered factor list of a report kind
pub trait ReportSchema {
    fn factors(self) -> &'static [Factor];
}

const FUNDAMENTAL_FACTORS: &[Factor] = &[
    Factor::RevenueGrowth,
    Factor::GrossMarginTrend,
    Factor::OperatingMargin,
    Factor::FreeCashFlowMargin,
    Factor::ReturnOnEquity,
    Factor::NetDebtToEbitda,
    Factor::CurrentRatio,
    Factor::ShareDilution,
    Factor::PeValuation,
    Factor::PriceMomentum,
    Factor::CompetitiveMoat,
    Factor::ManagementQuality,
    Factor::RiskFactors,
    Factor::EarningsCallTone,
    Factor::CapitalAllocation,
];

const GROWTH_FACTORS: &[Factor] = &[
    Factor::RevenueGrowth,
    Factor::ForwardRevenueGrowth,
    Factor::GrossMarginTrend,
    Factor::SegmentConcentration,
    Factor::ShareDilution,
    Factor::PriceMomentum,
    Factor::CompetitiveMoat,
    Factor::IndustryTailwinds,
    Factor::GrowthRunway,
    Factor::GuidanceCredibility,
    Factor::EarningsCallTone,
    Factor::ManagementQuality,
];

impl ReportSchema for ReportKind {
    fn factors(self) -> &'static [Factor] {
        match self {
            ReportKind::Fundamental => FUNDAMENTAL_FACTORS,
            ReportKind::Growth => GROWTH_FACTORS,
        }
    }
}
