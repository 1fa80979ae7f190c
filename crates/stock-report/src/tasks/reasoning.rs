//! Factors scored by the reasoning service

use super::ScoringTask;
use crate::engine::ScoringContext;
use crate::error::{ReportError, Result};
use crate::prompts::{self, PromptTemplate};
use async_trait::async_trait;
use report_core::{DatasetKind, MAX_SCORE, MIN_SCORE, ScoringTaskResult};
use report_llm::{Assessment, LLMError, ReasoningService};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, warn};

/// Question put to the reasoning service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasoningTopic {
    CompetitiveMoat,
    ManagementQuality,
    RiskFactors,
    EarningsCallTone,
    GuidanceCredibility,
    CapitalAllocation,
    IndustryTailwinds,
    GrowthRunway,
}

impl ReasoningTopic {
    pub fn template_source(self) -> &'static str {
        match self {
            Self::CompetitiveMoat => prompts::COMPETITIVE_MOAT,
            Self::ManagementQuality => prompts::MANAGEMENT_QUALITY,
            Self::RiskFactors => prompts::RISK_FACTORS,
            Self::EarningsCallTone => prompts::EARNINGS_CALL_TONE,
            Self::GuidanceCredibility => prompts::GUIDANCE_CREDIBILITY,
            Self::CapitalAllocation => prompts::CAPITAL_ALLOCATION,
            Self::IndustryTailwinds => prompts::INDUSTRY_TAILWINDS,
            Self::GrowthRunway => prompts::GROWTH_RUNWAY,
        }
    }

    pub fn required_datasets(self) -> &'static [DatasetKind] {
        use DatasetKind::{AnnualFilings, CashFlows, EarningsTranscripts, Estimates, Segmentation};
        match self {
            Self::CompetitiveMoat | Self::RiskFactors => &[AnnualFilings],
            Self::ManagementQuality => &[AnnualFilings, EarningsTranscripts],
            Self::EarningsCallTone => &[EarningsTranscripts],
            Self::GuidanceCredibility => &[EarningsTranscripts, Estimates],
            Self::CapitalAllocation => &[CashFlows, AnnualFilings],
            Self::IndustryTailwinds => &[AnnualFilings, Segmentation],
            Self::GrowthRunway => &[AnnualFilings, Segmentation, Estimates],
        }
    }

    /// Template variables, or the input the topic cannot do without
    pub fn inputs(self, ctx: &ScoringContext) -> Result<Value> {
        let derived = &ctx.derived;
        let missing = |what: &str| ReportError::MissingInput(format!("{what} for {}", ctx.entity));

        let filing = derived.filing.as_ref();
        let fiscal_year = filing.map(|f| f.fiscal_year);
        let transcript = derived.transcript.as_ref();
        let business = || {
            filing
                .and_then(|f| f.business.as_ref())
                .ok_or_else(|| missing("business description"))
        };
        let mda = || {
            filing
                .and_then(|f| f.mda.as_ref())
                .ok_or_else(|| missing("MD&A section"))
        };

        let mut vars = match self {
            Self::CompetitiveMoat => json!({
                "fiscal_year": fiscal_year,
                "business": business()?,
            }),
            Self::ManagementQuality => json!({
                "fiscal_year": fiscal_year,
                "mda": mda()?,
                "transcript": transcript.map(|t| &t.text),
                "transcript_label": transcript.map(|t| &t.label),
            }),
            Self::RiskFactors => {
                let risk_factors = filing.and_then(|f| f.risk_factors.as_ref());
                json!({
                    "fiscal_year": fiscal_year,
                    "risk_factors": risk_factors.ok_or_else(|| missing("risk factors section"))?,
                })
            }
            Self::EarningsCallTone => {
                let transcript = transcript.ok_or_else(|| missing("earnings call transcript"))?;
                json!({
                    "transcript": transcript.text,
                    "transcript_label": transcript.label,
                })
            }
            Self::GuidanceCredibility => {
                let transcript = transcript.ok_or_else(|| missing("earnings call transcript"))?;
                let estimates = derived.estimates_summary.as_ref();
                json!({
                    "transcript": transcript.text,
                    "transcript_label": transcript.label,
                    "estimates": estimates.ok_or_else(|| missing("analyst estimates"))?,
                })
            }
            Self::CapitalAllocation => {
                let cash_flows = derived.cash_flow_summary.as_ref();
                json!({
                    "fiscal_year": fiscal_year,
                    "cash_flows": cash_flows.ok_or_else(|| missing("cash flow history"))?,
                    "mda": mda()?,
                })
            }
            Self::IndustryTailwinds => json!({
                "fiscal_year": fiscal_year,
                "business": business()?,
                "segments": derived.segments_summary,
            }),
            Self::GrowthRunway => json!({
                "fiscal_year": fiscal_year,
                "business": business()?,
                "segments": derived.segments_summary,
                "estimates": derived.estimates_summary,
            }),
        };

        if let Some(map) = vars.as_object_mut() {
            map.insert("ticker".to_string(), json!(ctx.entity.as_str()));
            map.insert("answer_format".to_string(), json!(prompts::answer_format()));
        }
        Ok(vars)
    }
}

/// Scoring task that renders a prompt and asks the reasoning service
pub struct ReasoningTask {
    name: String,
    topic: ReasoningTopic,
    template: PromptTemplate,
    reasoner: Arc<dyn ReasoningService>,
}

impl ReasoningTask {
    pub fn new(
        name: &'static str,
        topic: ReasoningTopic,
        reasoner: Arc<dyn ReasoningService>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            topic,
            template: PromptTemplate::new(name, topic.template_source())?,
            reasoner,
        })
    }

    async fn assess(&self, ctx: &ScoringContext) -> Result<Assessment> {
        let vars = self.topic.inputs(ctx)?;
        let prompt = self.template.render(&vars)?;
        debug!(task = %self.name, chars = prompt.len(), "Rendered prompt");

        let assessment = self.reasoner.invoke(&prompt).await?;
        if !(MIN_SCORE..=MAX_SCORE).contains(&assessment.score) {
            return Err(LLMError::InvalidAssessment(format!(
                "score {} outside {MIN_SCORE}..={MAX_SCORE}",
                assessment.score
            ))
            .into());
        }
        Ok(assessment)
    }
}

#[async_trait]
impl ScoringTask for ReasoningTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_datasets(&self) -> &[DatasetKind] {
        self.topic.required_datasets()
    }

    async fn score(&self, ctx: &ScoringContext) -> ScoringTaskResult {
        ctx.progress().message(&format!(
            "Evaluating {} for {}",
            self.name.replace('_', " "),
            ctx.entity
        ));

        match self.assess(ctx).await {
            Ok(assessment) => {
                ScoringTaskResult::ok(&self.name, assessment.score, assessment.explanation)
            }
            Err(e) => {
                warn!(task = %self.name, entity = %ctx.entity, "Reasoning factor failed: {e}");
                ScoringTaskResult::failed(&self.name)
            }
        }
    }
}
