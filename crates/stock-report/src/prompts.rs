//! Prompt templates for reasoning factors
//!
//! Templates use MiniJinja syntax and render with strict undefined-variable
//! checking, so a missing input is a render error instead of an empty hole in
//! the prompt.

use crate::error::{ReportError, Result};
use minijinja::{Environment, UndefinedBehavior, Value};

/// A named MiniJinja prompt
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    name: &'static str,
    source: &'static str,
}

impl PromptTemplate {
    /// Compile-check the template source
    pub fn new(name: &'static str, source: &'static str) -> Result<Self> {
        let env = Self::environment();
        env.template_from_str(source)?;
        Ok(Self { name, source })
    }

    /// Render with `vars`; errors name the template that failed
    pub fn render(&self, vars: &serde_json::Value) -> Result<String> {
        let env = Self::environment();
        let rendered = env
            .render_str(self.source, Value::from_serialize(vars))
            .map_err(|e| ReportError::Template(format!("{}: {e}", self.name)))?;
        Ok(rendered.trim().to_string())
    }

    fn environment() -> Environment<'static> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env
    }
}

const ANSWER_FORMAT: &str = "\
Rate the factor on an integer scale from -5 (very negative) to 5 (very positive), \
0 meaning neutral or inconclusive.
Respond with JSON only: {\"score\": <integer -5..5>, \"explanation\": \"<2-4 sentences>\"}";

macro_rules! prompt {
    ($body:literal) => {
        concat!($body, "\n\n{{ answer_format }}")
    };
}

pub const COMPETITIVE_MOAT: &str = prompt!(
    "Assess the durability of {{ ticker }}'s competitive advantages (brand, network effects, \
switching costs, cost advantages, intangibles).

Business description from the {{ fiscal_year }} annual report:
{{ business }}"
);

pub const MANAGEMENT_QUALITY: &str = prompt!(
    "Assess the quality and candour of {{ ticker }}'s management team.

Management's discussion and analysis ({{ fiscal_year }}):
{{ mda }}
{% if transcript %}
Latest earnings call ({{ transcript_label }}):
{{ transcript }}
{% endif %}"
);

pub const RISK_FACTORS: &str = prompt!(
    "Assess how severe and how likely the disclosed risks to {{ ticker }}'s business are. \
A positive score means the risks are modest and well managed.

Risk factors from the {{ fiscal_year }} annual report:
{{ risk_factors }}"
);

pub const EARNINGS_CALL_TONE: &str = prompt!(
    "Assess the tone of {{ ticker }}'s latest earnings call: confidence, specificity, \
and how management handled difficult questions.

Transcript ({{ transcript_label }}):
{{ transcript }}"
);

pub const GUIDANCE_CREDIBILITY: &str = prompt!(
    "Assess how credible {{ ticker }}'s forward guidance is given what management said \
and what analysts expect.

Earnings call ({{ transcript_label }}):
{{ transcript }}

Analyst consensus:
{{ estimates }}"
);

pub const CAPITAL_ALLOCATION: &str = prompt!(
    "Assess {{ ticker }}'s capital allocation: reinvestment, acquisitions, dividends, \
buybacks and balance sheet discipline.

Cash flow history:
{{ cash_flows }}

Management's discussion and analysis ({{ fiscal_year }}):
{{ mda }}"
);

pub const INDUSTRY_TAILWINDS: &str = prompt!(
    "Assess whether the industries {{ ticker }} operates in have structural tailwinds \
or headwinds over the next five years.

Business description ({{ fiscal_year }}):
{{ business }}
{% if segments %}
Revenue by segment:
{{ segments }}
{% endif %}"
);

pub const GROWTH_RUNWAY: &str = prompt!(
    "Assess how much room {{ ticker }} has to keep growing revenue at or above its \
current rate.

Business description ({{ fiscal_year }}):
{{ business }}
{% if segments %}
Revenue by segment:
{{ segments }}
{% endif %}{% if estimates %}
Analyst consensus:
{{ estimates }}
{% endif %}"
);

/// Shared answer-format instructions injected as `answer_format`
pub fn answer_format() -> &'static str {
    ANSWER_FORMAT
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_all_templates_compile() {
        for (name, source) in [
            ("competitive_moat", COMPETITIVE_MOAT),
            ("management_quality", MANAGEMENT_QUALITY),
            ("risk_factors", RISK_FACTORS),
            ("earnings_call_tone", EARNINGS_CALL_TONE),
            ("guidance_credibility", GUIDANCE_CREDIBILITY),
            ("capital_allocation", CAPITAL_ALLOCATION),
            ("industry_tailwinds", INDUSTRY_TAILWINDS),
            ("growth_runway", GROWTH_RUNWAY),
        ] {
            assert!(PromptTemplate::new(name, source).is_ok(), "{name} failed to compile");
        }
    }

    #[test]
    fn test_render_fills_variables() {
        let template = PromptTemplate::new("risk_factors", RISK_FACTORS).unwrap();
        let prompt = template
            .render(&json!({
                "ticker": "ACME",
                "fiscal_year": 2024,
                "risk_factors": "Anvil prices are volatile.",
                "answer_format": answer_format(),
            }))
            .unwrap();

        assert!(prompt.contains("ACME"));
        assert!(prompt.contains("Anvil prices are volatile."));
        assert!(prompt.ends_with("\"<2-4 sentences>\"}"));
    }

    #[test]
    fn test_missing_variable_is_an_error() {
        let template = PromptTemplate::new("risk_factors", RISK_FACTORS).unwrap();
        let err = template.render(&json!({"ticker": "ACME"})).unwrap_err();
        assert!(matches!(&err, ReportError::Template(msg) if msg.starts_with("risk_factors: ")));
    }

    #[test]
    fn test_optional_sections_accept_null() {
        let template = PromptTemplate::new("growth_runway", GROWTH_RUNWAY).unwrap();
        let prompt = template
            .render(&json!({
                "ticker": "ACME",
                "fiscal_year": 2024,
                "business": "Anvils.",
                "segments": null,
                "estimates": null,
                "answer_format": answer_format(),
            }))
            .unwrap();
        assert!(!prompt.contains("Analyst consensus"));
    }
}
