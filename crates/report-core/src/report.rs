//! Scoring task results and the fixed-schema report

use crate::{EntityId, Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lowest score a successful task may produce
pub const MIN_SCORE: i32 = -5;
/// Highest score a successful task may produce
pub const MAX_SCORE: i32 = 5;
/// Out-of-range score carried by a failed task
pub const FAILED_SCORE: i32 = -10;

/// Outcome status of a scoring task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Ok,
    Failed,
}

/// One named, scored and explained line of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringTaskResult {
    pub name: String,
    pub score: i32,
    pub explanation: String,
    pub status: TaskStatus,
}

impl ScoringTaskResult {
    /// A successful result; the score is clamped into the valid range
    pub fn ok(name: impl Into<String>, score: i32, explanation: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score: score.clamp(MIN_SCORE, MAX_SCORE),
            explanation: explanation.into(),
            status: TaskStatus::Ok,
        }
    }

    /// The neutral result for an expected missing-data case
    pub fn no_data(name: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            name: name.into(),
            score: 0,
            explanation: format!("No data: {reason}"),
            status: TaskStatus::Ok,
        }
    }

    /// The sentinel failure result, shape-identical to a success
    pub fn failed(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            explanation: format!("Operation '{name}' failed."),
            name,
            score: FAILED_SCORE,
            status: TaskStatus::Failed,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == TaskStatus::Failed
    }
}

/// Report flavour; each kind has its own ordered factor schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    #[default]
    Fundamental,
    Growth,
}

impl ReportKind {
    pub const ALL: [ReportKind; 2] = [Self::Fundamental, Self::Growth];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fundamental => "fundamental",
            Self::Growth => "growth",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lowered)
            .ok_or_else(|| Error::UnknownReportKind(s.to_string()))
    }
}

/// Ordered aggregate of every scoring task result for one entity and kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub entity: EntityId,
    pub kind: ReportKind,
    pub items: Vec<ScoringTaskResult>,
    pub generated_at: DateTime<Utc>,
}

impl Report {
    pub fn new(
        entity: EntityId,
        kind: ReportKind,
        items: Vec<ScoringTaskResult>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            entity,
            kind,
            items,
            generated_at,
        }
    }

    /// Sum of scores over successful items
    pub fn total_score(&self) -> i32 {
        self.items
            .iter()
            .filter(|item| !item.is_failed())
            .map(|item| item.score)
            .sum()
    }

    /// Number of items carrying the sentinel failure
    pub fn failed_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_failed()).count()
    }

    /// Look up an item by its declared name
    pub fn item(&self, name: &str) -> Option<&ScoringTaskResult> {
        self.items.iter().find(|item| item.name == name)
    }

    /// Item names in report order
    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.name.as_str()).collect()
    }
}
