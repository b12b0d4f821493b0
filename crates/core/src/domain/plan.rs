use crate::domain::budget::BudgetResult;
use crate::domain::preferences::SchedulePreferences;
use crate::domain::vendor::VendorCategory;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Discrete confidence label used for UI badge coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
        }
    }
}

impl FromStr for ConfidenceTier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "high" => Ok(ConfidenceTier::High),
            "medium" => Ok(ConfidenceTier::Medium),
            "low" => Ok(ConfidenceTier::Low),
            other => Err(crate::error::invalid_input(
                "tier",
                other,
                "one of high, medium, low",
            )),
        }
    }
}

/// Bounded availability-confidence score for one vendor against one set of
/// schedule preferences. Always recomputed, never stored by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceResult {
    /// Clamped to [60, 95].
    pub percentage: i32,
    pub tier: ConfidenceTier,
}

/// One ranked vendor within a match snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchItem {
    /// 1-based rank within the vendor's category.
    pub rank: i32,
    pub vendor_id: Uuid,
    pub name: String,
    pub category: VendorCategory,
    pub rating: f64,
    pub confidence: ConfidenceResult,
}

/// The output of one worker run: ranked vendors per category plus the
/// scaled budget plan for the preferences the run was scored against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub as_of_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub preferences: SchedulePreferences,
    pub budget: BudgetResult,
    pub items: Vec<MatchItem>,
}
