use crate::domain::vendor::VendorCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Named budget tier with a fixed single-day baseline spend.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BudgetBracket {
    Budget,
    Premium,
    Luxury,
    UltraLuxury,
}

impl BudgetBracket {
    pub const ALL: [BudgetBracket; 4] = [
        BudgetBracket::Budget,
        BudgetBracket::Premium,
        BudgetBracket::Luxury,
        BudgetBracket::UltraLuxury,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetBracket::Budget => "budget",
            BudgetBracket::Premium => "premium",
            BudgetBracket::Luxury => "luxury",
            BudgetBracket::UltraLuxury => "ultra_luxury",
        }
    }
}

impl fmt::Display for BudgetBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetBracket {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "budget" => Ok(BudgetBracket::Budget),
            "premium" => Ok(BudgetBracket::Premium),
            "luxury" => Ok(BudgetBracket::Luxury),
            "ultra_luxury" => Ok(BudgetBracket::UltraLuxury),
            other => Err(crate::error::invalid_input(
                "bracket",
                other,
                "one of budget, premium, luxury, ultra_luxury",
            )),
        }
    }
}

/// A scaled multi-day budget: the total is the sum of the per-category
/// allocations, each scaled by its own per-day multiplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetResult {
    pub total_budget: f64,
    pub category_breakdown: BTreeMap<VendorCategory, f64>,
}
