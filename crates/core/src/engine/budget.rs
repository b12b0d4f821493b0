use crate::domain::budget::{BudgetBracket, BudgetResult};
use crate::domain::preferences::ensure_duration_days;
use crate::domain::vendor::VendorCategory;
use crate::error::invalid_input;
use std::collections::BTreeMap;

const SPLIT_SUM_TOLERANCE: f64 = 1e-9;

/// Bracket totals, category split, and per-day multipliers. Injected at
/// engine construction; `Default` carries the production tables.
///
/// Multipliers encode how each category's cost scales across celebration
/// days relative to a naively linear projection: venue and decoration reuse
/// setup across days, catering and makeup recur in full every day.
#[derive(Debug, Clone)]
pub struct BudgetTables {
    /// Single-day baseline spend per bracket.
    pub bracket_totals: BTreeMap<BudgetBracket, f64>,
    /// Fraction of the baseline assigned to each category; must sum to 1.
    pub category_split: BTreeMap<VendorCategory, f64>,
    /// Per-day scaling factor per category.
    pub day_multipliers: BTreeMap<VendorCategory, f64>,
}

impl Default for BudgetTables {
    fn default() -> Self {
        let bracket_totals = BTreeMap::from([
            (BudgetBracket::Budget, 1_000_000.0),
            (BudgetBracket::Premium, 2_500_000.0),
            (BudgetBracket::Luxury, 5_000_000.0),
            (BudgetBracket::UltraLuxury, 10_000_000.0),
        ]);

        let category_split = BTreeMap::from([
            (VendorCategory::Venue, 0.30),
            (VendorCategory::Catering, 0.25),
            (VendorCategory::Photography, 0.15),
            (VendorCategory::Decoration, 0.15),
            (VendorCategory::Makeup, 0.075),
            (VendorCategory::Miscellaneous, 0.075),
        ]);

        let day_multipliers = BTreeMap::from([
            (VendorCategory::Venue, 0.8),
            (VendorCategory::Catering, 1.0),
            (VendorCategory::Photography, 0.7),
            (VendorCategory::Decoration, 0.6),
            (VendorCategory::Makeup, 1.0),
            (VendorCategory::Miscellaneous, 0.8),
        ]);

        Self {
            bracket_totals,
            category_split,
            day_multipliers,
        }
    }
}

impl BudgetTables {
    fn validate(&self) -> anyhow::Result<()> {
        for bracket in BudgetBracket::ALL {
            match self.bracket_totals.get(&bracket) {
                None => {
                    return Err(invalid_input(
                        "bracket_totals",
                        bracket,
                        "a baseline total for every bracket",
                    ))
                }
                Some(total) if *total <= 0.0 => {
                    return Err(invalid_input(
                        "bracket_totals",
                        format!("{bracket}={total}"),
                        "a positive baseline total",
                    ))
                }
                Some(_) => {}
            }
        }

        let mut split_sum = 0.0;
        for category in VendorCategory::ALL {
            match self.category_split.get(&category) {
                None => {
                    return Err(invalid_input(
                        "category_split",
                        category,
                        "a share for every category",
                    ))
                }
                Some(share) if !(0.0..=1.0).contains(share) => {
                    return Err(invalid_input(
                        "category_split",
                        format!("{category}={share}"),
                        "a share in [0, 1]",
                    ))
                }
                Some(share) => split_sum += share,
            }

            match self.day_multipliers.get(&category) {
                None => {
                    return Err(invalid_input(
                        "day_multipliers",
                        category,
                        "a multiplier for every category",
                    ))
                }
                Some(mult) if *mult <= 0.0 => {
                    return Err(invalid_input(
                        "day_multipliers",
                        format!("{category}={mult}"),
                        "a positive multiplier",
                    ))
                }
                Some(_) => {}
            }
        }

        if (split_sum - 1.0).abs() > SPLIT_SUM_TOLERANCE {
            return Err(invalid_input(
                "category_split",
                split_sum,
                "shares summing to 1.0",
            ));
        }

        Ok(())
    }
}

/// Scales a single-day budget bracket into a per-category plan for a
/// multi-day celebration.
///
/// The total is the sum of the independently scaled categories, not
/// `bracket_total x duration_days`: each category carries its own per-day
/// multiplier, so the effective daily spend is below the naive projection.
#[derive(Debug, Clone)]
pub struct BudgetAllocationEngine {
    tables: BudgetTables,
}

impl BudgetAllocationEngine {
    pub fn new(tables: BudgetTables) -> anyhow::Result<Self> {
        tables.validate()?;
        Ok(Self { tables })
    }

    pub fn tables(&self) -> &BudgetTables {
        &self.tables
    }

    /// Computes the scaled total and per-category breakdown.
    ///
    /// `scaled(category) = bracket_total x split(category) x duration_days
    /// x multiplier(category)`; the multiplier applies to the full day
    /// count, including single-day celebrations.
    pub fn compute(
        &self,
        bracket: BudgetBracket,
        duration_days: u32,
    ) -> anyhow::Result<BudgetResult> {
        ensure_duration_days(duration_days)?;

        let bracket_total = *self.tables.bracket_totals.get(&bracket).ok_or_else(|| {
            invalid_input("bracket", bracket, "a bracket present in the configured tables")
        })?;

        let mut category_breakdown = BTreeMap::new();
        for category in VendorCategory::ALL {
            let share = *self.tables.category_split.get(&category).ok_or_else(|| {
                invalid_input("category_split", category, "a share for every category")
            })?;
            let multiplier = *self.tables.day_multipliers.get(&category).ok_or_else(|| {
                invalid_input("day_multipliers", category, "a multiplier for every category")
            })?;

            let amount = bracket_total * share * f64::from(duration_days) * multiplier;
            category_breakdown.insert(category, amount);
        }

        // Defined as the sum of the breakdown, so the invariant holds by
        // construction.
        let total_budget = category_breakdown.values().sum();

        Ok(BudgetResult {
            total_budget,
            category_breakdown,
        })
    }
}
