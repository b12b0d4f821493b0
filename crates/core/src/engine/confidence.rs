use crate::domain::plan::{ConfidenceResult, ConfidenceTier};
use crate::domain::preferences::{DateFlexibility, SchedulePreferences};
use crate::error::invalid_input;

pub const RATING_MIN: f64 = 0.0;
pub const RATING_MAX: f64 = 5.0;

/// Tunable scoring constants. Injected at engine construction so the engine
/// reads no ambient state; `Default` carries the production values.
#[derive(Debug, Clone)]
pub struct ConfidenceParams {
    /// Maps a [0, 5] rating onto the percentage scale.
    pub rating_scale: f64,
    /// Base confidence never starts above this, regardless of rating.
    pub base_cap: f64,
    /// Reported confidence never leaves [floor, ceiling].
    pub floor: i32,
    pub ceiling: i32,
    /// Subtracted per celebration day beyond the first.
    pub per_extra_day_penalty: i32,
    pub bonus_within_3_months: i32,
    pub bonus_within_6_months: i32,
    pub bonus_within_12_months: i32,
    /// Specific-date adjustments, keyed by how soon the wedding is.
    pub near_date_cutoff_days: i64,
    pub far_date_cutoff_days: i64,
    pub near_date_adjustment: i32,
    pub mid_date_adjustment: i32,
    pub far_date_adjustment: i32,
    /// Tier thresholds; both boundaries are inclusive-high.
    pub high_tier_min: i32,
    pub medium_tier_min: i32,
}

impl Default for ConfidenceParams {
    fn default() -> Self {
        Self {
            rating_scale: 20.0,
            base_cap: 95.0,
            floor: 60,
            ceiling: 95,
            per_extra_day_penalty: 5,
            bonus_within_3_months: 10,
            bonus_within_6_months: 15,
            bonus_within_12_months: 20,
            near_date_cutoff_days: 30,
            far_date_cutoff_days: 90,
            near_date_adjustment: -20,
            mid_date_adjustment: -5,
            far_date_adjustment: 5,
            high_tier_min: 85,
            medium_tier_min: 70,
        }
    }
}

impl ConfidenceParams {
    fn validate(&self) -> anyhow::Result<()> {
        if self.rating_scale <= 0.0 {
            return Err(invalid_input(
                "params.rating_scale",
                self.rating_scale,
                "a positive scale factor",
            ));
        }
        if self.floor > self.ceiling {
            return Err(invalid_input(
                "params.floor",
                self.floor,
                "a floor no greater than the ceiling",
            ));
        }
        if self.medium_tier_min > self.high_tier_min {
            return Err(invalid_input(
                "params.medium_tier_min",
                self.medium_tier_min,
                "a medium threshold no greater than the high threshold",
            ));
        }
        if self.near_date_cutoff_days > self.far_date_cutoff_days {
            return Err(invalid_input(
                "params.near_date_cutoff_days",
                self.near_date_cutoff_days,
                "a near cutoff no greater than the far cutoff",
            ));
        }
        Ok(())
    }
}

/// Converts a vendor's quality rating and the couple's scheduling
/// flexibility into a bounded confidence percentage plus a tier label.
///
/// Pure and deterministic: identical inputs always produce identical
/// results, so callers are free to score many vendors concurrently or cache
/// results keyed by the inputs.
#[derive(Debug, Clone)]
pub struct AvailabilityConfidenceEngine {
    params: ConfidenceParams,
}

impl AvailabilityConfidenceEngine {
    pub fn new(params: ConfidenceParams) -> anyhow::Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &ConfidenceParams {
        &self.params
    }

    /// Scores one vendor rating against the couple's schedule preferences.
    ///
    /// Fails fast with `InvalidInputError` on out-of-range inputs; no
    /// partial result is produced.
    pub fn compute(
        &self,
        rating: f64,
        prefs: &SchedulePreferences,
    ) -> anyhow::Result<ConfidenceResult> {
        if !(RATING_MIN..=RATING_MAX).contains(&rating) {
            return Err(invalid_input("rating", rating, "a value in [0, 5]"));
        }
        prefs.validate()?;

        let p = &self.params;
        let base = (rating * p.rating_scale).min(p.base_cap);

        // A committed date replaces the flexibility bonus entirely.
        let adjustment = match prefs.flexibility {
            DateFlexibility::SpecificDate => {
                let days = prefs.days_until_wedding.ok_or_else(|| {
                    invalid_input(
                        "days_until_wedding",
                        "none",
                        "a non-negative day count when flexibility is specific_date",
                    )
                })?;
                if days < p.near_date_cutoff_days {
                    p.near_date_adjustment
                } else if days < p.far_date_cutoff_days {
                    p.mid_date_adjustment
                } else {
                    p.far_date_adjustment
                }
            }
            DateFlexibility::Within3Months => p.bonus_within_3_months,
            DateFlexibility::Within6Months => p.bonus_within_6_months,
            DateFlexibility::Within12Months => p.bonus_within_12_months,
        };

        let penalty = (prefs.duration_days as i32 - 1) * p.per_extra_day_penalty;

        let raw = base + f64::from(adjustment) - f64::from(penalty);
        let percentage = raw.clamp(f64::from(p.floor), f64::from(p.ceiling)).round() as i32;

        Ok(ConfidenceResult {
            percentage,
            tier: self.tier_for(percentage),
        })
    }

    fn tier_for(&self, percentage: i32) -> ConfidenceTier {
        if percentage >= self.params.high_tier_min {
            ConfidenceTier::High
        } else if percentage >= self.params.medium_tier_min {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InvalidInputError;

    fn engine() -> AvailabilityConfidenceEngine {
        AvailabilityConfidenceEngine::new(ConfidenceParams::default()).unwrap()
    }

    fn prefs(
        flexibility: DateFlexibility,
        duration_days: u32,
        days_until_wedding: Option<i64>,
    ) -> SchedulePreferences {
        SchedulePreferences {
            flexibility,
            duration_days,
            days_until_wedding,
        }
    }

    #[test]
    fn caps_high_ratings_at_ceiling() {
        // 4.5 * 20 + 15 = 105, clamped to 95.
        let res = engine()
            .compute(4.5, &prefs(DateFlexibility::Within6Months, 1, None))
            .unwrap();
        assert_eq!(res.percentage, 95);
        assert_eq!(res.tier, ConfidenceTier::High);
    }

    #[test]
    fn multi_day_penalty_lands_after_bonus() {
        // 90 + 15 - 10 = 95.
        let res = engine()
            .compute(4.5, &prefs(DateFlexibility::Within6Months, 3, None))
            .unwrap();
        assert_eq!(res.percentage, 95);
        assert_eq!(res.tier, ConfidenceTier::High);

        // 90 + 15 - 30 = 75.
        let res = engine()
            .compute(4.5, &prefs(DateFlexibility::Within6Months, 7, None))
            .unwrap();
        assert_eq!(res.percentage, 75);
        assert_eq!(res.tier, ConfidenceTier::Medium);
    }

    #[test]
    fn imminent_specific_date_hits_the_floor() {
        // 80 - 20 = 60, already at the floor.
        let res = engine()
            .compute(4.0, &prefs(DateFlexibility::SpecificDate, 1, Some(20)))
            .unwrap();
        assert_eq!(res.percentage, 60);
        assert_eq!(res.tier, ConfidenceTier::Low);
    }

    #[test]
    fn specific_date_adjustment_depends_on_lead_time() {
        let e = engine();
        // 4.0 * 20 = 80 base throughout.
        let near = e
            .compute(4.0, &prefs(DateFlexibility::SpecificDate, 1, Some(10)))
            .unwrap();
        let mid = e
            .compute(4.0, &prefs(DateFlexibility::SpecificDate, 1, Some(45)))
            .unwrap();
        let far = e
            .compute(4.0, &prefs(DateFlexibility::SpecificDate, 1, Some(120)))
            .unwrap();
        assert_eq!(near.percentage, 60);
        assert_eq!(mid.percentage, 75);
        assert_eq!(far.percentage, 85);

        // Cutoffs themselves fall in the looser band.
        let at_30 = e
            .compute(4.0, &prefs(DateFlexibility::SpecificDate, 1, Some(30)))
            .unwrap();
        let at_90 = e
            .compute(4.0, &prefs(DateFlexibility::SpecificDate, 1, Some(90)))
            .unwrap();
        assert_eq!(at_30.percentage, 75);
        assert_eq!(at_90.percentage, 85);
    }

    #[test]
    fn tier_boundaries_are_inclusive_high() {
        let e = engine();
        // 3.5 * 20 + 15 = 85.
        let at_85 = e
            .compute(3.5, &prefs(DateFlexibility::Within6Months, 1, None))
            .unwrap();
        assert_eq!(at_85.percentage, 85);
        assert_eq!(at_85.tier, ConfidenceTier::High);

        // 3.2 * 20 + 20 = 84.
        let at_84 = e
            .compute(3.2, &prefs(DateFlexibility::Within12Months, 1, None))
            .unwrap();
        assert_eq!(at_84.percentage, 84);
        assert_eq!(at_84.tier, ConfidenceTier::Medium);

        // 3.0 * 20 + 10 = 70.
        let at_70 = e
            .compute(3.0, &prefs(DateFlexibility::Within3Months, 1, None))
            .unwrap();
        assert_eq!(at_70.percentage, 70);
        assert_eq!(at_70.tier, ConfidenceTier::Medium);

        // 2.7 * 20 + 15 = 69.
        let at_69 = e
            .compute(2.7, &prefs(DateFlexibility::Within6Months, 1, None))
            .unwrap();
        assert_eq!(at_69.percentage, 69);
        assert_eq!(at_69.tier, ConfidenceTier::Low);
    }

    #[test]
    fn percentage_stays_bounded_across_the_input_grid() {
        let e = engine();
        let flexibilities = [
            (DateFlexibility::SpecificDate, Some(0)),
            (DateFlexibility::SpecificDate, Some(45)),
            (DateFlexibility::SpecificDate, Some(365)),
            (DateFlexibility::Within3Months, None),
            (DateFlexibility::Within6Months, None),
            (DateFlexibility::Within12Months, None),
        ];

        for tenth in 0..=50 {
            let rating = f64::from(tenth) / 10.0;
            for (flexibility, days) in flexibilities {
                for duration in 1..=14 {
                    let res = e
                        .compute(rating, &prefs(flexibility, duration, days))
                        .unwrap();
                    assert!(
                        (60..=95).contains(&res.percentage),
                        "out of bounds: rating={rating} flexibility={flexibility:?} duration={duration} -> {}",
                        res.percentage
                    );
                }
            }
        }
    }

    #[test]
    fn identical_inputs_give_identical_results() {
        let e = engine();
        let p = prefs(DateFlexibility::SpecificDate, 4, Some(200));
        let a = e.compute(3.8, &p).unwrap();
        let b = e.compute(3.8, &p).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn out_of_range_rating_is_rejected() {
        for rating in [-0.1, 5.1, 6.0, f64::NAN] {
            let err = engine()
                .compute(rating, &prefs(DateFlexibility::Within6Months, 1, None))
                .unwrap_err();
            let input = err.downcast_ref::<InvalidInputError>().unwrap();
            assert_eq!(input.field, "rating");
        }
    }

    #[test]
    fn out_of_range_duration_is_rejected() {
        let err = engine()
            .compute(4.0, &prefs(DateFlexibility::Within6Months, 15, None))
            .unwrap_err();
        let input = err.downcast_ref::<InvalidInputError>().unwrap();
        assert_eq!(input.field, "duration_days");
    }

    #[test]
    fn missing_day_count_for_specific_date_is_rejected() {
        let err = engine()
            .compute(4.0, &prefs(DateFlexibility::SpecificDate, 1, None))
            .unwrap_err();
        let input = err.downcast_ref::<InvalidInputError>().unwrap();
        assert_eq!(input.field, "days_until_wedding");
    }

    #[test]
    fn inverted_thresholds_fail_construction() {
        let params = ConfidenceParams {
            floor: 96,
            ..ConfidenceParams::default()
        };
        assert!(AvailabilityConfidenceEngine::new(params).is_err());

        let params = ConfidenceParams {
            medium_tier_min: 90,
            ..ConfidenceParams::default()
        };
        assert!(AvailabilityConfidenceEngine::new(params).is_err());
    }
}
