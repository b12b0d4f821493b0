use std::cmp::Ordering;
use std::collections::BTreeMap;
use wedplan_core::domain::plan::MatchItem;
use wedplan_core::domain::preferences::SchedulePreferences;
use wedplan_core::domain::vendor::{Vendor, VendorCategory};
use wedplan_core::engine::confidence::AvailabilityConfidenceEngine;

#[derive(Debug, Clone)]
pub struct MatchOptions {
    /// Ranked vendors to keep per category (must be 1..=50).
    pub per_category: usize,

    /// Drop vendors below this rating before scoring.
    pub min_rating: Option<f64>,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            per_category: 5,
            min_rating: None,
        }
    }
}

impl MatchOptions {
    pub fn from_env() -> Self {
        let mut out = Self::default();

        if let Ok(s) = std::env::var("MATCH_PER_CATEGORY") {
            if let Ok(n) = s.parse::<usize>() {
                out.per_category = n;
            }
        }

        if let Ok(s) = std::env::var("MATCH_MIN_RATING") {
            if let Ok(n) = s.parse::<f64>() {
                out.min_rating = Some(n);
            }
        }

        out
    }
}

/// Scores every vendor against the couple's preferences and keeps the top
/// entries per category, ranked by confidence. Ties break on rating, then
/// name, so repeated runs over the same inputs produce the same order.
pub fn rank_vendors(
    engine: &AvailabilityConfidenceEngine,
    vendors: Vec<Vendor>,
    prefs: &SchedulePreferences,
    opts: &MatchOptions,
) -> anyhow::Result<Vec<MatchItem>> {
    anyhow::ensure!(
        (1..=50).contains(&opts.per_category),
        "per-category match size must be 1..=50 (got {})",
        opts.per_category
    );

    let mut by_category: BTreeMap<VendorCategory, Vec<MatchItem>> = BTreeMap::new();
    for vendor in vendors {
        if let Some(min_rating) = opts.min_rating {
            if vendor.rating < min_rating {
                continue;
            }
        }

        let confidence = engine.compute(vendor.rating, prefs)?;
        by_category.entry(vendor.category).or_default().push(MatchItem {
            rank: 0,
            vendor_id: vendor.id,
            name: vendor.name,
            category: vendor.category,
            rating: vendor.rating,
            confidence,
        });
    }

    let mut out = Vec::new();
    for (_, mut items) in by_category {
        items.sort_by(|a, b| {
            b.confidence
                .percentage
                .cmp(&a.confidence.percentage)
                .then_with(|| b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal))
                .then_with(|| a.name.cmp(&b.name))
        });

        for (idx, mut item) in items.into_iter().take(opts.per_category).enumerate() {
            item.rank = idx as i32 + 1;
            out.push(item);
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use wedplan_core::domain::preferences::DateFlexibility;
    use wedplan_core::engine::confidence::ConfidenceParams;

    fn engine() -> AvailabilityConfidenceEngine {
        AvailabilityConfidenceEngine::new(ConfidenceParams::default()).unwrap()
    }

    fn prefs() -> SchedulePreferences {
        SchedulePreferences {
            flexibility: DateFlexibility::Within6Months,
            duration_days: 3,
            days_until_wedding: None,
        }
    }

    fn vendor(name: &str, category: VendorCategory, rating: f64) -> Vendor {
        Vendor {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category,
            rating,
            price_min: None,
            price_max: None,
        }
    }

    #[test]
    fn ranks_by_confidence_within_each_category() {
        let vendors = vec![
            vendor("Mid Venue", VendorCategory::Venue, 3.0),
            vendor("Top Venue", VendorCategory::Venue, 4.8),
            vendor("Low Venue", VendorCategory::Venue, 1.5),
        ];

        let items = rank_vendors(&engine(), vendors, &prefs(), &MatchOptions::default()).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].name, "Top Venue");
        assert_eq!(items[0].rank, 1);
        assert_eq!(items[1].name, "Mid Venue");
        assert_eq!(items[2].name, "Low Venue");
        assert_eq!(items[2].rank, 3);
    }

    #[test]
    fn equal_confidence_breaks_ties_on_rating_then_name() {
        // Both land on the 95 ceiling; the rating still separates them, and
        // the name decides between true equals.
        let vendors = vec![
            vendor("Zinnia Hall", VendorCategory::Venue, 4.6),
            vendor("Aster Hall", VendorCategory::Venue, 4.6),
            vendor("Marigold Hall", VendorCategory::Venue, 4.9),
        ];

        let items = rank_vendors(&engine(), vendors, &prefs(), &MatchOptions::default()).unwrap();
        assert_eq!(items[0].name, "Marigold Hall");
        assert_eq!(items[1].name, "Aster Hall");
        assert_eq!(items[2].name, "Zinnia Hall");
    }

    #[test]
    fn caps_each_category_independently() {
        let mut vendors = Vec::new();
        for i in 0..8 {
            vendors.push(vendor(
                &format!("Venue {i}"),
                VendorCategory::Venue,
                3.0 + f64::from(i) / 10.0,
            ));
            vendors.push(vendor(
                &format!("Caterer {i}"),
                VendorCategory::Catering,
                3.0 + f64::from(i) / 10.0,
            ));
        }

        let opts = MatchOptions {
            per_category: 3,
            min_rating: None,
        };
        let items = rank_vendors(&engine(), vendors, &prefs(), &opts).unwrap();
        assert_eq!(items.len(), 6);
        for category in [VendorCategory::Venue, VendorCategory::Catering] {
            let ranks: Vec<i32> = items
                .iter()
                .filter(|i| i.category == category)
                .map(|i| i.rank)
                .collect();
            assert_eq!(ranks, vec![1, 2, 3]);
        }
    }

    #[test]
    fn min_rating_filters_before_scoring() {
        let vendors = vec![
            vendor("Good Caterer", VendorCategory::Catering, 4.5),
            vendor("Weak Caterer", VendorCategory::Catering, 2.0),
        ];

        let opts = MatchOptions {
            per_category: 5,
            min_rating: Some(3.0),
        };
        let items = rank_vendors(&engine(), vendors, &prefs(), &opts).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Good Caterer");
    }

    #[test]
    fn rejects_out_of_range_per_category() {
        let opts = MatchOptions {
            per_category: 0,
            min_rating: None,
        };
        assert!(rank_vendors(&engine(), Vec::new(), &prefs(), &opts).is_err());
    }
}
