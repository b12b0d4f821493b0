use crate::domain::vendor::{Vendor, VendorCategory};
use anyhow::ensure;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::confidence::{RATING_MAX, RATING_MIN};

/// Wire shape of the vendor directory's listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryResponse {
    pub vendors: Vec<DirectoryVendorRecord>,
}

/// One vendor as the directory reports it. Loosely typed on purpose; the
/// record is validated into a `Vendor` before anything downstream sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryVendorRecord {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    pub category: String,
    pub rating: f64,
    #[serde(default)]
    pub price_min: Option<f64>,
    #[serde(default)]
    pub price_max: Option<f64>,
}

impl DirectoryVendorRecord {
    pub fn validate_and_into_vendor(self) -> anyhow::Result<Vendor> {
        let name = self.name.trim().to_string();
        ensure!(!name.is_empty(), "vendor name must be non-empty");

        let category: VendorCategory = self.category.parse()?;

        ensure!(
            (RATING_MIN..=RATING_MAX).contains(&self.rating),
            "vendor rating must be in [0, 5] (got {})",
            self.rating
        );

        if let (Some(min), Some(max)) = (self.price_min, self.price_max) {
            ensure!(
                min <= max,
                "vendor price range is inverted (min={min}, max={max})"
            );
        }

        Ok(Vendor {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            name,
            category,
            rating: self.rating,
            price_min: self.price_min,
            price_max: self.price_max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: serde_json::Value) -> DirectoryVendorRecord {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn parses_expected_shape() {
        let parsed: DirectoryResponse = serde_json::from_value(json!({
            "vendors": [
                {
                    "name": "Lotus Banquets",
                    "category": "venue",
                    "rating": 4.4,
                    "price_min": 300000.0,
                    "price_max": 800000.0
                }
            ]
        }))
        .unwrap();
        assert_eq!(parsed.vendors.len(), 1);

        let vendor = parsed.vendors[0].clone().validate_and_into_vendor().unwrap();
        assert_eq!(vendor.category, VendorCategory::Venue);
        assert_eq!(vendor.rating, 4.4);
    }

    #[test]
    fn keeps_a_directory_supplied_id() {
        let id = Uuid::new_v4();
        let vendor = record(json!({
            "id": id,
            "name": "Mehndi & More",
            "category": "makeup",
            "rating": 4.0
        }))
        .validate_and_into_vendor()
        .unwrap();
        assert_eq!(vendor.id, id);
    }

    #[test]
    fn rejects_blank_names() {
        let res = record(json!({
            "name": "   ",
            "category": "catering",
            "rating": 3.0
        }))
        .validate_and_into_vendor();
        assert!(res.is_err());
    }

    #[test]
    fn rejects_unknown_categories() {
        let res = record(json!({
            "name": "DJ Nights",
            "category": "music",
            "rating": 3.0
        }))
        .validate_and_into_vendor();
        assert!(res.is_err());
    }

    #[test]
    fn rejects_out_of_range_ratings() {
        let res = record(json!({
            "name": "Shutter Stories",
            "category": "photography",
            "rating": 5.5
        }))
        .validate_and_into_vendor();
        assert!(res.is_err());
    }

    #[test]
    fn rejects_inverted_price_ranges() {
        let res = record(json!({
            "name": "Blossom Decor",
            "category": "decoration",
            "rating": 4.1,
            "price_min": 500000.0,
            "price_max": 100000.0
        }))
        .validate_and_into_vendor();
        assert!(res.is_err());
    }
}
