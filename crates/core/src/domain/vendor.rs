use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Service categories a wedding vendor can belong to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum VendorCategory {
    Venue,
    Decoration,
    Catering,
    Makeup,
    Photography,
    Miscellaneous,
}

impl VendorCategory {
    pub const ALL: [VendorCategory; 6] = [
        VendorCategory::Venue,
        VendorCategory::Decoration,
        VendorCategory::Catering,
        VendorCategory::Makeup,
        VendorCategory::Photography,
        VendorCategory::Miscellaneous,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VendorCategory::Venue => "venue",
            VendorCategory::Decoration => "decoration",
            VendorCategory::Catering => "catering",
            VendorCategory::Makeup => "makeup",
            VendorCategory::Photography => "photography",
            VendorCategory::Miscellaneous => "miscellaneous",
        }
    }
}

impl fmt::Display for VendorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VendorCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "venue" => Ok(VendorCategory::Venue),
            "decoration" => Ok(VendorCategory::Decoration),
            "catering" => Ok(VendorCategory::Catering),
            "makeup" => Ok(VendorCategory::Makeup),
            "photography" => Ok(VendorCategory::Photography),
            "miscellaneous" => Ok(VendorCategory::Miscellaneous),
            other => Err(crate::error::invalid_input(
                "category",
                other,
                "one of venue, decoration, catering, makeup, photography, miscellaneous",
            )),
        }
    }
}

/// A vendor record as stored locally. Reference data supplied by the vendor
/// directory; the engines read it and never write it back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    pub id: Uuid,
    pub name: String,
    pub category: VendorCategory,
    pub rating: f64,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
}
