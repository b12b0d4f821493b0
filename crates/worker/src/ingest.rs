use uuid::Uuid;
use wedplan_core::domain::vendor::{Vendor, VendorCategory};
use wedplan_core::storage::vendors::upsert_vendors_atomic;

/// Seeds deterministic vendors for local runs without a directory to pull
/// from. Ids are derived from (category, index), so re-seeding upserts the
/// same rows instead of piling up duplicates.
pub async fn seed_demo_vendors(
    pool: &sqlx::PgPool,
    per_category: usize,
) -> anyhow::Result<u64> {
    anyhow::ensure!(
        (1..=500).contains(&per_category),
        "seed size must be 1..=500 (got {per_category})"
    );

    let mut vendors = Vec::with_capacity(per_category * VendorCategory::ALL.len());
    for (cat_idx, category) in VendorCategory::ALL.into_iter().enumerate() {
        for i in 1..=per_category {
            // Ratings sweep [3.0, 4.9] so every confidence tier shows up.
            let rating = 3.0 + ((i + cat_idx) % 20) as f64 / 10.0;
            let price_base = 50_000.0 * (cat_idx + 1) as f64;

            vendors.push(Vendor {
                id: demo_vendor_id(cat_idx, i),
                name: format!("Demo {} {i:03}", category.as_str()),
                category,
                rating,
                price_min: Some(price_base),
                price_max: Some(price_base * 4.0),
            });
        }
    }

    upsert_vendors_atomic(pool, &vendors).await
}

fn demo_vendor_id(cat_idx: usize, i: usize) -> Uuid {
    // Stable, clearly-synthetic ids; the high bits spell out the seed
    // namespace so demo rows are easy to spot in the database.
    Uuid::from_u128(0x5745_4450_4C41_4E00_0000_0000_0000_0000 | ((cat_idx as u128) << 32) | i as u128)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_ids_are_stable_and_distinct() {
        assert_eq!(demo_vendor_id(0, 1), demo_vendor_id(0, 1));
        assert_ne!(demo_vendor_id(0, 1), demo_vendor_id(0, 2));
        assert_ne!(demo_vendor_id(0, 1), demo_vendor_id(1, 1));
    }
}
