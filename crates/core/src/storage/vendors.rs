use crate::domain::vendor::{Vendor, VendorCategory};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

pub async fn upsert_vendors_atomic(
    pool: &sqlx::PgPool,
    vendors: &[Vendor],
) -> anyhow::Result<u64> {
    anyhow::ensure!(!vendors.is_empty(), "vendors must be non-empty");

    let mut tx = pool.begin().await.context("begin transaction failed")?;

    // Batch the upsert to reduce round trips; keep it transactional.
    let mut affected: u64 = 0;
    let chunk_size: usize = std::env::var("VENDOR_UPSERT_BATCH")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(200);

    anyhow::ensure!(chunk_size >= 1, "VENDOR_UPSERT_BATCH must be >= 1");

    let mut batch_idx: usize = 0;
    for chunk in vendors.chunks(chunk_size) {
        batch_idx += 1;
        let t0 = std::time::Instant::now();
        let mut qb = sqlx::QueryBuilder::new(
            "INSERT INTO vendors (id, name, category, rating, price_min, price_max, updated_at) ",
        );
        let now: DateTime<Utc> = Utc::now();
        qb.push_values(chunk, |mut b, vendor| {
            b.push_bind(vendor.id)
                .push_bind(vendor.name.trim())
                .push_bind(vendor.category.as_str())
                .push_bind(vendor.rating)
                .push_bind(vendor.price_min)
                .push_bind(vendor.price_max)
                .push_bind(now);
        });
        qb.push(
            " ON CONFLICT (id) DO UPDATE \
               SET name = EXCLUDED.name, category = EXCLUDED.category, \
                   rating = EXCLUDED.rating, price_min = EXCLUDED.price_min, \
                   price_max = EXCLUDED.price_max, updated_at = EXCLUDED.updated_at",
        );

        let res = qb
            .build()
            .persistent(false)
            .execute(&mut *tx)
            .await
            .context("batch upsert vendors failed")?;
        affected += res.rows_affected();

        tracing::debug!(
            batch_idx,
            batch_size = chunk.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "vendors batch upsert"
        );
    }

    tx.commit().await.context("commit transaction failed")?;
    Ok(affected)
}

pub async fn record_ingest_run(
    pool: &sqlx::PgPool,
    directory: &str,
    status: &str,
    error: Option<&str>,
    raw_response: Option<Value>,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let ran_at: DateTime<Utc> = Utc::now();

    sqlx::query(
        "INSERT INTO vendor_ingest_runs (id, ran_at, directory, status, error, raw_response) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .persistent(false)
    .bind(id)
    .bind(ran_at)
    .bind(directory)
    .bind(status)
    .bind(error)
    .bind(raw_response)
    .execute(pool)
    .await
    .context("insert vendor_ingest_runs failed")?;

    Ok(id)
}

pub async fn fetch_vendors_by_category(
    pool: &sqlx::PgPool,
    category: VendorCategory,
) -> anyhow::Result<Vec<Vendor>> {
    let rows = sqlx::query_as::<_, (Uuid, String, String, f64, Option<f64>, Option<f64>)>(
        "SELECT id, name, category, rating, price_min, price_max \
         FROM vendors \
         WHERE category = $1 \
         ORDER BY rating DESC, name ASC",
    )
    .persistent(false)
    .bind(category.as_str())
    .fetch_all(pool)
    .await?;

    rows_into_vendors(rows)
}

pub async fn fetch_all_vendors(pool: &sqlx::PgPool) -> anyhow::Result<Vec<Vendor>> {
    let rows = sqlx::query_as::<_, (Uuid, String, String, f64, Option<f64>, Option<f64>)>(
        "SELECT id, name, category, rating, price_min, price_max \
         FROM vendors \
         ORDER BY category ASC, rating DESC, name ASC",
    )
    .persistent(false)
    .fetch_all(pool)
    .await?;

    rows_into_vendors(rows)
}

fn rows_into_vendors(
    rows: Vec<(Uuid, String, String, f64, Option<f64>, Option<f64>)>,
) -> anyhow::Result<Vec<Vendor>> {
    let mut out = Vec::with_capacity(rows.len());
    for (id, name, category, rating, price_min, price_max) in rows {
        let category: VendorCategory = category
            .parse()
            .with_context(|| format!("invalid category in DB for vendor id={id}"))?;
        out.push(Vendor {
            id,
            name,
            category,
            rating,
            price_min,
            price_max,
        });
    }
    Ok(out)
}
