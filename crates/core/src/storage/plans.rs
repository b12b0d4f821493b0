use crate::domain::plan::{MatchItem, MatchSnapshot};
use anyhow::Context;

pub async fn persist_success(
    pool: &sqlx::PgPool,
    snapshot: &MatchSnapshot,
) -> anyhow::Result<uuid::Uuid> {
    anyhow::ensure!(
        !snapshot.items.is_empty(),
        "snapshot must have at least one ranked vendor"
    );

    let preferences = serde_json::to_value(&snapshot.preferences)
        .context("serialize preferences failed")?;
    let budget =
        serde_json::to_value(&snapshot.budget).context("serialize budget failed")?;

    let mut tx = pool.begin().await.context("begin transaction failed")?;

    let snapshot_id: uuid::Uuid = sqlx::query_scalar(
        "INSERT INTO match_snapshots (as_of_date, generated_at, status, error, preferences, budget) \
         VALUES ($1, $2, 'success', NULL, $3, $4) \
         RETURNING id",
    )
    .bind(snapshot.as_of_date)
    .bind(snapshot.generated_at)
    .bind(preferences)
    .bind(budget)
    .fetch_one(&mut *tx)
    .await
    .context("insert match_snapshots failed")?;

    for item in &snapshot.items {
        insert_item(&mut tx, snapshot_id, item).await?;
    }

    tx.commit().await.context("commit transaction failed")?;
    Ok(snapshot_id)
}

pub async fn persist_failure(
    pool: &sqlx::PgPool,
    as_of_date: chrono::NaiveDate,
    generated_at: chrono::DateTime<chrono::Utc>,
    error: &str,
    preferences: Option<serde_json::Value>,
) -> anyhow::Result<uuid::Uuid> {
    let snapshot_id: uuid::Uuid = sqlx::query_scalar(
        "INSERT INTO match_snapshots (as_of_date, generated_at, status, error, preferences, budget) \
         VALUES ($1, $2, 'error', $3, $4, NULL) \
         RETURNING id",
    )
    .bind(as_of_date)
    .bind(generated_at)
    .bind(error)
    .bind(preferences)
    .fetch_one(pool)
    .await
    .context("insert error match_snapshots failed")?;

    Ok(snapshot_id)
}

async fn insert_item(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    snapshot_id: uuid::Uuid,
    item: &MatchItem,
) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO match_items (snapshot_id, rank, vendor_id, name, category, rating, confidence_pct, confidence_tier) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(snapshot_id)
    .bind(item.rank)
    .bind(item.vendor_id)
    .bind(&item.name)
    .bind(item.category.as_str())
    .bind(item.rating)
    .bind(item.confidence.percentage)
    .bind(item.confidence.tier.as_str())
    .execute(&mut **tx)
    .await
    .context("insert match_items failed")?;

    Ok(())
}
