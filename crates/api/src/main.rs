use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::cmp::Ordering;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use wedplan_core::domain::budget::{BudgetBracket, BudgetResult};
use wedplan_core::domain::plan::{ConfidenceResult, MatchItem, MatchSnapshot};
use wedplan_core::domain::preferences::{DateFlexibility, SchedulePreferences};
use wedplan_core::domain::vendor::{Vendor, VendorCategory};
use wedplan_core::engine::budget::{BudgetAllocationEngine, BudgetTables};
use wedplan_core::engine::confidence::{AvailabilityConfidenceEngine, ConfidenceParams};
use wedplan_core::error::InvalidInputError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = wedplan_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let pool: Option<PgPool> = match settings.require_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => match wedplan_core::storage::migrate(&pool).await {
                Ok(()) => Some(pool),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; starting API in degraded mode");
                None
            }
        },
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "DATABASE_URL missing; starting API in degraded mode");
            None
        }
    };

    // Engines are pure; the budget endpoints keep working even when the
    // database is down.
    let state = AppState {
        pool,
        confidence: AvailabilityConfidenceEngine::new(ConfidenceParams::default())?,
        budget: BudgetAllocationEngine::new(BudgetTables::default())?,
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/budget-analysis", post(budget_analysis))
        .route("/vendor-data/:category", get(get_vendor_data))
        .route("/plans/latest", get(get_latest_plan))
        .route("/plans/:as_of_date", get(get_plan_by_date))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    pool: Option<PgPool>,
    confidence: AvailabilityConfidenceEngine,
    budget: BudgetAllocationEngine,
}

type ApiError = (StatusCode, String);

/// Bad input maps to 400 with the offending field named; everything else is
/// a 500 and goes to sentry.
fn map_engine_error(err: anyhow::Error) -> ApiError {
    if let Some(input) = err.downcast_ref::<InvalidInputError>() {
        (StatusCode::BAD_REQUEST, input.to_string())
    } else {
        sentry_anyhow::capture_anyhow(&err);
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
    }
}

fn internal_error(err: anyhow::Error) -> ApiError {
    sentry_anyhow::capture_anyhow(&err);
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
}

#[derive(Debug, Deserialize)]
struct BudgetAnalysisRequest {
    bracket: BudgetBracket,
    duration_days: u32,
}

async fn budget_analysis(
    State(state): State<AppState>,
    Json(req): Json<BudgetAnalysisRequest>,
) -> Result<Json<BudgetResult>, ApiError> {
    let result = state
        .budget
        .compute(req.bracket, req.duration_days)
        .map_err(map_engine_error)?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
struct VendorDataQuery {
    flexibility: DateFlexibility,
    duration_days: u32,
    days_until_wedding: Option<i64>,
    min_rating: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ScoredVendor {
    vendor: Vendor,
    confidence: ConfidenceResult,
}

async fn get_vendor_data(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(query): Query<VendorDataQuery>,
) -> Result<Json<Vec<ScoredVendor>>, ApiError> {
    let Some(pool) = &state.pool else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "vendor store unavailable".to_string(),
        ));
    };

    let category: VendorCategory = category.parse().map_err(map_engine_error)?;

    let prefs = SchedulePreferences {
        flexibility: query.flexibility,
        duration_days: query.duration_days,
        days_until_wedding: query.days_until_wedding,
    };
    prefs.validate().map_err(map_engine_error)?;

    let vendors = wedplan_core::storage::vendors::fetch_vendors_by_category(pool, category)
        .await
        .map_err(internal_error)?;

    let mut scored = Vec::with_capacity(vendors.len());
    for vendor in vendors {
        if let Some(min_rating) = query.min_rating {
            if vendor.rating < min_rating {
                continue;
            }
        }
        let confidence = state
            .confidence
            .compute(vendor.rating, &prefs)
            .map_err(map_engine_error)?;
        scored.push(ScoredVendor { vendor, confidence });
    }

    scored.sort_by(|a, b| {
        b.confidence
            .percentage
            .cmp(&a.confidence.percentage)
            .then_with(|| {
                b.vendor
                    .rating
                    .partial_cmp(&a.vendor.rating)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.vendor.name.cmp(&b.vendor.name))
    });

    Ok(Json(scored))
}

#[derive(Debug, Serialize)]
struct ApiPlan {
    snapshot_id: Uuid,
    snapshot: MatchSnapshot,
}

async fn get_latest_plan(State(state): State<AppState>) -> Result<Json<ApiPlan>, ApiError> {
    let Some(pool) = &state.pool else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "plan store unavailable".to_string(),
        ));
    };

    let (snapshot_id, snapshot) = fetch_plan(pool, None)
        .await
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "no match snapshot found".to_string()))?;

    Ok(Json(ApiPlan {
        snapshot_id,
        snapshot,
    }))
}

async fn get_plan_by_date(
    State(state): State<AppState>,
    Path(as_of_date): Path<String>,
) -> Result<Json<ApiPlan>, ApiError> {
    let Some(pool) = &state.pool else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "plan store unavailable".to_string(),
        ));
    };

    let as_of_date = NaiveDate::parse_from_str(&as_of_date, "%Y-%m-%d").map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            "as_of_date must be YYYY-MM-DD".to_string(),
        )
    })?;

    let (snapshot_id, snapshot) = fetch_plan(pool, Some(as_of_date))
        .await
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "no match snapshot found".to_string()))?;

    Ok(Json(ApiPlan {
        snapshot_id,
        snapshot,
    }))
}

async fn fetch_plan(
    pool: &PgPool,
    as_of_date: Option<NaiveDate>,
) -> anyhow::Result<Option<(Uuid, MatchSnapshot)>> {
    let row = match as_of_date {
        Some(d) => {
            sqlx::query_as::<
                _,
                (
                    Uuid,
                    NaiveDate,
                    DateTime<Utc>,
                    serde_json::Value,
                    serde_json::Value,
                ),
            >(
                "SELECT id, as_of_date, generated_at, preferences, budget \
                 FROM match_snapshots \
                 WHERE status = 'success' AND as_of_date = $1 \
                 ORDER BY generated_at DESC \
                 LIMIT 1",
            )
            .bind(d)
            .fetch_optional(pool)
            .await?
        }
        None => {
            sqlx::query_as::<
                _,
                (
                    Uuid,
                    NaiveDate,
                    DateTime<Utc>,
                    serde_json::Value,
                    serde_json::Value,
                ),
            >(
                "SELECT id, as_of_date, generated_at, preferences, budget \
                 FROM match_snapshots \
                 WHERE status = 'success' \
                 ORDER BY as_of_date DESC, generated_at DESC \
                 LIMIT 1",
            )
            .fetch_optional(pool)
            .await?
        }
    };

    let Some((id, as_of_date, generated_at, preferences, budget)) = row else {
        return Ok(None);
    };

    let preferences: SchedulePreferences = serde_json::from_value(preferences)?;
    let budget: BudgetResult = serde_json::from_value(budget)?;
    let items = fetch_items(pool, id).await?;

    Ok(Some((
        id,
        MatchSnapshot {
            as_of_date,
            generated_at,
            preferences,
            budget,
            items,
        },
    )))
}

async fn fetch_items(pool: &PgPool, snapshot_id: Uuid) -> anyhow::Result<Vec<MatchItem>> {
    let rows = sqlx::query_as::<_, (i32, Uuid, String, String, f64, i32, String)>(
        "SELECT rank, vendor_id, name, category, rating, confidence_pct, confidence_tier \
         FROM match_items \
         WHERE snapshot_id = $1 \
         ORDER BY category ASC, rank ASC",
    )
    .bind(snapshot_id)
    .fetch_all(pool)
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for (rank, vendor_id, name, category, rating, confidence_pct, confidence_tier) in rows {
        out.push(MatchItem {
            rank,
            vendor_id,
            name,
            category: category.parse()?,
            rating,
            confidence: ConfidenceResult {
                percentage: confidence_pct,
                tier: confidence_tier.parse()?,
            },
        });
    }
    Ok(out)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &wedplan_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
