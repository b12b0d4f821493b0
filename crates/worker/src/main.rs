use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wedplan_core::domain::budget::BudgetBracket;
use wedplan_core::domain::plan::MatchSnapshot;
use wedplan_core::domain::preferences::{DateFlexibility, SchedulePreferences};
use wedplan_core::domain::vendor::Vendor;
use wedplan_core::engine::budget::{BudgetAllocationEngine, BudgetTables};
use wedplan_core::engine::confidence::{AvailabilityConfidenceEngine, ConfidenceParams};
use wedplan_core::ingest::provider::{HttpJsonVendorDirectory, VendorDirectoryClient};
use wedplan_core::time::schedule;

mod ingest;
mod ranking;

#[derive(Debug, Parser)]
#[command(name = "wedplan_worker")]
struct Args {
    /// Run date (YYYY-MM-DD). Defaults to today's IST date.
    #[arg(long)]
    as_of_date: Option<String>,

    /// Committed wedding date (YYYY-MM-DD); implies specific_date
    /// flexibility with the day countdown derived from the run date.
    #[arg(long)]
    wedding_date: Option<String>,

    /// Date flexibility when no wedding date is committed:
    /// within_3_months, within_6_months, or within_12_months.
    #[arg(long)]
    flexibility: Option<String>,

    /// Celebration length in days (1..=14).
    #[arg(long, default_value_t = 1)]
    duration_days: u32,

    /// Budget bracket: budget, premium, luxury, or ultra_luxury.
    #[arg(long, default_value = "premium")]
    bracket: String,

    /// Seed deterministic demo vendors instead of calling the directory.
    #[arg(long)]
    seed_demo_vendors: bool,

    /// Do everything except writing to the database.
    #[arg(long)]
    dry_run: bool,
}

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

    let args = Args::parse();

    let run_date = schedule::resolve_run_date(args.as_of_date.as_deref(), chrono::Utc::now())?;
    let prefs = build_preferences(&args, run_date)?;
    let bracket: BudgetBracket = args.bracket.parse()?;

    let confidence = AvailabilityConfidenceEngine::new(ConfidenceParams::default())?;
    let budget_engine = BudgetAllocationEngine::new(BudgetTables::default())?;

    // Fail fast on bad preferences or bracket before touching the database.
    let budget = budget_engine.compute(bracket, prefs.duration_days)?;

    if args.dry_run {
        tracing::info!(
            %run_date,
            dry_run = true,
            bracket = %bracket,
            flexibility = prefs.flexibility.as_str(),
            duration_days = prefs.duration_days,
            total_budget = budget.total_budget,
            "match run (dry-run): budget plan computed, skipping vendor scoring and writes"
        );
        return Ok(());
    }

    let db_url = settings.require_database_url()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    wedplan_core::storage::migrate(&pool).await?;

    let acquired = wedplan_core::storage::lock::try_acquire_run_date_lock(&pool, run_date).await?;
    if !acquired {
        tracing::warn!(%run_date, "run date lock not acquired; another run in progress");
        return Ok(());
    }

    let opts = ranking::MatchOptions::from_env();
    let run_result = run_match(&pool, &settings, &args, &prefs, &confidence, &opts).await;

    match run_result {
        Ok(items) => {
            let snapshot = MatchSnapshot {
                as_of_date: run_date,
                generated_at: chrono::Utc::now(),
                preferences: prefs.clone(),
                budget,
                items,
            };
            let snapshot_id =
                wedplan_core::storage::plans::persist_success(&pool, &snapshot).await?;

            tracing::info!(
                %run_date,
                %snapshot_id,
                items_len = snapshot.items.len(),
                "persisted match snapshot"
            );
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            let generated_at = chrono::Utc::now();
            let preferences = serde_json::to_value(&prefs).ok();

            let snapshot_id = wedplan_core::storage::plans::persist_failure(
                &pool,
                run_date,
                generated_at,
                &format!("{:#}", err),
                preferences,
            )
            .await?;

            tracing::error!(%run_date, %snapshot_id, error = %err, "match run failed");
        }
    }

    let _ = wedplan_core::storage::lock::release_run_date_lock(&pool, run_date).await;
    Ok(())
}

/// Refresh the vendor pool, then rank it against the preferences.
async fn run_match(
    pool: &sqlx::PgPool,
    settings: &wedplan_core::config::Settings,
    args: &Args,
    prefs: &SchedulePreferences,
    confidence: &AvailabilityConfidenceEngine,
    opts: &ranking::MatchOptions,
) -> anyhow::Result<Vec<wedplan_core::domain::plan::MatchItem>> {
    if args.seed_demo_vendors {
        let seeded = ingest::seed_demo_vendors(pool, 20).await?;
        tracing::info!(seeded, "seeded demo vendors");
    } else if settings.vendor_directory_base_url.is_some() {
        refresh_vendors_from_directory(pool, settings).await?;
    }

    let vendors: Vec<Vendor> = wedplan_core::storage::vendors::fetch_all_vendors(pool).await?;
    anyhow::ensure!(
        !vendors.is_empty(),
        "no vendors available; seed demo vendors or configure the directory"
    );

    ranking::rank_vendors(confidence, vendors, prefs, opts)
}

async fn refresh_vendors_from_directory(
    pool: &sqlx::PgPool,
    settings: &wedplan_core::config::Settings,
) -> anyhow::Result<()> {
    let directory = HttpJsonVendorDirectory::from_settings(settings)?;

    match directory.fetch_vendors(None).await {
        Ok((vendors, raw)) => {
            let affected =
                wedplan_core::storage::vendors::upsert_vendors_atomic(pool, &vendors).await?;
            wedplan_core::storage::vendors::record_ingest_run(
                pool,
                directory.directory_name(),
                "success",
                None,
                Some(raw),
            )
            .await?;
            tracing::info!(affected, "refreshed vendors from directory");
            Ok(())
        }
        Err(err) => {
            wedplan_core::storage::vendors::record_ingest_run(
                pool,
                directory.directory_name(),
                "error",
                Some(&format!("{:#}", err)),
                None,
            )
            .await?;
            Err(err.context("vendor directory refresh failed"))
        }
    }
}

fn build_preferences(args: &Args, run_date: NaiveDate) -> anyhow::Result<SchedulePreferences> {
    let prefs = match (&args.wedding_date, &args.flexibility) {
        (Some(_), Some(_)) => {
            anyhow::bail!("pass either --wedding-date or --flexibility, not both")
        }
        (Some(wedding_date), None) => {
            let wedding_date = NaiveDate::parse_from_str(wedding_date, "%Y-%m-%d")
                .context("wedding date must be YYYY-MM-DD")?;
            SchedulePreferences {
                flexibility: DateFlexibility::SpecificDate,
                duration_days: args.duration_days,
                days_until_wedding: Some(schedule::days_until_wedding(wedding_date, run_date)),
            }
        }
        (None, Some(flexibility)) => SchedulePreferences {
            flexibility: flexibility.parse()?,
            duration_days: args.duration_days,
            days_until_wedding: None,
        },
        (None, None) => SchedulePreferences {
            flexibility: DateFlexibility::Within6Months,
            duration_days: args.duration_days,
            days_until_wedding: None,
        },
    };

    prefs.validate()?;
    Ok(prefs)
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

#[cfg(test)]
mod tests {
    use super::*;

    fn args(wedding_date: Option<&str>, flexibility: Option<&str>) -> Args {
        Args {
            as_of_date: None,
            wedding_date: wedding_date.map(str::to_string),
            flexibility: flexibility.map(str::to_string),
            duration_days: 2,
            bracket: "premium".to_string(),
            seed_demo_vendors: false,
            dry_run: true,
        }
    }

    #[test]
    fn wedding_date_becomes_a_specific_date_countdown() {
        let run_date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let prefs = build_preferences(&args(Some("2026-05-01"), None), run_date).unwrap();
        assert_eq!(prefs.flexibility, DateFlexibility::SpecificDate);
        assert_eq!(prefs.days_until_wedding, Some(61));
    }

    #[test]
    fn past_wedding_dates_are_rejected() {
        let run_date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert!(build_preferences(&args(Some("2026-01-01"), None), run_date).is_err());
    }

    #[test]
    fn flexibility_and_wedding_date_are_mutually_exclusive() {
        let run_date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let res = build_preferences(&args(Some("2026-05-01"), Some("within_3_months")), run_date);
        assert!(res.is_err());
    }

    #[test]
    fn defaults_to_a_six_month_window() {
        let run_date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let prefs = build_preferences(&args(None, None), run_date).unwrap();
        assert_eq!(prefs.flexibility, DateFlexibility::Within6Months);
        assert_eq!(prefs.days_until_wedding, None);
    }
}
