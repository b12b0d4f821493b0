use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};

// Wedding planning happens on the couple's local calendar, not UTC.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 1800;

/// Resolves the date a match run is scored against: an explicit
/// `YYYY-MM-DD` argument, or today's IST date.
pub fn resolve_run_date(
    run_date_arg: Option<&str>,
    now_utc: DateTime<Utc>,
) -> anyhow::Result<NaiveDate> {
    if let Some(s) = run_date_arg {
        return Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")?);
    }

    let ist = chrono::FixedOffset::east_opt(IST_OFFSET_SECS).context("invalid IST offset")?;
    Ok(now_utc.with_timezone(&ist).date_naive())
}

/// Whole days between the run date and the wedding day. Negative when the
/// wedding date is already behind the run date; preference validation
/// rejects that downstream.
pub fn days_until_wedding(wedding_date: NaiveDate, run_date: NaiveDate) -> i64 {
    (wedding_date - run_date).num_days()
}
