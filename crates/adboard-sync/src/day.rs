//! Single-day sync: the unit of work the scheduler and the cron trigger run.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;

use adboard_meta::MetaClient;

use crate::error::SyncError;
use crate::range::sync_range;

/// Counters from one day sync, for observability.
#[derive(Debug, Clone, Serialize)]
pub struct DaySyncReport {
    pub date: NaiveDate,
    pub campaigns: usize,
    pub ad_rows: usize,
    pub results: i64,
    pub conversations_started: i64,
}

/// Syncs ad-performance data for a single calendar date.
///
/// A one-day window through the same pipeline as [`sync_range`], so the two
/// entry points cannot drift apart in semantics.
///
/// # Errors
///
/// Propagates every [`SyncError`] from [`sync_range`].
pub async fn sync_day(
    pool: &PgPool,
    client: &MetaClient,
    date: NaiveDate,
) -> Result<DaySyncReport, SyncError> {
    let report = sync_range(pool, client, date, date).await?;

    Ok(DaySyncReport {
        date,
        campaigns: report.campaigns,
        ad_rows: report.ad_rows,
        results: report.results,
        conversations_started: report.conversations_started,
    })
}
