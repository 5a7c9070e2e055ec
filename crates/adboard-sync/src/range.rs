//! Range sync: one insights request covering `[since, until]`, batched
//! upserts. Suitable for windows up to about a month; longer spans go
//! through the history backfill, which chunks and delegates here.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;

use adboard_core::{META_ADS_CHANNEL_ID, META_ADS_CHANNEL_NAME};
use adboard_meta::{parse_conversations_started, parse_results_count, MetaClient};

use crate::error::SyncError;
use crate::normalize::normalize_row;
use crate::reconcile::SyncContext;

/// Metric rows are upserted in fixed-size batches to keep statements small.
const BATCH_SIZE: usize = 100;

/// Counters from one range sync, for observability.
#[derive(Debug, Clone, Serialize)]
pub struct RangeSyncReport {
    pub since: NaiveDate,
    pub until: NaiveDate,
    pub campaigns: usize,
    pub ad_rows: usize,
    pub metrics_upserted: usize,
    pub rows_dropped: u64,
    pub results: i64,
    pub conversations_started: i64,
}

/// Syncs ad-performance data for an inclusive date range.
///
/// Fetches the campaign listing once, reconciles it, fetches every ad-level
/// insight row in the window (the source paginates internally), normalizes
/// the rows that reconcile, and upserts them in batches. Re-running the
/// same window is idempotent.
///
/// # Errors
///
/// - [`SyncError::InvalidRange`] when `since > until`.
/// - [`SyncError::Meta`] / [`SyncError::Db`] on adapter or storage failure.
/// - [`SyncError::ReconciliationGap`] when a non-empty fetch produced zero
///   persistable rows — the insight and campaign-listing endpoints are
///   returning inconsistent account scopes, and persisting nothing silently
///   would mask the misconfiguration.
pub async fn sync_range(
    pool: &PgPool,
    client: &MetaClient,
    since: NaiveDate,
    until: NaiveDate,
) -> Result<RangeSyncReport, SyncError> {
    if since > until {
        return Err(SyncError::InvalidRange { since, until });
    }

    adboard_db::ensure_channel(pool, META_ADS_CHANNEL_ID, META_ADS_CHANNEL_NAME).await?;

    let campaigns = client.fetch_campaigns().await?;
    let mut ctx = SyncContext::new(META_ADS_CHANNEL_ID);
    ctx.reconcile_campaigns(pool, &campaigns).await?;

    let insights = client.fetch_ad_insights(since, until).await?;

    let mut metric_rows = Vec::with_capacity(insights.len());
    let mut results_total = 0i64;
    let mut conversations_total = 0i64;

    for row in &insights {
        results_total += parse_results_count(row.actions.as_deref());
        conversations_total += parse_conversations_started(row.actions.as_deref());

        if let Some((campaign_id, ad_id)) = ctx.resolve_row(pool, row).await? {
            metric_rows.push(normalize_row(campaign_id, ad_id, row, since));
        }
    }

    if !insights.is_empty() && metric_rows.is_empty() {
        return Err(ctx.reconciliation_gap());
    }

    for batch in metric_rows.chunks(BATCH_SIZE) {
        adboard_db::upsert_daily_metrics(pool, META_ADS_CHANNEL_ID, batch).await?;
    }

    if ctx.dropped_rows() > 0 {
        tracing::warn!(
            since = %since,
            until = %until,
            dropped = ctx.dropped_rows(),
            "sync: insight rows dropped for unresolved identifiers"
        );
    }
    tracing::info!(
        since = %since,
        until = %until,
        campaigns = ctx.campaign_count(),
        ad_rows = insights.len(),
        metrics_upserted = metric_rows.len(),
        "sync: range complete"
    );

    Ok(RangeSyncReport {
        since,
        until,
        campaigns: campaigns.len(),
        ad_rows: insights.len(),
        metrics_upserted: metric_rows.len(),
        rows_dropped: ctx.dropped_rows(),
        results: results_total,
        conversations_started: conversations_total,
    })
}
