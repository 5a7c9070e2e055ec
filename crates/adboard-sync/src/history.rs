//! History backfill: a long window split into calendar-month chunks, run
//! strictly sequentially with a fixed delay between chunks.
//!
//! The sequencing is a deliberate throttle against source-API rate limits,
//! not a performance concern — chunks must never fan out concurrently. A
//! failed chunk does not stop the backfill unless the failure is one of the
//! two fatal upstream conditions (expired credential, missing ad-account
//! permission), which no amount of retrying will fix.

use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;

use adboard_core::{monthly_chunks, yesterday_local, DateChunk, META_ADS_CHANNEL_ID};
use adboard_meta::MetaClient;

use crate::error::SyncError;
use crate::fatal::{classify_fatal, FatalKind};
use crate::range::{sync_range, RangeSyncReport};

const DEFAULT_CHUNK_DELAY: Duration = Duration::from_millis(800);

/// Options for a history backfill.
#[derive(Debug, Clone)]
pub struct HistorySyncOptions {
    pub since: NaiveDate,
    pub delay_between_chunks: Duration,
    /// End of the window; defaults to timezone-local yesterday. Pinnable in
    /// tests and replays.
    pub until: Option<NaiveDate>,
}

impl HistorySyncOptions {
    #[must_use]
    pub fn new(since: NaiveDate) -> Self {
        Self {
            since,
            delay_between_chunks: DEFAULT_CHUNK_DELAY,
            until: None,
        }
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_between_chunks = delay;
        self
    }

    #[must_use]
    pub fn with_until(mut self, until: NaiveDate) -> Self {
        self.until = Some(until);
        self
    }
}

/// Result of one backfill chunk.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkOutcome {
    pub since: NaiveDate,
    pub until: NaiveDate,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of a completed backfill.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryReport {
    pub since: NaiveDate,
    pub until: NaiveDate,
    pub chunks_total: usize,
    pub success: usize,
    pub errors: usize,
    pub details: Vec<ChunkOutcome>,
}

/// Backfills `[since, yesterday]` in calendar-month chunks.
///
/// Before pulling anything, deletes the most recent day's persisted metrics
/// for the channel: a prior failed run may have left a partial day behind,
/// and re-upserting on top of it would double-count nothing, but a *renamed*
/// identity (ad deleted upstream) would linger. The delete makes the most
/// recent day authoritative again.
///
/// # Errors
///
/// - [`SyncError::InvalidRange`] when `since` is after yesterday. Checked
///   before the delete, so a bad request has no side effects.
/// - [`SyncError::AccessTokenExpired`] / [`SyncError::AdAccountPermission`]
///   when a chunk fails with a fatal upstream condition; remaining chunks
///   are skipped and already-synced chunks keep their data.
/// - [`SyncError::Db`] if the initial delete fails.
pub async fn run_history_sync(
    pool: &PgPool,
    client: &MetaClient,
    options: HistorySyncOptions,
) -> Result<HistoryReport, SyncError> {
    let until = options.until.unwrap_or_else(yesterday_local);
    if options.since > until {
        return Err(SyncError::InvalidRange {
            since: options.since,
            until,
        });
    }

    let deleted = adboard_db::delete_metrics_for_day(pool, META_ADS_CHANNEL_ID, until).await?;
    if deleted > 0 {
        tracing::info!(date = %until, deleted, "backfill: cleared most recent day before re-pull");
    }

    let chunks = monthly_chunks(options.since, until);
    drive_chunks(
        options.since,
        until,
        &chunks,
        options.delay_between_chunks,
        |chunk| sync_range(pool, client, chunk.since, chunk.until),
    )
    .await
}

/// Runs the chunk sequence. Split from [`run_history_sync`] so the
/// orchestration — sequencing, delay, fatal abort, outcome collection — can
/// be tested with a stubbed chunk runner.
async fn drive_chunks<F, Fut>(
    since: NaiveDate,
    until: NaiveDate,
    chunks: &[DateChunk],
    delay: Duration,
    mut run_chunk: F,
) -> Result<HistoryReport, SyncError>
where
    F: FnMut(DateChunk) -> Fut,
    Fut: Future<Output = Result<RangeSyncReport, SyncError>>,
{
    let total = chunks.len();
    let mut details: Vec<ChunkOutcome> = Vec::with_capacity(total);

    for (index, chunk) in chunks.iter().enumerate() {
        tracing::info!(
            chunk = index + 1,
            total,
            since = %chunk.since,
            until = %chunk.until,
            "backfill: running chunk"
        );

        match run_chunk(*chunk).await {
            Ok(report) => {
                tracing::info!(
                    chunk = index + 1,
                    ad_rows = report.ad_rows,
                    metrics_upserted = report.metrics_upserted,
                    "backfill: chunk complete"
                );
                details.push(ChunkOutcome {
                    since: chunk.since,
                    until: chunk.until,
                    ok: true,
                    error: None,
                });
            }
            Err(err) => {
                let message = err.to_string();
                details.push(ChunkOutcome {
                    since: chunk.since,
                    until: chunk.until,
                    ok: false,
                    error: Some(message.clone()),
                });
                match classify_fatal(&message) {
                    Some(FatalKind::AccessTokenExpired) => {
                        return Err(SyncError::AccessTokenExpired { message });
                    }
                    Some(FatalKind::AdAccountPermission) => {
                        return Err(SyncError::AdAccountPermission { message });
                    }
                    None => {
                        tracing::warn!(
                            chunk = index + 1,
                            error = %message,
                            "backfill: chunk failed; continuing with next chunk"
                        );
                    }
                }
            }
        }

        if index + 1 < total {
            tokio::time::sleep(delay).await;
        }
    }

    let success = details.iter().filter(|d| d.ok).count();
    let errors = details.len() - success;

    Ok(HistoryReport {
        since,
        until,
        chunks_total: total,
        success,
        errors,
        details,
    })
}
