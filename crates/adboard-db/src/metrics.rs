//! Database operations for the `daily_metrics` table.
//!
//! The composite key `(channel_id, campaign_id, ad_id, date)` is the
//! idempotency key for every sync: re-running a window overwrites rows
//! instead of duplicating them.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::caps::{is_undefined_column, schema_caps};
use crate::DbError;

/// One normalized metric record ready to persist.
#[derive(Debug, Clone)]
pub struct NewDailyMetric {
    pub campaign_id: Uuid,
    pub ad_id: Uuid,
    pub date: NaiveDate,
    pub impressions: i64,
    pub link_clicks: i64,
    pub spend_brl: Decimal,
    pub leads: i64,
    pub results: i64,
    pub conversations_started: i64,
}

/// One persisted metric row as loaded for the dashboard.
///
/// `results` is `None` on schemas where the column has not been migrated;
/// the aggregation layer falls back to `leads + conversations_started`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DailyMetricRow {
    pub date: NaiveDate,
    pub campaign_id: Uuid,
    pub ad_id: Uuid,
    pub impressions: i64,
    pub link_clicks: i64,
    pub spend_brl: Decimal,
    pub leads: i64,
    pub results: Option<i64>,
    pub conversations_started: i64,
}

/// Upserts a batch of metric rows for one channel in a single round-trip.
///
/// Uses `INSERT … SELECT FROM UNNEST(…) ON CONFLICT` so the whole batch is
/// one statement regardless of size; conflicts on the idempotency key
/// overwrite every metric column. On a schema without the `results` column
/// the batch is retried once without it and the absence is remembered for
/// the process lifetime.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails for any other reason, or if
/// the results-free retry fails too.
pub async fn upsert_daily_metrics(
    pool: &PgPool,
    channel_id: &str,
    rows: &[NewDailyMetric],
) -> Result<u64, DbError> {
    if rows.is_empty() {
        return Ok(0);
    }

    let mut campaign_ids: Vec<Uuid> = Vec::with_capacity(rows.len());
    let mut ad_ids: Vec<Uuid> = Vec::with_capacity(rows.len());
    let mut dates: Vec<NaiveDate> = Vec::with_capacity(rows.len());
    let mut impressions: Vec<i64> = Vec::with_capacity(rows.len());
    let mut link_clicks: Vec<i64> = Vec::with_capacity(rows.len());
    let mut spends: Vec<Decimal> = Vec::with_capacity(rows.len());
    let mut leads: Vec<i64> = Vec::with_capacity(rows.len());
    let mut results: Vec<i64> = Vec::with_capacity(rows.len());
    let mut conversations: Vec<i64> = Vec::with_capacity(rows.len());

    for row in rows {
        campaign_ids.push(row.campaign_id);
        ad_ids.push(row.ad_id);
        dates.push(row.date);
        impressions.push(row.impressions);
        link_clicks.push(row.link_clicks);
        spends.push(row.spend_brl);
        leads.push(row.leads);
        results.push(row.results);
        conversations.push(row.conversations_started);
    }

    let caps = schema_caps();

    if caps.has_metric_results() {
        let result = sqlx::query(
            "INSERT INTO daily_metrics \
                 (channel_id, campaign_id, ad_id, date, impressions, link_clicks, \
                  spend_brl, leads, results, conversations_started) \
             SELECT $1, * FROM UNNEST(\
                  $2::uuid[], $3::uuid[], $4::date[], $5::bigint[], $6::bigint[], \
                  $7::numeric[], $8::bigint[], $9::bigint[], $10::bigint[]) \
             ON CONFLICT (channel_id, campaign_id, ad_id, date) DO UPDATE SET \
                 impressions           = EXCLUDED.impressions, \
                 link_clicks           = EXCLUDED.link_clicks, \
                 spend_brl             = EXCLUDED.spend_brl, \
                 leads                 = EXCLUDED.leads, \
                 results               = EXCLUDED.results, \
                 conversations_started = EXCLUDED.conversations_started",
        )
        .bind(channel_id)
        .bind(&campaign_ids)
        .bind(&ad_ids)
        .bind(&dates)
        .bind(&impressions)
        .bind(&link_clicks)
        .bind(&spends)
        .bind(&leads)
        .bind(&results)
        .bind(&conversations)
        .execute(pool)
        .await;

        match result {
            Ok(done) => return Ok(done.rows_affected()),
            Err(e) if is_undefined_column(&e) => caps.mark_metric_results_missing(),
            Err(e) => return Err(e.into()),
        }
    }

    let done = sqlx::query(
        "INSERT INTO daily_metrics \
             (channel_id, campaign_id, ad_id, date, impressions, link_clicks, \
              spend_brl, leads, conversations_started) \
         SELECT $1, * FROM UNNEST(\
              $2::uuid[], $3::uuid[], $4::date[], $5::bigint[], $6::bigint[], \
              $7::numeric[], $8::bigint[], $9::bigint[]) \
         ON CONFLICT (channel_id, campaign_id, ad_id, date) DO UPDATE SET \
             impressions           = EXCLUDED.impressions, \
             link_clicks           = EXCLUDED.link_clicks, \
             spend_brl             = EXCLUDED.spend_brl, \
             leads                 = EXCLUDED.leads, \
             conversations_started = EXCLUDED.conversations_started",
    )
    .bind(channel_id)
    .bind(&campaign_ids)
    .bind(&ad_ids)
    .bind(&dates)
    .bind(&impressions)
    .bind(&link_clicks)
    .bind(&spends)
    .bind(&leads)
    .bind(&conversations)
    .execute(pool)
    .await?;

    Ok(done.rows_affected())
}

/// Loads all metric rows for a channel within an inclusive date window,
/// ordered by date.
///
/// On a schema without the `results` column, rows come back with
/// `results = None` instead of failing the query.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn load_metrics(
    pool: &PgPool,
    channel_id: &str,
    since: NaiveDate,
    until: NaiveDate,
) -> Result<Vec<DailyMetricRow>, DbError> {
    let caps = schema_caps();

    if caps.has_metric_results() {
        let result = sqlx::query_as::<_, DailyMetricRow>(
            "SELECT date, campaign_id, ad_id, impressions, link_clicks, spend_brl, \
                    leads, results, conversations_started \
             FROM daily_metrics \
             WHERE channel_id = $1 AND date BETWEEN $2 AND $3 \
             ORDER BY date",
        )
        .bind(channel_id)
        .bind(since)
        .bind(until)
        .fetch_all(pool)
        .await;

        match result {
            Ok(rows) => return Ok(rows),
            Err(e) if is_undefined_column(&e) => caps.mark_metric_results_missing(),
            Err(e) => return Err(e.into()),
        }
    }

    #[derive(sqlx::FromRow)]
    struct WithoutResults {
        date: NaiveDate,
        campaign_id: Uuid,
        ad_id: Uuid,
        impressions: i64,
        link_clicks: i64,
        spend_brl: Decimal,
        leads: i64,
        conversations_started: i64,
    }

    let rows = sqlx::query_as::<_, WithoutResults>(
        "SELECT date, campaign_id, ad_id, impressions, link_clicks, spend_brl, \
                leads, conversations_started \
         FROM daily_metrics \
         WHERE channel_id = $1 AND date BETWEEN $2 AND $3 \
         ORDER BY date",
    )
    .bind(channel_id)
    .bind(since)
    .bind(until)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| DailyMetricRow {
            date: r.date,
            campaign_id: r.campaign_id,
            ad_id: r.ad_id,
            impressions: r.impressions,
            link_clicks: r.link_clicks,
            spend_brl: r.spend_brl,
            leads: r.leads,
            results: None,
            conversations_started: r.conversations_started,
        })
        .collect())
}

/// Deletes all metric rows for a channel on one date, returning the count.
///
/// The history backfill runs this for the most recent day before re-pulling
/// so a partial earlier run cannot leave double-counted rows behind.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_metrics_for_day(
    pool: &PgPool,
    channel_id: &str,
    date: NaiveDate,
) -> Result<u64, DbError> {
    let done = sqlx::query("DELETE FROM daily_metrics WHERE channel_id = $1 AND date = $2")
        .bind(channel_id)
        .bind(date)
        .execute(pool)
        .await?;
    Ok(done.rows_affected())
}
