//! Integration tests for the adboard-db crate against a real Postgres
//! database, using `#[sqlx::test]` with the workspace migrations.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use adboard_db::{NewDailyMetric, metrics, upsert_ad, upsert_ad_set, upsert_campaign};

const CHANNEL: &str = "meta_ads";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

async fn seed_channel(pool: &PgPool) {
    adboard_db::ensure_channel(pool, CHANNEL, "Meta Ads")
        .await
        .expect("ensure channel");
}

fn metric(campaign_id: Uuid, ad_id: Uuid, day: NaiveDate, leads: i64) -> NewDailyMetric {
    NewDailyMetric {
        campaign_id,
        ad_id,
        date: day,
        impressions: 1_000,
        link_clicks: 40,
        spend_brl: Decimal::new(12_345, 2),
        leads,
        results: leads,
        conversations_started: 0,
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn ensure_channel_is_idempotent(pool: PgPool) {
    seed_channel(&pool).await;
    seed_channel(&pool).await;

    let channels = adboard_db::list_enabled_channels(&pool)
        .await
        .expect("list channels");
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].id, CHANNEL);
    assert_eq!(channels[0].name, "Meta Ads");
}

#[sqlx::test(migrations = "../../migrations")]
async fn campaign_upsert_returns_stable_id_and_updates_name(pool: PgPool) {
    seed_channel(&pool).await;

    let first = upsert_campaign(&pool, CHANNEL, "123", "Old Name", Some("OUTCOME_LEADS"))
        .await
        .expect("first upsert");
    let second = upsert_campaign(&pool, CHANNEL, "123", "New Name", Some("OUTCOME_LEADS"))
        .await
        .expect("second upsert");

    assert_eq!(first, second, "conflict must reuse the internal id");

    let dims = adboard_db::load_campaign_dims(&pool, &[first])
        .await
        .expect("load dims");
    assert_eq!(dims.len(), 1);
    assert_eq!(dims[0].name, "New Name");
    assert_eq!(dims[0].objective.as_deref(), Some("OUTCOME_LEADS"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn ad_upsert_links_ad_set_when_provided(pool: PgPool) {
    seed_channel(&pool).await;
    let campaign = upsert_campaign(&pool, CHANNEL, "c1", "Campaign", None)
        .await
        .expect("campaign");
    let ad_set = upsert_ad_set(&pool, campaign, "s1", "Set One")
        .await
        .expect("ad set")
        .expect("ad_sets table exists in the migrated schema");

    let ad = upsert_ad(&pool, campaign, "a1", "Ad One", Some(ad_set))
        .await
        .expect("ad");

    let dims = adboard_db::load_ad_dims(&pool, &[ad]).await.expect("dims");
    assert_eq!(dims.len(), 1);
    assert_eq!(dims[0].campaign_id, campaign);
    assert_eq!(dims[0].ad_set_id, Some(ad_set));
}

#[sqlx::test(migrations = "../../migrations")]
async fn metric_upsert_is_idempotent_for_same_key(pool: PgPool) {
    seed_channel(&pool).await;
    let campaign = upsert_campaign(&pool, CHANNEL, "c1", "Campaign", None)
        .await
        .expect("campaign");
    let ad = upsert_ad(&pool, campaign, "a1", "Ad", None)
        .await
        .expect("ad");
    let day = date(2025, 9, 14);

    let rows = vec![metric(campaign, ad, day, 3)];
    metrics::upsert_daily_metrics(&pool, CHANNEL, &rows)
        .await
        .expect("first upsert");
    metrics::upsert_daily_metrics(&pool, CHANNEL, &rows)
        .await
        .expect("second upsert");

    let loaded = metrics::load_metrics(&pool, CHANNEL, day, day)
        .await
        .expect("load");
    assert_eq!(loaded.len(), 1, "re-sync must not duplicate rows");
    assert_eq!(loaded[0].leads, 3, "values must match source, not doubled");
    assert_eq!(loaded[0].results, Some(3));
}

#[sqlx::test(migrations = "../../migrations")]
async fn metric_upsert_overwrites_on_conflict(pool: PgPool) {
    seed_channel(&pool).await;
    let campaign = upsert_campaign(&pool, CHANNEL, "c1", "Campaign", None)
        .await
        .expect("campaign");
    let ad = upsert_ad(&pool, campaign, "a1", "Ad", None)
        .await
        .expect("ad");
    let day = date(2025, 9, 14);

    metrics::upsert_daily_metrics(&pool, CHANNEL, &[metric(campaign, ad, day, 3)])
        .await
        .expect("first upsert");
    metrics::upsert_daily_metrics(&pool, CHANNEL, &[metric(campaign, ad, day, 7)])
        .await
        .expect("second upsert");

    let loaded = metrics::load_metrics(&pool, CHANNEL, day, day)
        .await
        .expect("load");
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].leads, 7, "last write wins");
}

#[sqlx::test(migrations = "../../migrations")]
async fn delete_metrics_for_day_removes_only_that_day(pool: PgPool) {
    seed_channel(&pool).await;
    let campaign = upsert_campaign(&pool, CHANNEL, "c1", "Campaign", None)
        .await
        .expect("campaign");
    let ad = upsert_ad(&pool, campaign, "a1", "Ad", None)
        .await
        .expect("ad");

    let d1 = date(2025, 9, 13);
    let d2 = date(2025, 9, 14);
    metrics::upsert_daily_metrics(
        &pool,
        CHANNEL,
        &[metric(campaign, ad, d1, 1), metric(campaign, ad, d2, 2)],
    )
    .await
    .expect("upsert");

    let deleted = metrics::delete_metrics_for_day(&pool, CHANNEL, d2)
        .await
        .expect("delete");
    assert_eq!(deleted, 1);

    let remaining = metrics::load_metrics(&pool, CHANNEL, d1, d2)
        .await
        .expect("load");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].date, d1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn load_metrics_respects_window_bounds(pool: PgPool) {
    seed_channel(&pool).await;
    let campaign = upsert_campaign(&pool, CHANNEL, "c1", "Campaign", None)
        .await
        .expect("campaign");
    let ad = upsert_ad(&pool, campaign, "a1", "Ad", None)
        .await
        .expect("ad");

    for day in [date(2025, 9, 1), date(2025, 9, 7), date(2025, 9, 8)] {
        metrics::upsert_daily_metrics(&pool, CHANNEL, &[metric(campaign, ad, day, 1)])
            .await
            .expect("upsert");
    }

    let loaded = metrics::load_metrics(&pool, CHANNEL, date(2025, 9, 1), date(2025, 9, 7))
        .await
        .expect("load");
    assert_eq!(loaded.len(), 2, "inclusive bounds: the 8th is excluded");
}
