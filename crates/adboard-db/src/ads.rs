//! Database operations for the `ads` and `ad_sets` tables.

use sqlx::PgPool;
use uuid::Uuid;

use crate::caps::{is_undefined_column, is_undefined_table, schema_caps};
use crate::DbError;

/// Dimension attributes for one ad.
///
/// `ad_set_id` is `None` for ads reconciled before the ad-set hierarchy
/// existed and on schemas where the column has not been migrated yet.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdDim {
    pub id: Uuid,
    pub name: String,
    pub campaign_id: Uuid,
    pub ad_set_id: Option<Uuid>,
}

/// Dimension attributes for one ad set.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdSetDim {
    pub id: Uuid,
    pub name: String,
    pub campaign_id: Uuid,
}

/// Upserts an ad set keyed on `(campaign_id, external_id)` and returns the
/// internal id, or `None` when the `ad_sets` table does not exist on this
/// schema (remembered for the process lifetime).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails for any other reason.
pub async fn upsert_ad_set(
    pool: &PgPool,
    campaign_id: Uuid,
    external_id: &str,
    name: &str,
) -> Result<Option<Uuid>, DbError> {
    let caps = schema_caps();
    if !caps.has_ad_set_table() {
        return Ok(None);
    }

    let result = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO ad_sets (campaign_id, external_id, name) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (campaign_id, external_id) DO UPDATE SET \
             name       = EXCLUDED.name, \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(campaign_id)
    .bind(external_id)
    .bind(name)
    .fetch_one(pool)
    .await;

    match result {
        Ok(id) => Ok(Some(id)),
        Err(e) if is_undefined_table(&e) => {
            caps.mark_ad_set_table_missing();
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Upserts an ad keyed on `(campaign_id, external_id)` and returns the
/// internal id.
///
/// On a schema without the `ads.ad_set_id` column the statement is retried
/// once without it and the absence is remembered for the process lifetime.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails for any other reason, or if
/// the link-free retry fails too.
pub async fn upsert_ad(
    pool: &PgPool,
    campaign_id: Uuid,
    external_id: &str,
    name: &str,
    ad_set_id: Option<Uuid>,
) -> Result<Uuid, DbError> {
    let caps = schema_caps();

    if ad_set_id.is_some() && caps.has_ad_set_link() {
        let result = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO ads (campaign_id, external_id, name, ad_set_id) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (campaign_id, external_id) DO UPDATE SET \
                 name       = EXCLUDED.name, \
                 ad_set_id  = EXCLUDED.ad_set_id, \
                 updated_at = NOW() \
             RETURNING id",
        )
        .bind(campaign_id)
        .bind(external_id)
        .bind(name)
        .bind(ad_set_id)
        .fetch_one(pool)
        .await;

        match result {
            Ok(id) => return Ok(id),
            Err(e) if is_undefined_column(&e) => caps.mark_ad_set_link_missing(),
            Err(e) => return Err(e.into()),
        }
    }

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO ads (campaign_id, external_id, name) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (campaign_id, external_id) DO UPDATE SET \
             name       = EXCLUDED.name, \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(campaign_id)
    .bind(external_id)
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Loads dimension rows for the given ad ids.
///
/// On a schema without the `ads.ad_set_id` column, rows come back with
/// `ad_set_id = None` instead of failing the query.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn load_ad_dims(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<AdDim>, DbError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let caps = schema_caps();

    if caps.has_ad_set_link() {
        let result = sqlx::query_as::<_, AdDim>(
            "SELECT id, name, campaign_id, ad_set_id FROM ads WHERE id = ANY($1) ORDER BY name",
        )
        .bind(ids)
        .fetch_all(pool)
        .await;

        match result {
            Ok(rows) => return Ok(rows),
            Err(e) if is_undefined_column(&e) => caps.mark_ad_set_link_missing(),
            Err(e) => return Err(e.into()),
        }
    }

    let rows = sqlx::query_as::<_, (Uuid, String, Uuid)>(
        "SELECT id, name, campaign_id FROM ads WHERE id = ANY($1) ORDER BY name",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name, campaign_id)| AdDim {
            id,
            name,
            campaign_id,
            ad_set_id: None,
        })
        .collect())
}

/// Loads dimension rows for the given ad-set ids. Returns an empty list on
/// schemas where the `ad_sets` table does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails for any other reason.
pub async fn load_ad_set_dims(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<AdSetDim>, DbError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let caps = schema_caps();
    if !caps.has_ad_set_table() {
        return Ok(Vec::new());
    }

    let result = sqlx::query_as::<_, AdSetDim>(
        "SELECT id, name, campaign_id FROM ad_sets WHERE id = ANY($1) ORDER BY name",
    )
    .bind(ids)
    .fetch_all(pool)
    .await;

    match result {
        Ok(rows) => Ok(rows),
        Err(e) if is_undefined_table(&e) => {
            caps.mark_ad_set_table_missing();
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}
