//! Database operations for the `campaigns` table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::caps::{is_undefined_column, schema_caps};
use crate::DbError;

/// Dimension attributes for one campaign, joined onto metric rows.
///
/// `objective` is `None` both for campaigns without one and on schemas where
/// the column has not been migrated yet.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CampaignDim {
    pub id: Uuid,
    pub name: String,
    pub objective: Option<String>,
}

/// Upserts a campaign keyed on `(channel_id, external_id)` and returns the
/// internal id.
///
/// On a schema without the `objective` column the statement is retried once
/// without it and the absence is remembered for the process lifetime.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails for any other reason, or if
/// the objective-free retry fails too.
pub async fn upsert_campaign(
    pool: &PgPool,
    channel_id: &str,
    external_id: &str,
    name: &str,
    objective: Option<&str>,
) -> Result<Uuid, DbError> {
    let caps = schema_caps();

    if caps.has_campaign_objective() {
        let result = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO campaigns (channel_id, external_id, name, objective) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (channel_id, external_id) DO UPDATE SET \
                 name       = EXCLUDED.name, \
                 objective  = EXCLUDED.objective, \
                 updated_at = NOW() \
             RETURNING id",
        )
        .bind(channel_id)
        .bind(external_id)
        .bind(name)
        .bind(objective)
        .fetch_one(pool)
        .await;

        match result {
            Ok(id) => return Ok(id),
            Err(e) if is_undefined_column(&e) => caps.mark_campaign_objective_missing(),
            Err(e) => return Err(e.into()),
        }
    }

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO campaigns (channel_id, external_id, name) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (channel_id, external_id) DO UPDATE SET \
             name       = EXCLUDED.name, \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(channel_id)
    .bind(external_id)
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Loads dimension rows for the given campaign ids.
///
/// On a schema without the `objective` column, rows come back with
/// `objective = None` instead of failing the query.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn load_campaign_dims(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<CampaignDim>, DbError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let caps = schema_caps();

    if caps.has_campaign_objective() {
        let result = sqlx::query_as::<_, CampaignDim>(
            "SELECT id, name, objective FROM campaigns WHERE id = ANY($1) ORDER BY name",
        )
        .bind(ids)
        .fetch_all(pool)
        .await;

        match result {
            Ok(rows) => return Ok(rows),
            Err(e) if is_undefined_column(&e) => caps.mark_campaign_objective_missing(),
            Err(e) => return Err(e.into()),
        }
    }

    let rows = sqlx::query_as::<_, (Uuid, String)>(
        "SELECT id, name FROM campaigns WHERE id = ANY($1) ORDER BY name",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name)| CampaignDim {
            id,
            name,
            objective: None,
        })
        .collect())
}
