//! Database operations for the `channels` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `channels` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChannelRow {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Idempotently create the channel row, refreshing its display name.
///
/// Every sync pass calls this before writing metrics so the channel exists
/// even on a freshly-migrated database.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn ensure_channel(pool: &PgPool, id: &str, name: &str) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO channels (id, name, enabled) \
         VALUES ($1, $2, TRUE) \
         ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name",
    )
    .bind(id)
    .bind(name)
    .execute(pool)
    .await?;
    Ok(())
}

/// Returns all enabled channels, ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_enabled_channels(pool: &PgPool) -> Result<Vec<ChannelRow>, DbError> {
    let rows = sqlx::query_as::<_, ChannelRow>(
        "SELECT id, name, enabled, created_at \
         FROM channels \
         WHERE enabled = TRUE \
         ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Returns the channel's display name, or `None` for an unknown id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_channel_name(pool: &PgPool, id: &str) -> Result<Option<String>, DbError> {
    let name = sqlx::query_scalar::<_, String>("SELECT name FROM channels WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(name)
}
