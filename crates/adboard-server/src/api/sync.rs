//! Sync trigger routes: manual day/history syncs and the scheduled cron
//! trigger.

use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::header::AUTHORIZATION,
    http::HeaderMap,
    Extension, Json,
};
use serde::Deserialize;
use subtle::ConstantTimeEq;

use adboard_core::{parse_date_param, yesterday_local};
use adboard_meta::{MetaClient, MetaConfig};
use adboard_sync::{DaySyncReport, HistoryReport, HistorySyncOptions};

use crate::middleware::{extract_bearer_token, RequestId};

use super::{map_sync_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct DaySyncQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct HistorySyncQuery {
    pub since: Option<String>,
}

/// Builds the Meta client from process configuration. Missing credentials
/// surface immediately as a configuration error, before any fetch.
fn build_meta_client(state: &AppState, request_id: &str) -> Result<MetaClient, ApiError> {
    let meta_config = MetaConfig::from_app_config(&state.config).map_err(|e| {
        tracing::error!(error = %e, "sync rejected: Meta credentials not configured");
        ApiError::new(request_id.to_string(), "config_error", e.to_string())
    })?;

    MetaClient::new(meta_config, state.config.meta_request_timeout_secs)
        .map(|client| {
            client.with_retry_policy(
                state.config.meta_max_retries,
                state.config.meta_retry_backoff_base_ms,
            )
        })
        .map_err(|e| {
            tracing::error!(error = %e, "failed to construct Meta client");
            ApiError::new(
                request_id.to_string(),
                "internal_error",
                "failed to construct upstream client",
            )
        })
}

/// `POST /api/v1/sync/day?date=` — sync one day; invalid or missing dates
/// fall back to timezone-local yesterday.
pub(super) async fn sync_day(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<DaySyncQuery>,
) -> Result<Json<ApiResponse<DaySyncReport>>, ApiError> {
    let date = parse_date_param(query.date.as_deref()).unwrap_or_else(yesterday_local);
    let client = build_meta_client(&state, &req_id.0)?;

    let report = adboard_sync::sync_day(&state.pool, &client, date)
        .await
        .map_err(|e| map_sync_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: report,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// `POST /api/v1/sync/history?since=` — backfill from `since` (default from
/// configuration) through timezone-local yesterday in monthly chunks.
pub(super) async fn sync_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<HistorySyncQuery>,
) -> Result<Json<ApiResponse<HistoryReport>>, ApiError> {
    let since =
        parse_date_param(query.since.as_deref()).unwrap_or(state.config.history_default_since);

    // Reject an impossible window before constructing the client or touching
    // the store: a 4xx here must have no side effects.
    let yesterday = yesterday_local();
    if since > yesterday {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!("since {since} must not be after yesterday ({yesterday})"),
        ));
    }

    let client = build_meta_client(&state, &req_id.0)?;
    let options = HistorySyncOptions::new(since)
        .with_delay(Duration::from_millis(state.config.sync_chunk_delay_ms));

    let report = adboard_sync::run_history_sync(&state.pool, &client, options)
        .await
        .map_err(|e| map_sync_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: report,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// `GET /api/v1/cron/sync` — the scheduled trigger boundary.
///
/// Authenticated by the shared scheduler secret, compared in constant time.
/// A missing or non-matching secret yields 401 with no side effects.
pub(super) async fn cron_sync(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<DaySyncReport>>, ApiError> {
    let Some(expected) = state.config.cron_secret.as_deref() else {
        tracing::error!("cron sync rejected: ADBOARD_CRON_SECRET is not configured");
        return Err(ApiError::new(
            req_id.0,
            "unauthorized",
            "scheduled sync is not configured",
        ));
    };

    let provided = extract_bearer_token(headers.get(AUTHORIZATION));
    if !provided.is_some_and(|token| secret_matches(token, expected)) {
        return Err(ApiError::new(
            req_id.0,
            "unauthorized",
            "missing or invalid scheduler secret",
        ));
    }

    let date = yesterday_local();
    let client = build_meta_client(&state, &req_id.0)?;

    let report = adboard_sync::sync_day(&state.pool, &client, date)
        .await
        .map_err(|e| map_sync_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: report,
        meta: ResponseMeta::new(req_id.0),
    }))
}

fn secret_matches(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}
