use std::collections::HashSet;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use adboard_core::{parse_date_param, yesterday_local, META_ADS_CHANNEL_ID};
use adboard_sync::{DashboardData, DashboardFilters, DateScope};

use crate::middleware::RequestId;

use super::{map_db_error, map_sync_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct DashboardQuery {
    pub channel: Option<String>,
    pub date: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub campaign_ids: Option<String>,
    pub ad_set_ids: Option<String>,
    pub ad_ids: Option<String>,
    pub objective: Option<String>,
}

impl DashboardQuery {
    fn channel(&self) -> &str {
        self.channel.as_deref().unwrap_or(META_ADS_CHANNEL_ID)
    }

    /// A valid `since`+`until` pair wins; otherwise a valid `date`;
    /// otherwise timezone-local yesterday. Malformed dates fall back, they
    /// never error.
    fn scope(&self) -> DateScope {
        let since = parse_date_param(self.since.as_deref());
        let until = parse_date_param(self.until.as_deref());
        if let (Some(since), Some(until)) = (since, until) {
            return DateScope::Range { since, until };
        }
        match parse_date_param(self.date.as_deref()) {
            Some(date) => DateScope::Day(date),
            None => DateScope::Day(yesterday_local()),
        }
    }

    fn filters(&self, request_id: &str) -> Result<DashboardFilters, ApiError> {
        Ok(DashboardFilters {
            campaign_ids: parse_uuid_list(self.campaign_ids.as_deref(), "campaign_ids", request_id)?,
            ad_set_ids: parse_uuid_list(self.ad_set_ids.as_deref(), "ad_set_ids", request_id)?,
            ad_ids: parse_uuid_list(self.ad_ids.as_deref(), "ad_ids", request_id)?,
            objective: self
                .objective
                .clone()
                .filter(|o| !o.is_empty()),
        })
    }
}

/// Parses a comma-separated UUID list; empty segments are ignored.
fn parse_uuid_list(
    raw: Option<&str>,
    param: &str,
    request_id: &str,
) -> Result<Vec<Uuid>, ApiError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Uuid>().map_err(|_| {
                ApiError::new(
                    request_id.to_string(),
                    "validation_error",
                    format!("{param} contains an invalid id: {s}"),
                )
            })
        })
        .collect()
}

pub(super) async fn get_dashboard(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<ApiResponse<DashboardData>>, ApiError> {
    let filters = query.filters(&req_id.0)?;
    let scope = query.scope();

    let data = adboard_sync::load_dashboard(&state.pool, query.channel(), scope, &filters)
        .await
        .map_err(|e| map_sync_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

// ---------------------------------------------------------------------------
// Filter options
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct FilterOptions {
    campaigns: Vec<CampaignOption>,
    ad_sets: Vec<AdSetOption>,
    ads: Vec<AdOption>,
    objectives: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct CampaignOption {
    id: Uuid,
    name: String,
    objective: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct AdSetOption {
    id: Uuid,
    name: String,
    campaign_id: Uuid,
}

#[derive(Debug, Serialize)]
pub(super) struct AdOption {
    id: Uuid,
    name: String,
    campaign_id: Uuid,
    ad_set_id: Option<Uuid>,
}

/// Filter options restricted to the selected period and to the filters
/// already applied, so the UI only offers combinations that have at least
/// one metric row. Unlike the dashboard itself, this endpoint requires an
/// explicit period: options for an implicit default window would silently
/// disagree with the page that requested them.
pub(super) async fn get_filter_options(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<ApiResponse<FilterOptions>>, ApiError> {
    let since = parse_date_param(query.since.as_deref());
    let until = parse_date_param(query.until.as_deref());
    let date = parse_date_param(query.date.as_deref());

    let (since, until) = match (since, until, date) {
        (Some(since), Some(until), _) => (since, until),
        (_, _, Some(date)) => (date, date),
        _ => {
            return Err(ApiError::new(
                req_id.0,
                "validation_error",
                "provide since+until or date",
            ));
        }
    };

    let filters = query.filters(&req_id.0)?;
    let channel = query.channel();

    let metric_rows = adboard_db::load_metrics(&state.pool, channel, since, until)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let mut campaign_ids: HashSet<Uuid> = metric_rows.iter().map(|r| r.campaign_id).collect();
    let mut ad_ids: HashSet<Uuid> = metric_rows.iter().map(|r| r.ad_id).collect();

    // Narrow by the already-applied campaign filter, then re-derive the ad
    // set from the surviving rows (and vice versa) so both lists stay
    // consistent with each other.
    if !filters.campaign_ids.is_empty() {
        let wanted: HashSet<Uuid> = filters.campaign_ids.iter().copied().collect();
        campaign_ids.retain(|id| wanted.contains(id));
        ad_ids = metric_rows
            .iter()
            .filter(|r| campaign_ids.contains(&r.campaign_id))
            .map(|r| r.ad_id)
            .collect();
    }
    if !filters.ad_ids.is_empty() {
        let wanted: HashSet<Uuid> = filters.ad_ids.iter().copied().collect();
        ad_ids.retain(|id| wanted.contains(id));
        let from_ads: HashSet<Uuid> = metric_rows
            .iter()
            .filter(|r| ad_ids.contains(&r.ad_id))
            .map(|r| r.campaign_id)
            .collect();
        campaign_ids.retain(|id| from_ads.contains(id));
    }

    if campaign_ids.is_empty() && ad_ids.is_empty() {
        return Ok(Json(ApiResponse {
            data: FilterOptions {
                campaigns: Vec::new(),
                ad_sets: Vec::new(),
                ads: Vec::new(),
                objectives: Vec::new(),
            },
            meta: ResponseMeta::new(req_id.0),
        }));
    }

    let campaign_id_list: Vec<Uuid> = campaign_ids.iter().copied().collect();
    let mut campaigns = adboard_db::load_campaign_dims(&state.pool, &campaign_id_list)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    if let Some(objective) = filters.objective.as_deref() {
        campaigns.retain(|c| c.objective.as_deref() == Some(objective));
    }
    let campaigns_after_objective: HashSet<Uuid> = campaigns.iter().map(|c| c.id).collect();

    let ad_id_list: Vec<Uuid> = ad_ids.iter().copied().collect();
    let mut ads = adboard_db::load_ad_dims(&state.pool, &ad_id_list)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    ads.retain(|a| campaigns_after_objective.contains(&a.campaign_id));

    if !filters.ad_set_ids.is_empty() {
        let wanted: HashSet<Uuid> = filters.ad_set_ids.iter().copied().collect();
        ads.retain(|a| a.ad_set_id.is_some_and(|id| wanted.contains(&id)));
    }

    let ad_set_id_list: Vec<Uuid> = {
        let mut seen = HashSet::new();
        ads.iter()
            .filter_map(|a| a.ad_set_id)
            .filter(|id| seen.insert(*id))
            .collect()
    };
    let mut ad_sets = adboard_db::load_ad_set_dims(&state.pool, &ad_set_id_list)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    ad_sets.retain(|s| campaigns_after_objective.contains(&s.campaign_id));

    let mut objectives: Vec<String> = campaigns
        .iter()
        .filter_map(|c| c.objective.clone())
        .filter(|o| !o.is_empty())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    objectives.sort();

    Ok(Json(ApiResponse {
        data: FilterOptions {
            campaigns: campaigns
                .into_iter()
                .map(|c| CampaignOption {
                    id: c.id,
                    name: c.name,
                    objective: c.objective,
                })
                .collect(),
            ad_sets: ad_sets
                .into_iter()
                .map(|s| AdSetOption {
                    id: s.id,
                    name: s.name,
                    campaign_id: s.campaign_id,
                })
                .collect(),
            ads: ads
                .into_iter()
                .map(|a| AdOption {
                    id: a.id,
                    name: a.name,
                    campaign_id: a.campaign_id,
                    ad_set_id: a.ad_set_id,
                })
                .collect(),
            objectives,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
