//! Dashboard aggregation: the read side consumed by the presentation layer.
//!
//! Loads persisted metric rows for a date or range, joins human-readable
//! dimension names, applies AND-composed filters, computes totals, a
//! previous-period baseline with percentage deltas, and a per-day,
//! per-campaign time series for charting.

use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use adboard_db::{AdDim, CampaignDim, DailyMetricRow};

use crate::error::SyncError;

/// Either a single calendar date or an inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateScope {
    Day(NaiveDate),
    Range { since: NaiveDate, until: NaiveDate },
}

/// Optional dimension filters. An empty list means "no restriction" for
/// that dimension, never "exclude all"; populated filters intersect.
#[derive(Debug, Clone, Default)]
pub struct DashboardFilters {
    pub campaign_ids: Vec<Uuid>,
    pub ad_set_ids: Vec<Uuid>,
    pub ad_ids: Vec<Uuid>,
    pub objective: Option<String>,
}

/// One drill-down table row: a (campaign, ad) pair on one date (range
/// queries) or aggregated into the single requested date.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardRow {
    pub campaign_id: Uuid,
    pub campaign_name: String,
    pub ad_id: Uuid,
    pub ad_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub channel_name: String,
    pub objective: String,
    pub impressions: i64,
    pub link_clicks: i64,
    pub spend_brl: Decimal,
    pub leads: i64,
    pub leads_gerais: i64,
    pub results: i64,
    pub conversations_started: i64,
}

/// Sums of every numeric metric across a row set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardTotals {
    pub leads: i64,
    pub leads_gerais: i64,
    pub results: i64,
    pub conversations_started: i64,
    pub spend_brl: Decimal,
    pub link_clicks: i64,
    pub impressions: i64,
}

/// Percentage change per metric against the previous period.
///
/// `None` means the delta is undefined: both periods were zero. A previous
/// of zero with a nonzero current reports a flat +100 marker instead of a
/// division by zero.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardDeltas {
    pub leads: Option<f64>,
    pub leads_gerais: Option<f64>,
    pub results: Option<f64>,
    pub conversations_started: Option<f64>,
    pub spend_brl: Option<f64>,
    pub link_clicks: Option<f64>,
    pub impressions: Option<f64>,
}

/// One point of the trend chart: a campaign's numbers on one day.
#[derive(Debug, Clone, Serialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub campaign_id: Uuid,
    pub campaign_name: String,
    pub leads: i64,
    pub results: i64,
    pub conversations_started: i64,
}

/// The full aggregation output consumed by the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<NaiveDate>,
    pub channel_id: String,
    pub channel_name: String,
    pub totals: DashboardTotals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_totals: Option<DashboardTotals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deltas: Option<DashboardDeltas>,
    pub rows: Vec<DashboardRow>,
    pub chart_data: Vec<ChartPoint>,
}

/// Loads and aggregates dashboard data for one channel and scope.
///
/// # Errors
///
/// - [`SyncError::InvalidRange`] when a range scope is inverted.
/// - [`SyncError::Db`] if a storage query fails. Schema drift on the
///   `results`, `objective` and `ad_set_id` columns is absorbed by the
///   storage layer and never surfaces here.
pub async fn load_dashboard(
    pool: &PgPool,
    channel_id: &str,
    scope: DateScope,
    filters: &DashboardFilters,
) -> Result<DashboardData, SyncError> {
    let (since, until, is_range) = match scope {
        DateScope::Day(date) => (date, date, false),
        DateScope::Range { since, until } => {
            if since > until {
                return Err(SyncError::InvalidRange { since, until });
            }
            (since, until, true)
        }
    };

    let metric_rows = adboard_db::load_metrics(pool, channel_id, since, until).await?;
    let (campaign_map, ad_map) = load_dimension_maps(pool, &metric_rows).await?;
    let channel_name = adboard_db::get_channel_name(pool, channel_id)
        .await?
        .unwrap_or_default();

    let ad_set_by_ad: HashMap<Uuid, Option<Uuid>> =
        ad_map.iter().map(|(id, ad)| (*id, ad.ad_set_id)).collect();

    let rows = build_rows(&metric_rows, &campaign_map, &ad_map, &channel_name, is_range);
    let rows = apply_filters(rows, filters, &ad_set_by_ad);
    let totals = sum_totals(&rows);

    let chart_data = build_chart(&metric_rows, &campaign_map, &filters.campaign_ids);

    let mut previous_totals = None;
    let mut deltas = None;
    if is_range {
        let prev = previous_window(since, until);
        let prev_rows = adboard_db::load_metrics(pool, channel_id, prev.since, prev.until).await?;
        if !prev_rows.is_empty() {
            let (prev_campaigns, prev_ads) = load_dimension_maps(pool, &prev_rows).await?;
            let prev_ad_sets: HashMap<Uuid, Option<Uuid>> = prev_ads
                .iter()
                .map(|(id, ad)| (*id, ad.ad_set_id))
                .collect();
            let built = build_rows(&prev_rows, &prev_campaigns, &prev_ads, &channel_name, true);
            let filtered = apply_filters(built, filters, &prev_ad_sets);
            let prev_totals = sum_totals(&filtered);
            deltas = Some(compute_deltas(&totals, &prev_totals));
            previous_totals = Some(prev_totals);
        }
    }

    Ok(DashboardData {
        date: since,
        since: is_range.then_some(since),
        until: is_range.then_some(until),
        channel_id: channel_id.to_string(),
        channel_name,
        totals,
        previous_totals,
        deltas,
        rows,
        chart_data,
    })
}

/// Loads campaign and ad dimension maps for the ids a row set references.
async fn load_dimension_maps(
    pool: &PgPool,
    metric_rows: &[DailyMetricRow],
) -> Result<(HashMap<Uuid, CampaignDim>, HashMap<Uuid, AdDim>), SyncError> {
    let campaign_ids: Vec<Uuid> = distinct(metric_rows.iter().map(|r| r.campaign_id));
    let ad_ids: Vec<Uuid> = distinct(metric_rows.iter().map(|r| r.ad_id));

    let campaigns = adboard_db::load_campaign_dims(pool, &campaign_ids).await?;
    let ads = adboard_db::load_ad_dims(pool, &ad_ids).await?;

    Ok((
        campaigns.into_iter().map(|c| (c.id, c)).collect(),
        ads.into_iter().map(|a| (a.id, a)).collect(),
    ))
}

fn distinct<I: Iterator<Item = Uuid>>(ids: I) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}

/// The top-line composite: the first-class `results` value when one was
/// persisted, otherwise the fallback sum. The two paths are exclusive, so
/// a row can never be double counted.
fn leads_gerais(results: Option<i64>, leads: i64, conversations_started: i64) -> i64 {
    match results {
        Some(r) if r > 0 => r,
        _ => leads + conversations_started,
    }
}

/// Attaches dimension names to metric rows. Rows referencing unknown
/// dimensions keep empty names rather than disappearing.
fn build_rows(
    metric_rows: &[DailyMetricRow],
    campaigns: &HashMap<Uuid, CampaignDim>,
    ads: &HashMap<Uuid, AdDim>,
    channel_name: &str,
    include_date: bool,
) -> Vec<DashboardRow> {
    metric_rows
        .iter()
        .map(|r| {
            let campaign = campaigns.get(&r.campaign_id);
            let ad = ads.get(&r.ad_id);
            let results = r.results.unwrap_or(0);
            DashboardRow {
                campaign_id: r.campaign_id,
                campaign_name: campaign.map(|c| c.name.clone()).unwrap_or_default(),
                ad_id: r.ad_id,
                ad_name: ad.map(|a| a.name.clone()).unwrap_or_default(),
                date: include_date.then_some(r.date),
                channel_name: channel_name.to_string(),
                objective: campaign
                    .and_then(|c| c.objective.clone())
                    .unwrap_or_default(),
                impressions: r.impressions,
                link_clicks: r.link_clicks,
                spend_brl: r.spend_brl,
                leads: r.leads,
                leads_gerais: leads_gerais(r.results, r.leads, r.conversations_started),
                results,
                conversations_started: r.conversations_started,
            }
        })
        .collect()
}

/// Applies the filters as intersection predicates: campaign membership, then
/// ad-set membership (via the ad's ad-set link), then ad membership, then
/// objective equality.
fn apply_filters(
    rows: Vec<DashboardRow>,
    filters: &DashboardFilters,
    ad_set_by_ad: &HashMap<Uuid, Option<Uuid>>,
) -> Vec<DashboardRow> {
    let mut rows = rows;

    if !filters.campaign_ids.is_empty() {
        let set: HashSet<Uuid> = filters.campaign_ids.iter().copied().collect();
        rows.retain(|r| set.contains(&r.campaign_id));
    }
    if !filters.ad_set_ids.is_empty() {
        let set: HashSet<Uuid> = filters.ad_set_ids.iter().copied().collect();
        rows.retain(|r| {
            ad_set_by_ad
                .get(&r.ad_id)
                .copied()
                .flatten()
                .is_some_and(|ad_set| set.contains(&ad_set))
        });
    }
    if !filters.ad_ids.is_empty() {
        let set: HashSet<Uuid> = filters.ad_ids.iter().copied().collect();
        rows.retain(|r| set.contains(&r.ad_id));
    }
    if let Some(objective) = filters.objective.as_deref().filter(|o| !o.is_empty()) {
        rows.retain(|r| r.objective == objective);
    }

    rows
}

fn sum_totals(rows: &[DashboardRow]) -> DashboardTotals {
    rows.iter().fold(DashboardTotals::default(), |acc, r| {
        DashboardTotals {
            leads: acc.leads + r.leads,
            leads_gerais: acc.leads_gerais + r.leads_gerais,
            results: acc.results + r.results,
            conversations_started: acc.conversations_started + r.conversations_started,
            spend_brl: acc.spend_brl + r.spend_brl,
            link_clicks: acc.link_clicks + r.link_clicks,
            impressions: acc.impressions + r.impressions,
        }
    })
}

/// The window of identical length immediately preceding `[since, until]`.
fn previous_window(since: NaiveDate, until: NaiveDate) -> adboard_core::DateChunk {
    let days = (until - since).num_days() + 1;
    let prev_until = since - Duration::days(1);
    let prev_since = prev_until - Duration::days(days - 1);
    adboard_core::DateChunk {
        since: prev_since,
        until: prev_until,
    }
}

/// Percentage change with a defined zero-previous policy: undefined when
/// both are zero, a flat +100 marker when only the previous is.
fn percent_delta(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        if current == 0.0 {
            None
        } else {
            Some(100.0)
        }
    } else {
        Some((current - previous) / previous * 100.0)
    }
}

#[allow(clippy::cast_precision_loss)]
fn compute_deltas(current: &DashboardTotals, previous: &DashboardTotals) -> DashboardDeltas {
    DashboardDeltas {
        leads: percent_delta(current.leads as f64, previous.leads as f64),
        leads_gerais: percent_delta(current.leads_gerais as f64, previous.leads_gerais as f64),
        results: percent_delta(current.results as f64, previous.results as f64),
        conversations_started: percent_delta(
            current.conversations_started as f64,
            previous.conversations_started as f64,
        ),
        spend_brl: percent_delta(
            current.spend_brl.to_f64().unwrap_or(0.0),
            previous.spend_brl.to_f64().unwrap_or(0.0),
        ),
        link_clicks: percent_delta(current.link_clicks as f64, previous.link_clicks as f64),
        impressions: percent_delta(current.impressions as f64, previous.impressions as f64),
    }
}

/// Builds the trend series from the unfiltered row set: one point per
/// (day, campaign) metric row. Only the campaign filter applies here, so
/// ad-level drill-downs keep the campaign trend visible.
fn build_chart(
    metric_rows: &[DailyMetricRow],
    campaigns: &HashMap<Uuid, CampaignDim>,
    campaign_filter: &[Uuid],
) -> Vec<ChartPoint> {
    let filter: Option<HashSet<Uuid>> = if campaign_filter.is_empty() {
        None
    } else {
        Some(campaign_filter.iter().copied().collect())
    };

    metric_rows
        .iter()
        .filter(|r| filter.as_ref().is_none_or(|f| f.contains(&r.campaign_id)))
        .map(|r| ChartPoint {
            date: r.date,
            campaign_id: r.campaign_id,
            campaign_name: campaigns
                .get(&r.campaign_id)
                .map(|c| c.name.clone())
                .unwrap_or_default(),
            leads: r.leads,
            results: r.results.unwrap_or(0),
            conversations_started: r.conversations_started,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn metric_row(
        campaign_id: Uuid,
        ad_id: Uuid,
        day: NaiveDate,
        leads: i64,
        results: Option<i64>,
        conversations: i64,
    ) -> DailyMetricRow {
        DailyMetricRow {
            date: day,
            campaign_id,
            ad_id,
            impressions: 100,
            link_clicks: 10,
            spend_brl: Decimal::new(5_000, 2),
            leads,
            results,
            conversations_started: conversations,
        }
    }

    fn campaign_dim(id: Uuid, name: &str, objective: Option<&str>) -> CampaignDim {
        CampaignDim {
            id,
            name: name.to_string(),
            objective: objective.map(ToString::to_string),
        }
    }

    fn ad_dim(id: Uuid, name: &str, campaign_id: Uuid, ad_set_id: Option<Uuid>) -> AdDim {
        AdDim {
            id,
            name: name.to_string(),
            campaign_id,
            ad_set_id,
        }
    }

    struct Fixture {
        campaign_a: Uuid,
        campaign_b: Uuid,
        ad_a: Uuid,
        ad_b: Uuid,
        ad_set_a: Uuid,
        campaigns: HashMap<Uuid, CampaignDim>,
        ads: HashMap<Uuid, AdDim>,
    }

    impl Fixture {
        fn new() -> Self {
            let campaign_a = Uuid::new_v4();
            let campaign_b = Uuid::new_v4();
            let ad_a = Uuid::new_v4();
            let ad_b = Uuid::new_v4();
            let ad_set_a = Uuid::new_v4();

            let campaigns = HashMap::from([
                (
                    campaign_a,
                    campaign_dim(campaign_a, "Campaign A", Some("OUTCOME_LEADS")),
                ),
                (
                    campaign_b,
                    campaign_dim(campaign_b, "Campaign B", Some("OUTCOME_TRAFFIC")),
                ),
            ]);
            let ads = HashMap::from([
                (ad_a, ad_dim(ad_a, "Ad A", campaign_a, Some(ad_set_a))),
                (ad_b, ad_dim(ad_b, "Ad B", campaign_b, None)),
            ]);

            Self {
                campaign_a,
                campaign_b,
                ad_a,
                ad_b,
                ad_set_a,
                campaigns,
                ads,
            }
        }

        fn rows(&self) -> Vec<DashboardRow> {
            let metric_rows = vec![
                metric_row(self.campaign_a, self.ad_a, d(2025, 9, 14), 3, Some(0), 2),
                metric_row(self.campaign_b, self.ad_b, d(2025, 9, 14), 1, Some(7), 4),
            ];
            build_rows(&metric_rows, &self.campaigns, &self.ads, "Meta Ads", false)
        }

        fn ad_set_map(&self) -> HashMap<Uuid, Option<Uuid>> {
            self.ads
                .iter()
                .map(|(id, ad)| (*id, ad.ad_set_id))
                .collect()
        }
    }

    #[test]
    fn leads_gerais_falls_back_to_sum_when_results_zero() {
        assert_eq!(leads_gerais(Some(0), 3, 2), 5);
        assert_eq!(leads_gerais(None, 3, 2), 5);
    }

    #[test]
    fn leads_gerais_prefers_nonzero_results() {
        assert_eq!(leads_gerais(Some(7), 3, 2), 7);
        assert_eq!(leads_gerais(Some(7), 100, 100), 7);
    }

    #[test]
    fn build_rows_attaches_names_and_objective() {
        let fx = Fixture::new();
        let rows = fx.rows();

        let row_a = rows
            .iter()
            .find(|r| r.campaign_id == fx.campaign_a)
            .expect("row for campaign A");
        assert_eq!(row_a.campaign_name, "Campaign A");
        assert_eq!(row_a.ad_name, "Ad A");
        assert_eq!(row_a.objective, "OUTCOME_LEADS");
        assert_eq!(row_a.channel_name, "Meta Ads");
        assert_eq!(row_a.leads_gerais, 5, "results=0 falls back to 3+2");

        let row_b = rows
            .iter()
            .find(|r| r.campaign_id == fx.campaign_b)
            .expect("row for campaign B");
        assert_eq!(row_b.leads_gerais, 7, "nonzero results wins");
    }

    #[test]
    fn build_rows_tolerates_unknown_dimensions() {
        let metric_rows = vec![metric_row(
            Uuid::new_v4(),
            Uuid::new_v4(),
            d(2025, 9, 14),
            1,
            None,
            0,
        )];
        let rows = build_rows(&metric_rows, &HashMap::new(), &HashMap::new(), "", false);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].campaign_name, "");
        assert_eq!(rows[0].objective, "");
    }

    #[test]
    fn empty_filters_apply_no_restriction() {
        let fx = Fixture::new();
        let rows = apply_filters(fx.rows(), &DashboardFilters::default(), &fx.ad_set_map());
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn campaign_filter_keeps_only_matching_rows() {
        let fx = Fixture::new();
        let filters = DashboardFilters {
            campaign_ids: vec![fx.campaign_a],
            ..DashboardFilters::default()
        };
        let rows = apply_filters(fx.rows(), &filters, &fx.ad_set_map());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].campaign_id, fx.campaign_a);

        let totals = sum_totals(&rows);
        assert_eq!(totals.leads, 3, "total covers only campaign A");
        assert_eq!(totals.leads_gerais, 5);
    }

    #[test]
    fn cross_dimension_filters_intersect_to_zero() {
        // Campaign A combined with an ad that belongs to campaign B: AND
        // semantics must yield no rows, not the union.
        let fx = Fixture::new();
        let filters = DashboardFilters {
            campaign_ids: vec![fx.campaign_a],
            ad_ids: vec![fx.ad_b],
            ..DashboardFilters::default()
        };
        let rows = apply_filters(fx.rows(), &filters, &fx.ad_set_map());
        assert!(rows.is_empty());
        assert_eq!(sum_totals(&rows), DashboardTotals::default());
    }

    #[test]
    fn ad_set_filter_follows_ad_link() {
        let fx = Fixture::new();
        let filters = DashboardFilters {
            ad_set_ids: vec![fx.ad_set_a],
            ..DashboardFilters::default()
        };
        let rows = apply_filters(fx.rows(), &filters, &fx.ad_set_map());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ad_id, fx.ad_a);
    }

    #[test]
    fn objective_filter_matches_equality() {
        let fx = Fixture::new();
        let filters = DashboardFilters {
            objective: Some("OUTCOME_TRAFFIC".to_string()),
            ..DashboardFilters::default()
        };
        let rows = apply_filters(fx.rows(), &filters, &fx.ad_set_map());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].campaign_id, fx.campaign_b);
    }

    #[test]
    fn empty_objective_filter_is_no_restriction() {
        let fx = Fixture::new();
        let filters = DashboardFilters {
            objective: Some(String::new()),
            ..DashboardFilters::default()
        };
        let rows = apply_filters(fx.rows(), &filters, &fx.ad_set_map());
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn previous_window_is_equal_length_immediately_before() {
        let prev = previous_window(d(2025, 9, 8), d(2025, 9, 14));
        assert_eq!(prev.since, d(2025, 9, 1));
        assert_eq!(prev.until, d(2025, 9, 7));
    }

    #[test]
    fn previous_window_single_day() {
        let prev = previous_window(d(2025, 9, 14), d(2025, 9, 14));
        assert_eq!(prev.since, d(2025, 9, 13));
        assert_eq!(prev.until, d(2025, 9, 13));
    }

    #[test]
    fn percent_delta_doubles_to_plus_100() {
        assert_eq!(percent_delta(1000.0, 500.0), Some(100.0));
    }

    #[test]
    fn percent_delta_zero_previous_zero_current_is_undefined() {
        assert_eq!(percent_delta(0.0, 0.0), None);
    }

    #[test]
    fn percent_delta_zero_previous_nonzero_current_is_flat_marker() {
        assert_eq!(percent_delta(42.0, 0.0), Some(100.0));
    }

    #[test]
    fn percent_delta_never_yields_non_finite_values() {
        for (current, previous) in [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (7.5, 2.5)] {
            if let Some(delta) = percent_delta(current, previous) {
                assert!(delta.is_finite(), "delta for ({current}, {previous})");
            }
        }
    }

    #[test]
    fn chart_honors_campaign_filter_only() {
        let fx = Fixture::new();
        let metric_rows = vec![
            metric_row(fx.campaign_a, fx.ad_a, d(2025, 9, 13), 3, Some(0), 2),
            metric_row(fx.campaign_a, fx.ad_a, d(2025, 9, 14), 1, Some(0), 0),
            metric_row(fx.campaign_b, fx.ad_b, d(2025, 9, 14), 9, Some(9), 0),
        ];

        let all = build_chart(&metric_rows, &fx.campaigns, &[]);
        assert_eq!(all.len(), 3, "no filter keeps every point");

        let only_a = build_chart(&metric_rows, &fx.campaigns, &[fx.campaign_a]);
        assert_eq!(only_a.len(), 2);
        assert!(only_a.iter().all(|p| p.campaign_id == fx.campaign_a));
        assert_eq!(only_a[0].campaign_name, "Campaign A");
    }

    #[test]
    fn totals_sum_every_metric() {
        let fx = Fixture::new();
        let totals = sum_totals(&fx.rows());
        assert_eq!(totals.leads, 4);
        assert_eq!(totals.conversations_started, 6);
        assert_eq!(totals.leads_gerais, 12);
        assert_eq!(totals.results, 7);
        assert_eq!(totals.impressions, 200);
        assert_eq!(totals.link_clicks, 20);
        assert_eq!(totals.spend_brl, Decimal::new(10_000, 2));
    }

    #[test]
    fn deltas_cover_all_metrics_with_policy() {
        let current = DashboardTotals {
            leads: 10,
            leads_gerais: 10,
            results: 0,
            conversations_started: 0,
            spend_brl: Decimal::new(100_000, 2),
            link_clicks: 50,
            impressions: 2_000,
        };
        let previous = DashboardTotals {
            leads: 5,
            leads_gerais: 0,
            results: 0,
            conversations_started: 0,
            spend_brl: Decimal::new(50_000, 2),
            link_clicks: 100,
            impressions: 2_000,
        };
        let deltas = compute_deltas(&current, &previous);
        assert_eq!(deltas.leads, Some(100.0));
        assert_eq!(deltas.leads_gerais, Some(100.0), "zero previous, flat marker");
        assert_eq!(deltas.results, None, "both zero: undefined, not NaN");
        assert_eq!(deltas.spend_brl, Some(100.0));
        assert_eq!(deltas.link_clicks, Some(-50.0));
        assert_eq!(deltas.impressions, Some(0.0));
    }
}
