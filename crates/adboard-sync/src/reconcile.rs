//! Identifier reconciliation: external string ids to internal UUIDs.
//!
//! All reconciliation state lives in a [`SyncContext`] created for one sync
//! pass and dropped with it. Concurrent sync invocations therefore never
//! share caches; the store's unique constraints arbitrate between them.

use std::collections::{BTreeSet, HashMap, HashSet};

use sqlx::PgPool;
use uuid::Uuid;

use adboard_meta::{InsightRow, MetaCampaign};

use crate::error::SyncError;

/// Storage limit for ad and ad-set names.
const MAX_NAME_LEN: usize = 500;

/// Per-pass reconciliation cache.
///
/// Each distinct external id is upserted at most once per pass; later rows
/// reuse the cached internal id without another store round-trip.
#[derive(Debug, Default)]
pub(crate) struct SyncContext {
    channel_id: String,
    campaigns: HashMap<String, Uuid>,
    ad_sets: HashMap<String, Uuid>,
    ads: HashMap<String, Uuid>,
    seen_ads: HashSet<String>,
    missing_campaigns: BTreeSet<String>,
    dropped_rows: u64,
}

impl SyncContext {
    pub(crate) fn new(channel_id: &str) -> Self {
        Self {
            channel_id: channel_id.to_string(),
            ..Self::default()
        }
    }

    /// Upserts every listed campaign and records its internal id.
    pub(crate) async fn reconcile_campaigns(
        &mut self,
        pool: &PgPool,
        campaigns: &[MetaCampaign],
    ) -> Result<(), SyncError> {
        for campaign in campaigns {
            let id = adboard_db::upsert_campaign(
                pool,
                &self.channel_id,
                &campaign.id,
                &campaign.name,
                campaign.objective.as_deref(),
            )
            .await?;
            self.campaigns.insert(campaign.id.clone(), id);
        }
        Ok(())
    }

    /// Resolves one insight row to `(campaign_id, ad_id)` internal ids,
    /// lazily upserting the ad set and ad on first encounter in this pass.
    ///
    /// Returns `None` — and counts the row as dropped — when the row lacks
    /// identifiers or references a campaign absent from the listing.
    pub(crate) async fn resolve_row(
        &mut self,
        pool: &PgPool,
        row: &InsightRow,
    ) -> Result<Option<(Uuid, Uuid)>, SyncError> {
        let Some(campaign_external) = row.campaign_id.as_deref().filter(|s| !s.is_empty()) else {
            self.dropped_rows += 1;
            return Ok(None);
        };
        let Some(ad_external) = row.ad_id.as_deref().filter(|s| !s.is_empty()) else {
            self.dropped_rows += 1;
            return Ok(None);
        };

        let Some(&campaign_id) = self.campaigns.get(campaign_external) else {
            self.missing_campaigns.insert(campaign_external.to_string());
            self.dropped_rows += 1;
            return Ok(None);
        };

        let ad_set_id = self.resolve_ad_set(pool, campaign_id, row).await?;

        let ad_key = format!("{campaign_external}:{ad_external}");
        if !self.seen_ads.contains(&ad_key) {
            self.seen_ads.insert(ad_key.clone());
            let name = truncate_name(row.ad_name.as_deref().unwrap_or(ad_external));
            let id = adboard_db::upsert_ad(pool, campaign_id, ad_external, &name, ad_set_id).await?;
            self.ads.insert(ad_key.clone(), id);
        }

        match self.ads.get(&ad_key) {
            Some(&ad_id) => Ok(Some((campaign_id, ad_id))),
            None => {
                self.dropped_rows += 1;
                Ok(None)
            }
        }
    }

    /// Lazily upserts the row's ad set, if it carries one and the schema
    /// supports them. Keyed by `campaign-uuid:external-id` so equal external
    /// ids under different campaigns never collide.
    async fn resolve_ad_set(
        &mut self,
        pool: &PgPool,
        campaign_id: Uuid,
        row: &InsightRow,
    ) -> Result<Option<Uuid>, SyncError> {
        let Some(external) = row.adset_id.as_deref().filter(|s| !s.is_empty()) else {
            return Ok(None);
        };

        let key = format!("{campaign_id}:{external}");
        if let Some(&id) = self.ad_sets.get(&key) {
            return Ok(Some(id));
        }

        let name = truncate_name(row.adset_name.as_deref().unwrap_or(external));
        let upserted = adboard_db::upsert_ad_set(pool, campaign_id, external, &name).await?;
        if let Some(id) = upserted {
            self.ad_sets.insert(key, id);
        }
        Ok(upserted)
    }

    pub(crate) fn campaign_count(&self) -> usize {
        self.campaigns.len()
    }

    pub(crate) fn dropped_rows(&self) -> u64 {
        self.dropped_rows
    }

    /// Builds the total-mismatch diagnostic: sample insight-side campaign ids
    /// that resolved to nothing, and sample listing-side ids for comparison.
    pub(crate) fn reconciliation_gap(&self) -> SyncError {
        SyncError::ReconciliationGap {
            insight_samples: self.missing_campaigns.iter().take(5).cloned().collect(),
            known_samples: self.campaigns.keys().take(5).cloned().collect(),
            known_count: self.campaigns.len(),
        }
    }
}

/// Truncates a name to the storage limit without splitting a character.
fn truncate_name(name: &str) -> String {
    if name.chars().count() <= MAX_NAME_LEN {
        name.to_string()
    } else {
        name.chars().take(MAX_NAME_LEN).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_name_keeps_short_names_intact() {
        assert_eq!(truncate_name("Ad One"), "Ad One");
    }

    #[test]
    fn truncate_name_caps_at_limit() {
        let long = "x".repeat(700);
        assert_eq!(truncate_name(&long).chars().count(), MAX_NAME_LEN);
    }

    #[test]
    fn truncate_name_is_char_safe() {
        let long = "ç".repeat(600);
        let truncated = truncate_name(&long);
        assert_eq!(truncated.chars().count(), MAX_NAME_LEN);
        assert!(truncated.chars().all(|c| c == 'ç'));
    }

    #[test]
    fn gap_diagnostic_samples_at_most_five_ids() {
        let mut ctx = SyncContext::new("meta_ads");
        for i in 0..10 {
            ctx.missing_campaigns.insert(format!("ext-{i}"));
        }
        let err = ctx.reconciliation_gap();
        match err {
            SyncError::ReconciliationGap {
                insight_samples,
                known_samples,
                known_count,
            } => {
                assert_eq!(insight_samples.len(), 5);
                assert!(known_samples.is_empty());
                assert_eq!(known_count, 0);
            }
            other => panic!("expected ReconciliationGap, got: {other}"),
        }
    }
}
