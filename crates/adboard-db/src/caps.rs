//! Process-wide schema capability probe.
//!
//! Some deployments run an older schema: `campaigns.objective`,
//! `ads.ad_set_id`, the `ad_sets` table, and `daily_metrics.results` arrived
//! in later migrations. Writes and reads that touch one of these probe it at
//! most once per process: on the first undefined-column/undefined-table
//! error the capability is cleared and the statement retried without it, and
//! every later call skips the doomed attempt entirely.

use std::sync::atomic::{AtomicBool, Ordering};

/// SQLSTATE for "undefined_column".
const UNDEFINED_COLUMN: &str = "42703";
/// SQLSTATE for "undefined_table".
const UNDEFINED_TABLE: &str = "42P01";

/// One flag per optional column/table. `true` means "assumed present".
#[derive(Debug)]
pub struct SchemaCaps {
    campaign_objective: AtomicBool,
    ad_set_table: AtomicBool,
    ad_set_link: AtomicBool,
    metric_results: AtomicBool,
}

impl SchemaCaps {
    const fn new() -> Self {
        Self {
            campaign_objective: AtomicBool::new(true),
            ad_set_table: AtomicBool::new(true),
            ad_set_link: AtomicBool::new(true),
            metric_results: AtomicBool::new(true),
        }
    }

    #[must_use]
    pub fn has_campaign_objective(&self) -> bool {
        self.campaign_objective.load(Ordering::Relaxed)
    }

    pub fn mark_campaign_objective_missing(&self) {
        self.campaign_objective.store(false, Ordering::Relaxed);
        tracing::warn!("campaigns.objective column missing; omitting it for this process");
    }

    #[must_use]
    pub fn has_ad_set_table(&self) -> bool {
        self.ad_set_table.load(Ordering::Relaxed)
    }

    pub fn mark_ad_set_table_missing(&self) {
        self.ad_set_table.store(false, Ordering::Relaxed);
        tracing::warn!("ad_sets table missing; skipping ad-set reconciliation for this process");
    }

    #[must_use]
    pub fn has_ad_set_link(&self) -> bool {
        self.ad_set_link.load(Ordering::Relaxed)
    }

    pub fn mark_ad_set_link_missing(&self) {
        self.ad_set_link.store(false, Ordering::Relaxed);
        tracing::warn!("ads.ad_set_id column missing; omitting it for this process");
    }

    #[must_use]
    pub fn has_metric_results(&self) -> bool {
        self.metric_results.load(Ordering::Relaxed)
    }

    pub fn mark_metric_results_missing(&self) {
        self.metric_results.store(false, Ordering::Relaxed);
        tracing::warn!("daily_metrics.results column missing; omitting it for this process");
    }

    /// Restore the everything-present assumption. Test-only: the probe is
    /// deliberately sticky for the process lifetime in production.
    pub fn reset(&self) {
        self.campaign_objective.store(true, Ordering::Relaxed);
        self.ad_set_table.store(true, Ordering::Relaxed);
        self.ad_set_link.store(true, Ordering::Relaxed);
        self.metric_results.store(true, Ordering::Relaxed);
    }
}

static CAPS: SchemaCaps = SchemaCaps::new();

/// The process-wide capability flags.
#[must_use]
pub fn schema_caps() -> &'static SchemaCaps {
    &CAPS
}

/// True when the error is Postgres "undefined_column" (SQLSTATE 42703).
#[must_use]
pub fn is_undefined_column(err: &sqlx::Error) -> bool {
    database_code(err).is_some_and(|code| code == UNDEFINED_COLUMN)
}

/// True when the error is Postgres "undefined_table" (SQLSTATE 42P01).
#[must_use]
pub fn is_undefined_table(err: &sqlx::Error) -> bool {
    database_code(err).is_some_and(|code| code == UNDEFINED_TABLE)
}

fn database_code(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) => db.code().map(|c| c.into_owned()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caps_start_with_everything_present() {
        let caps = SchemaCaps::new();
        assert!(caps.has_campaign_objective());
        assert!(caps.has_ad_set_table());
        assert!(caps.has_ad_set_link());
        assert!(caps.has_metric_results());
    }

    #[test]
    fn marking_missing_is_sticky_until_reset() {
        let caps = SchemaCaps::new();
        caps.mark_campaign_objective_missing();
        caps.mark_metric_results_missing();
        assert!(!caps.has_campaign_objective());
        assert!(!caps.has_metric_results());
        assert!(caps.has_ad_set_table(), "unrelated caps are untouched");

        caps.reset();
        assert!(caps.has_campaign_objective());
        assert!(caps.has_metric_results());
    }

    #[test]
    fn non_database_errors_are_not_classified() {
        let err = sqlx::Error::RowNotFound;
        assert!(!is_undefined_column(&err));
        assert!(!is_undefined_table(&err));
    }
}
