use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by the sync orchestrators and the dashboard query.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The Meta adapter failed (network, non-2xx, bad payload).
    #[error(transparent)]
    Meta(#[from] adboard_meta::MetaError),

    /// The storage layer failed.
    #[error(transparent)]
    Db(#[from] adboard_db::DbError),

    /// The upstream access credential is expired or invalid. Fatal: the
    /// history backfill aborts remaining chunks when it sees this.
    #[error("Meta access token expired or invalid: {message}")]
    AccessTokenExpired { message: String },

    /// The ad account has not granted ads_read/ads_management to the
    /// integration. Fatal: the history backfill aborts remaining chunks.
    #[error("Meta ad account permission not granted: {message}")]
    AdAccountPermission { message: String },

    /// Insight rows and the campaign listing disagree completely: a
    /// non-empty fetch produced zero persistable rows. The two endpoints
    /// are returning inconsistent account scopes.
    #[error(
        "no insight row could be reconciled: insight campaign ids (e.g. {insight_samples:?}) \
         match none of the {known_count} listed campaigns (e.g. {known_samples:?}); \
         check that the campaign and insights endpoints see the same ad account"
    )]
    ReconciliationGap {
        insight_samples: Vec<String>,
        known_samples: Vec<String>,
        known_count: usize,
    },

    /// The requested window is empty or inverted.
    #[error("invalid date range: since {since} is after {until}")]
    InvalidRange { since: NaiveDate, until: NaiveDate },
}
