//! Sync orchestration and dashboard aggregation for ad-performance data.
//!
//! This crate owns the pipeline between the Meta adapter and the store:
//! reconciling external identifiers to internal ones, normalizing raw
//! insight rows into metric records, orchestrating single-day, range and
//! history syncs, and assembling the dashboard's aggregated view.

mod dashboard;
mod day;
mod error;
mod fatal;
mod history;
mod normalize;
mod range;
mod reconcile;

pub use dashboard::{
    load_dashboard, ChartPoint, DashboardData, DashboardDeltas, DashboardFilters, DashboardRow,
    DashboardTotals, DateScope,
};
pub use day::{sync_day, DaySyncReport};
pub use error::SyncError;
pub use fatal::{classify_fatal, FatalKind};
pub use history::{run_history_sync, ChunkOutcome, HistoryReport, HistorySyncOptions};
pub use range::{sync_range, RangeSyncReport};
