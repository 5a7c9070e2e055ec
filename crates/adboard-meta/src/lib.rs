//! Client for the Meta (Facebook) Marketing API.
//!
//! Wraps the Graph API endpoints this system consumes — paginated campaign
//! listing and per-day, per-ad insight rows — plus the action-list parsers
//! that turn Meta's string-typed metric fields into numbers.

mod actions;
mod client;
mod error;
mod retry;
mod types;

pub use actions::{
    parse_conversations_started, parse_count, parse_lead_count, parse_results_count, parse_spend,
};
pub use client::{MetaClient, MetaConfig};
pub use error::MetaError;
pub use types::{ActionEntry, InsightRow, MetaCampaign};
