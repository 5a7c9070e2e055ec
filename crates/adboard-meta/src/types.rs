use serde::Deserialize;

/// One `{action_type, value}` pair from an insight row's `actions` list.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionEntry {
    #[serde(default)]
    pub action_type: String,
    #[serde(default)]
    pub value: String,
}

/// One ad-level insight record: performance numbers for one ad on one day.
///
/// Every numeric field arrives as a string (or is absent entirely); use the
/// parsers in [`crate::actions`] rather than deserializing into numbers, so
/// malformed upstream data degrades to zero instead of aborting a sync.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InsightRow {
    pub date_start: Option<String>,
    pub impressions: Option<String>,
    pub clicks: Option<String>,
    pub spend: Option<String>,
    pub actions: Option<Vec<ActionEntry>>,
    pub campaign_id: Option<String>,
    pub campaign_name: Option<String>,
    pub ad_id: Option<String>,
    pub ad_name: Option<String>,
    pub adset_id: Option<String>,
    pub adset_name: Option<String>,
}

/// A campaign as returned by the campaign-listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MetaCampaign {
    pub id: String,
    pub name: String,
    pub objective: Option<String>,
}

/// Generic Graph API page envelope: `{ data: [...], paging: { next } }`.
#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    pub paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Paging {
    pub next: Option<String>,
}
