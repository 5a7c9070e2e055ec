//! Normalization of raw insight rows into metric records.

use chrono::NaiveDate;
use uuid::Uuid;

use adboard_db::NewDailyMetric;
use adboard_meta::{
    parse_conversations_started, parse_count, parse_lead_count, parse_results_count, parse_spend,
    InsightRow,
};

/// Converts one resolved insight row into a persistable metric record.
///
/// `fallback_date` covers rows whose `date_start` is absent or malformed;
/// for a range sync that is the window's `since`, matching how the source
/// anchors undated rows.
pub(crate) fn normalize_row(
    campaign_id: Uuid,
    ad_id: Uuid,
    row: &InsightRow,
    fallback_date: NaiveDate,
) -> NewDailyMetric {
    let date = row
        .date_start
        .as_deref()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .unwrap_or(fallback_date);

    NewDailyMetric {
        campaign_id,
        ad_id,
        date,
        impressions: parse_count(row.impressions.as_deref()),
        link_clicks: parse_count(row.clicks.as_deref()),
        spend_brl: parse_spend(row.spend.as_deref()),
        leads: parse_lead_count(row.actions.as_deref()),
        results: parse_results_count(row.actions.as_deref()),
        conversations_started: parse_conversations_started(row.actions.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adboard_meta::ActionEntry;
    use rust_decimal::Decimal;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn normalize_row_parses_all_fields() {
        let row = InsightRow {
            date_start: Some("2025-09-14".to_string()),
            impressions: Some("1500".to_string()),
            clicks: Some("42".to_string()),
            spend: Some("123.45".to_string()),
            actions: Some(vec![
                ActionEntry {
                    action_type: "lead".to_string(),
                    value: "3".to_string(),
                },
                ActionEntry {
                    action_type: "onsite_conversion.messaging_conversation_started_7d".to_string(),
                    value: "2".to_string(),
                },
            ]),
            ..InsightRow::default()
        };

        let campaign = Uuid::new_v4();
        let ad = Uuid::new_v4();
        let metric = normalize_row(campaign, ad, &row, d(2025, 9, 1));

        assert_eq!(metric.date, d(2025, 9, 14));
        assert_eq!(metric.impressions, 1500);
        assert_eq!(metric.link_clicks, 42);
        assert_eq!(metric.spend_brl, Decimal::new(12_345, 2));
        assert_eq!(metric.leads, 3);
        assert_eq!(metric.conversations_started, 2);
        assert_eq!(metric.results, 5, "results = leads + conversations");
    }

    #[test]
    fn normalize_row_defaults_malformed_fields_to_zero() {
        let row = InsightRow {
            date_start: Some("not-a-date".to_string()),
            impressions: Some("abc".to_string()),
            ..InsightRow::default()
        };

        let metric = normalize_row(Uuid::new_v4(), Uuid::new_v4(), &row, d(2025, 9, 1));
        assert_eq!(metric.date, d(2025, 9, 1), "bad date falls back to since");
        assert_eq!(metric.impressions, 0);
        assert_eq!(metric.spend_brl, Decimal::ZERO);
        assert_eq!(metric.results, 0);
    }
}
