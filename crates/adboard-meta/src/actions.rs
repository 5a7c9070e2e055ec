//! Parsers for Meta's string-typed metric fields and action lists.
//!
//! All of these are total functions: absent, empty, or malformed input
//! yields zero. A sync must never abort because one upstream field is junk.

use rust_decimal::Decimal;

use crate::types::ActionEntry;

/// Conversation-started action types, one per attribution window.
const CONVERSATION_ACTION_TYPES: [&str; 3] = [
    "onsite_conversion.messaging_conversation_started_7d",
    "onsite_conversion.messaging_conversation_started_1d",
    "offsite_conversion.messaging_conversation_started_7d",
];

/// Parse an integer count field such as `impressions` or `clicks`.
///
/// Returns 0 for absent, empty, or non-numeric input. Fractional values are
/// truncated toward zero, matching how the upstream API rounds counts.
#[must_use]
pub fn parse_count(raw: Option<&str>) -> i64 {
    let Some(s) = raw else { return 0 };
    let s = s.trim();
    if s.is_empty() {
        return 0;
    }
    if let Ok(n) = s.parse::<i64>() {
        return n;
    }
    #[allow(clippy::cast_possible_truncation)]
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map_or(0, |f| f as i64)
}

/// Parse a monetary field such as `spend` into a `Decimal`.
///
/// Returns zero for absent, empty, or non-numeric input.
#[must_use]
pub fn parse_spend(raw: Option<&str>) -> Decimal {
    raw.and_then(|s| s.trim().parse::<Decimal>().ok())
        .unwrap_or_default()
}

/// Count of `lead` actions. Exact action-type match only.
#[must_use]
pub fn parse_lead_count(actions: Option<&[ActionEntry]>) -> i64 {
    let Some(actions) = actions else { return 0 };
    actions
        .iter()
        .find(|a| a.action_type == "lead")
        .map_or(0, |a| parse_count(Some(&a.value)))
}

/// Sum of messaging-conversation-started actions across all attribution
/// windows Meta reports them under.
#[must_use]
pub fn parse_conversations_started(actions: Option<&[ActionEntry]>) -> i64 {
    let Some(actions) = actions else { return 0 };
    let mut total = 0;
    for action in actions {
        let ty = action.action_type.to_lowercase();
        if ty.contains("messaging_conversation_started")
            || ty.contains("conversation_started")
            || CONVERSATION_ACTION_TYPES.contains(&ty.as_str())
        {
            total += parse_count(Some(&action.value));
        }
    }
    total
}

/// The campaign objective's primary metric: leads plus conversations started.
///
/// The API exposes no first-class "results" action type today; this sum is
/// the composite the reporting UI treats as "Resultados".
#[must_use]
pub fn parse_results_count(actions: Option<&[ActionEntry]>) -> i64 {
    parse_lead_count(actions) + parse_conversations_started(actions)
}
