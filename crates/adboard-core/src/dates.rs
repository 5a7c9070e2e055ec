//! Business-date helpers.
//!
//! All automated syncs operate on "yesterday" in the fixed business timezone
//! (America/Sao_Paulo), not UTC. Around midnight the two disagree by a full
//! day, which is exactly when the daily sync runs.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::America::Sao_Paulo;

/// An inclusive `[since, until]` date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateChunk {
    pub since: NaiveDate,
    pub until: NaiveDate,
}

/// Yesterday's calendar date in the business timezone.
#[must_use]
pub fn yesterday_local() -> NaiveDate {
    yesterday_from(Utc::now())
}

/// Yesterday's calendar date in the business timezone, relative to `now`.
///
/// Split out from [`yesterday_local`] so tests can pin the clock.
#[must_use]
pub fn yesterday_from(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&Sao_Paulo).date_naive() - Duration::days(1)
}

/// Parse a `YYYY-MM-DD` query parameter, returning `None` for absent or
/// malformed input so callers can fall back to [`yesterday_local`].
#[must_use]
pub fn parse_date_param(raw: Option<&str>) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw?, "%Y-%m-%d").ok()
}

/// Partition an inclusive `[since, until]` window into calendar-month chunks.
///
/// The first chunk starts at `since` and ends at the last day of its month
/// (or `until`, whichever comes first); every following chunk covers one
/// whole month until the final chunk ends at `until`. Returns an empty list
/// when `since > until`.
#[must_use]
pub fn monthly_chunks(since: NaiveDate, until: NaiveDate) -> Vec<DateChunk> {
    let mut chunks = Vec::new();
    let mut cursor = since;
    while cursor <= until {
        let chunk_until = last_day_of_month(cursor).min(until);
        chunks.push(DateChunk {
            since: cursor,
            until: chunk_until,
        });
        cursor = chunk_until + Duration::days(1);
    }
    chunks
}

fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (next_year, next_month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    // First of the month always exists, so the constructor cannot fail.
    NaiveDate::from_ymd_opt(next_year, next_month, 1).expect("first of month") - Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn monthly_chunks_splits_on_calendar_month_boundaries() {
        let chunks = monthly_chunks(d(2025, 8, 15), d(2025, 10, 3));
        assert_eq!(
            chunks,
            vec![
                DateChunk {
                    since: d(2025, 8, 15),
                    until: d(2025, 8, 31)
                },
                DateChunk {
                    since: d(2025, 9, 1),
                    until: d(2025, 9, 30)
                },
                DateChunk {
                    since: d(2025, 10, 1),
                    until: d(2025, 10, 3)
                },
            ]
        );
    }

    #[test]
    fn monthly_chunks_single_month_window_is_one_chunk() {
        let chunks = monthly_chunks(d(2025, 9, 3), d(2025, 9, 20));
        assert_eq!(
            chunks,
            vec![DateChunk {
                since: d(2025, 9, 3),
                until: d(2025, 9, 20)
            }]
        );
    }

    #[test]
    fn monthly_chunks_single_day_window() {
        let chunks = monthly_chunks(d(2025, 2, 28), d(2025, 2, 28));
        assert_eq!(
            chunks,
            vec![DateChunk {
                since: d(2025, 2, 28),
                until: d(2025, 2, 28)
            }]
        );
    }

    #[test]
    fn monthly_chunks_crosses_year_boundary() {
        let chunks = monthly_chunks(d(2024, 12, 20), d(2025, 1, 10));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].until, d(2024, 12, 31));
        assert_eq!(chunks[1].since, d(2025, 1, 1));
        assert_eq!(chunks[1].until, d(2025, 1, 10));
    }

    #[test]
    fn monthly_chunks_empty_when_since_after_until() {
        assert!(monthly_chunks(d(2025, 10, 4), d(2025, 10, 3)).is_empty());
    }

    #[test]
    fn yesterday_uses_business_timezone_not_utc() {
        // 01:30 UTC on 2025-09-15 is still 22:30 on 2025-09-14 in Sao Paulo
        // (UTC-3), so local "yesterday" is the 13th — UTC would say the 14th.
        let now = Utc.with_ymd_and_hms(2025, 9, 15, 1, 30, 0).unwrap();
        assert_eq!(yesterday_from(now), d(2025, 9, 13));
    }

    #[test]
    fn yesterday_matches_utc_during_daytime() {
        let now = Utc.with_ymd_and_hms(2025, 9, 15, 15, 0, 0).unwrap();
        assert_eq!(yesterday_from(now), d(2025, 9, 14));
    }

    #[test]
    fn parse_date_param_accepts_iso_dates() {
        assert_eq!(parse_date_param(Some("2025-09-14")), Some(d(2025, 9, 14)));
    }

    #[test]
    fn parse_date_param_rejects_malformed_input() {
        assert_eq!(parse_date_param(Some("14/09/2025")), None);
        assert_eq!(parse_date_param(Some("2025-13-40")), None);
        assert_eq!(parse_date_param(Some("")), None);
        assert_eq!(parse_date_param(None), None);
    }
}
