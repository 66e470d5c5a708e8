// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.
//!
//! All timestamps persisted to Firestore go through [`format_utc_rfc3339`]
//! so they share one precision and suffix. That keeps lexicographic string
//! comparison equal to chronological comparison, which the session and OTP
//! expiry range filters rely on.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// The current instant, formatted for storage.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// Parse a stored timestamp. Returns `None` for anything unparseable;
/// expiry checks treat that as already expired.
pub fn parse_utc_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formatted_order_matches_chronological_order() {
        let earlier = Utc.with_ymd_and_hms(2025, 3, 9, 23, 59, 59).unwrap();
        let later = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 1).unwrap();
        assert!(format_utc_rfc3339(earlier) < format_utc_rfc3339(later));
    }

    #[test]
    fn parse_round_trip() {
        let now = Utc::now();
        let parsed = parse_utc_rfc3339(&format_utc_rfc3339(now)).unwrap();
        assert_eq!(parsed.timestamp(), now.timestamp());
        assert!(parse_utc_rfc3339("not a timestamp").is_none());
    }
}
