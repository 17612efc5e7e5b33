//! Pure date-window and wall-clock formatting helpers

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Consecutive calendar days starting at `from`.
pub fn upcoming_days(from: NaiveDate, count: u32) -> Vec<NaiveDate> {
    (0..count as i64).map(|offset| from + Duration::days(offset)).collect()
}

/// Visible horizon for a resource: days from `today + min_advance` up to the
/// inclusive `max_advance` limit.
pub fn horizon(today: NaiveDate, min_advance: u32, max_advance: u32) -> Vec<NaiveDate> {
    let count = max_advance.saturating_sub(min_advance);
    upcoming_days(today + Duration::days(min_advance as i64), count)
}

/// The UTC half-open window `[00:00 of date, 00:00 of the next day)`.
pub fn day_window(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_hms_opt(0, 0, 0).expect("midnight is always valid").and_utc();
    (start, start + Duration::days(1))
}

/// Wall-clock range label, e.g. `"07:00-08:00"`. Doubles as the slot id:
/// unique within one date for one resource.
pub fn time_range_label(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!("{}-{}", start.format("%H:%M"), end.format("%H:%M"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_upcoming_days() {
        let days = upcoming_days(date("2026-03-06"), 3);
        assert_eq!(days, vec![date("2026-03-06"), date("2026-03-07"), date("2026-03-08")]);
        assert!(upcoming_days(date("2026-03-06"), 0).is_empty());
    }

    #[test]
    fn test_horizon_counts() {
        assert_eq!(horizon(date("2026-03-06"), 0, 14).len(), 14);
        assert_eq!(horizon(date("2026-03-06"), 0, 14)[0], date("2026-03-06"));

        let offset = horizon(date("2026-03-06"), 2, 14);
        assert_eq!(offset.len(), 12);
        assert_eq!(offset[0], date("2026-03-08"));

        // min beyond max collapses to an empty horizon
        assert!(horizon(date("2026-03-06"), 20, 14).is_empty());
    }

    #[test]
    fn test_day_window_is_utc_midnights() {
        let (start, end) = day_window(date("2026-03-06"));
        assert_eq!(start.to_rfc3339(), "2026-03-06T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-03-07T00:00:00+00:00");
    }

    #[test]
    fn test_time_range_label() {
        let (start, _) = day_window(date("2026-03-06"));
        let end = start + Duration::hours(1);
        assert_eq!(time_range_label(start + Duration::hours(7), end + Duration::hours(7)), "07:00-08:00");
    }
}
