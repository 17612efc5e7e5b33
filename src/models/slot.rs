//! Availability slot model
//!
//! Slots are derived, never persisted: regenerated on every availability
//! fetch and never mutated in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timeutil;

/// One bookable interval of a resource on one date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    /// Wall-clock range label, unique within a date for a given resource.
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_booked: bool,
    pub is_past: bool,
}

/// Slot record as the backend sends it
#[derive(Debug, Clone, Deserialize)]
pub struct RawSlot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub is_booked: bool,
    /// Older backends omit this and fold "past" into `is_booked`.
    pub is_past: Option<bool>,
}

impl RawSlot {
    pub fn normalize(self, now: DateTime<Utc>) -> Slot {
        Slot {
            id: timeutil::time_range_label(self.start_time, self.end_time),
            start_time: self.start_time,
            end_time: self.end_time,
            is_booked: self.is_booked,
            is_past: self.is_past.unwrap_or(self.end_time <= now),
        }
    }
}

impl Slot {
    /// A slot can be taken iff it is neither booked nor already over.
    pub fn is_bookable(&self) -> bool {
        !self.is_booked && !self.is_past
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_normalize_label_and_past_fallback() {
        let start = Utc.with_ymd_and_hms(2026, 3, 6, 7, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 6, 8, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 6, 9, 0, 0).unwrap();

        let slot = RawSlot { start_time: start, end_time: end, is_booked: false, is_past: None }
            .normalize(now);
        assert_eq!(slot.id, "07:00-08:00");
        assert!(slot.is_past);
        assert!(!slot.is_bookable());
    }

    #[test]
    fn test_explicit_past_flag_wins() {
        let start = Utc.with_ymd_and_hms(2026, 3, 6, 7, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 6, 8, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 6, 9, 0, 0).unwrap();

        let slot = RawSlot {
            start_time: start,
            end_time: end,
            is_booked: false,
            is_past: Some(false),
        }
        .normalize(now);
        assert!(!slot.is_past);
        assert!(slot.is_bookable());
    }
}
