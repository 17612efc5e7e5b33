//! Bookable resource model

use serde::{Deserialize, Serialize};

/// How a resource is reserved: in fixed intervals per day, or one whole day
/// at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingType {
    TimeSlot,
    FullDay,
}

/// Canonical resource as used by the workflow. Immutable once fetched within
/// a session; replaced wholesale on reload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: i64,
    pub name: String,
    pub booking_type: BookingType,
    /// Inclusive booking horizon in days from today.
    pub max_advance_days: u32,
    /// Earliest bookable day offset from today.
    pub min_advance_days: u32,
    /// Display amount in whole currency units.
    pub price_units: i64,
    pub is_billable: bool,
}

/// Resource record as the backend sends it
#[derive(Debug, Clone, Deserialize)]
pub struct RawResource {
    pub id: i64,
    pub name: String,
    pub booking_type: Option<String>,
    pub max_future_days: Option<u32>,
    pub min_future_days: Option<u32>,
    pub price_cents: Option<i64>,
    pub is_billable: Option<bool>,
}

impl RawResource {
    pub fn normalize(self, default_horizon: u32) -> Resource {
        let booking_type = match self.booking_type.as_deref() {
            Some("full-day") => BookingType::FullDay,
            _ => BookingType::TimeSlot,
        };
        Resource {
            id: self.id,
            name: self.name,
            booking_type,
            max_advance_days: self.max_future_days.unwrap_or(default_horizon),
            min_advance_days: self.min_future_days.unwrap_or(0),
            price_units: self
                .price_cents
                .map(|cents| (cents as f64 / 100.0).round() as i64)
                .unwrap_or(0),
            is_billable: self.is_billable.unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_defaults() {
        let raw = RawResource {
            id: 1,
            name: "Laundry room 1".to_string(),
            booking_type: None,
            max_future_days: None,
            min_future_days: None,
            price_cents: None,
            is_billable: None,
        };
        let resource = raw.normalize(30);
        assert_eq!(resource.booking_type, BookingType::TimeSlot);
        assert_eq!(resource.max_advance_days, 30);
        assert_eq!(resource.min_advance_days, 0);
        assert_eq!(resource.price_units, 0);
        assert!(!resource.is_billable);
    }

    #[test]
    fn test_normalize_full_day_with_price() {
        let raw = RawResource {
            id: 3,
            name: "Guest apartment".to_string(),
            booking_type: Some("full-day".to_string()),
            max_future_days: Some(90),
            min_future_days: Some(1),
            price_cents: Some(25_000),
            is_billable: Some(true),
        };
        let resource = raw.normalize(30);
        assert_eq!(resource.booking_type, BookingType::FullDay);
        assert_eq!(resource.max_advance_days, 90);
        assert_eq!(resource.min_advance_days, 1);
        assert_eq!(resource.price_units, 250);
        assert!(resource.is_billable);
    }

    #[test]
    fn test_normalize_rounds_cents() {
        let raw = RawResource {
            id: 2,
            name: "Sauna".to_string(),
            booking_type: Some("time-slot".to_string()),
            max_future_days: Some(14),
            min_future_days: None,
            price_cents: Some(2_050),
            is_billable: Some(true),
        };
        assert_eq!(raw.normalize(30).price_units, 21);
    }
}
