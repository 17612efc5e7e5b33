//! Booking model and commit request

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::timeutil;

use super::resource::BookingType;

/// Canonical booking as shown to the user. The list is always re-fetched
/// after a mutation, never patched locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub resource_id: i64,
    pub resource_name: String,
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Wall-clock range label; `None` for full-day bookings.
    pub slot_label: Option<String>,
    pub booking_type: BookingType,
    pub price_units: i64,
}

/// Booking record as the backend sends it
#[derive(Debug, Clone, Deserialize)]
pub struct RawBooking {
    pub id: i64,
    pub resource_id: i64,
    pub resource_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub booking_type: Option<String>,
    pub price_cents: Option<i64>,
}

impl RawBooking {
    pub fn normalize(self) -> Booking {
        let booking_type = match self.booking_type.as_deref() {
            Some("full-day") => BookingType::FullDay,
            _ => BookingType::TimeSlot,
        };
        let slot_label = match booking_type {
            BookingType::TimeSlot => {
                Some(timeutil::time_range_label(self.start_time, self.end_time))
            }
            BookingType::FullDay => None,
        };
        Booking {
            id: self.id,
            resource_id: self.resource_id,
            resource_name: self.resource_name,
            date: self.start_time.date_naive(),
            start_time: self.start_time,
            end_time: self.end_time,
            slot_label,
            booking_type,
            price_units: self
                .price_cents
                .map(|cents| (cents as f64 / 100.0).round() as i64)
                .unwrap_or(0),
        }
    }
}

/// Commit payload for create-booking
#[derive(Debug, Clone, Serialize)]
pub struct BookingRequest {
    pub resource_id: i64,
    pub subject_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_billable: bool,
}
