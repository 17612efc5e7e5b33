//! Deterministic in-memory backend
//!
//! Stands in for the real backend when `backend.use_in_memory` is set and
//! backs the integration tests. Enforces the same overlap rule as the real
//! backend so commit-time conflicts are observable without a network.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{BookingRequest, RawBooking, RawResource, RawSlot},
    services::conflict::{conflicts, Reservation},
    timeutil,
};

use super::BookingApi;

const SLOT_START_HOUR: i64 = 6;
const SLOT_END_HOUR: i64 = 22;

struct StoredBooking {
    id: i64,
    reservation: Reservation,
}

struct Fixture {
    id: i64,
    name: &'static str,
    booking_type: &'static str,
    max_future_days: u32,
    price_cents: i64,
    is_billable: bool,
}

const FIXTURES: &[Fixture] = &[
    Fixture {
        id: 1,
        name: "Laundry room 1",
        booking_type: "time-slot",
        max_future_days: 14,
        price_cents: 0,
        is_billable: false,
    },
    Fixture {
        id: 2,
        name: "Laundry room 2",
        booking_type: "full-day",
        max_future_days: 30,
        price_cents: 0,
        is_billable: false,
    },
    Fixture {
        id: 3,
        name: "Guest apartment",
        booking_type: "full-day",
        max_future_days: 90,
        price_cents: 25_000,
        is_billable: true,
    },
];

struct MockState {
    bookings: Vec<StoredBooking>,
    next_id: i64,
    secrets: HashMap<String, String>,
    active_subject: Option<String>,
}

pub struct InMemoryApiClient {
    state: Mutex<MockState>,
    tags: HashMap<String, String>,
}

impl Default for InMemoryApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryApiClient {
    pub fn new() -> Self {
        let mut tags = HashMap::new();
        tags.insert("UID123".to_string(), "1001".to_string());

        let mut secrets = HashMap::new();
        secrets.insert("1001".to_string(), "1234".to_string());
        secrets.insert("1002".to_string(), String::new());

        Self {
            state: Mutex::new(MockState {
                bookings: Vec::new(),
                next_id: 1,
                secrets,
                active_subject: None,
            }),
            tags,
        }
    }

    fn fixture(resource_id: i64) -> Option<&'static Fixture> {
        FIXTURES.iter().find(|f| f.id == resource_id)
    }

    fn slot_windows(
        fixture: &Fixture,
        date: NaiveDate,
    ) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        let (day_start, day_end) = timeutil::day_window(date);
        if fixture.booking_type == "full-day" {
            return vec![(day_start, day_end)];
        }
        (SLOT_START_HOUR..SLOT_END_HOUR)
            .map(|hour| {
                let start = day_start + Duration::hours(hour);
                (start, start + Duration::hours(1))
            })
            .collect()
    }
}

#[async_trait]
impl BookingApi for InMemoryApiClient {
    async fn login_with_tag(&self, uid: &str) -> AppResult<String> {
        let subject = self
            .tags
            .get(uid)
            .cloned()
            .ok_or_else(|| AppError::Authentication("unknown tag".to_string()))?;
        let mut state = self.state.lock().expect("mock state poisoned");
        state.active_subject = Some(subject.clone());
        Ok(subject)
    }

    async fn login_with_credentials(&self, subject_id: &str, secret: &str) -> AppResult<String> {
        let mut state = self.state.lock().expect("mock state poisoned");
        match state.secrets.get(subject_id) {
            Some(stored) if stored == secret => {
                state.active_subject = Some(subject_id.to_string());
                Ok(subject_id.to_string())
            }
            _ => Err(AppError::Authentication("invalid credentials".to_string())),
        }
    }

    async fn change_secret(&self, new_secret: &str) -> AppResult<()> {
        let mut state = self.state.lock().expect("mock state poisoned");
        let subject = state
            .active_subject
            .clone()
            .ok_or(AppError::AuthorizationExpired)?;
        state.secrets.insert(subject, new_secret.to_string());
        Ok(())
    }

    async fn resources(&self) -> AppResult<Vec<RawResource>> {
        Ok(FIXTURES
            .iter()
            .map(|f| RawResource {
                id: f.id,
                name: f.name.to_string(),
                booking_type: Some(f.booking_type.to_string()),
                max_future_days: Some(f.max_future_days),
                min_future_days: None,
                price_cents: Some(f.price_cents),
                is_billable: Some(f.is_billable),
            })
            .collect())
    }

    async fn bookings(&self, subject_id: &str) -> AppResult<Vec<RawBooking>> {
        let state = self.state.lock().expect("mock state poisoned");
        Ok(state
            .bookings
            .iter()
            .filter(|b| b.reservation.subject_id == subject_id)
            .map(|b| {
                let fixture = Self::fixture(b.reservation.resource_id);
                RawBooking {
                    id: b.id,
                    resource_id: b.reservation.resource_id,
                    resource_name: fixture.map(|f| f.name).unwrap_or("").to_string(),
                    start_time: b.reservation.start,
                    end_time: b.reservation.end,
                    booking_type: fixture.map(|f| f.booking_type.to_string()),
                    price_cents: fixture.map(|f| f.price_cents),
                }
            })
            .collect())
    }

    async fn availability(&self, resource_id: i64, date: NaiveDate) -> AppResult<Vec<RawSlot>> {
        let fixture = Self::fixture(resource_id)
            .ok_or_else(|| AppError::NotFound(format!("resource {}", resource_id)))?;
        let now = Utc::now();
        let state = self.state.lock().expect("mock state poisoned");
        Ok(Self::slot_windows(fixture, date)
            .into_iter()
            .map(|(start, end)| {
                let booked = state.bookings.iter().any(|b| {
                    b.reservation.resource_id == resource_id
                        && b.reservation.start < end
                        && b.reservation.end > start
                });
                RawSlot {
                    start_time: start,
                    end_time: end,
                    is_booked: booked,
                    is_past: Some(end <= now),
                }
            })
            .collect())
    }

    async fn create_booking(&self, request: &BookingRequest) -> AppResult<i64> {
        if request.end_time <= request.start_time {
            return Err(AppError::Validation("empty booking window".to_string()));
        }
        let mut state = self.state.lock().expect("mock state poisoned");
        if conflicts(
            state.bookings.iter().map(|b| &b.reservation),
            request.resource_id,
            &request.subject_id,
            request.start_time,
            request.end_time,
        ) {
            return Err(AppError::Conflict("overlap".to_string()));
        }
        let id = state.next_id;
        state.next_id += 1;
        state.bookings.push(StoredBooking {
            id,
            reservation: Reservation {
                resource_id: request.resource_id,
                subject_id: request.subject_id.clone(),
                start: request.start_time,
                end: request.end_time,
            },
        });
        Ok(id)
    }

    async fn cancel_booking(&self, booking_id: i64) -> AppResult<()> {
        let mut state = self.state.lock().expect("mock state poisoned");
        let before = state.bookings.len();
        state.bookings.retain(|b| b.id != booking_id);
        if state.bookings.len() == before {
            return Err(AppError::NotFound(format!("booking {}", booking_id)));
        }
        Ok(())
    }

    async fn health(&self) -> AppResult<()> {
        Ok(())
    }
}
