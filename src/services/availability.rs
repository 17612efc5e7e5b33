//! Availability synchronization
//!
//! Fetches per-date availability for the selected resource and publishes it
//! atomically. Every refresh allocates a monotonically increasing request
//! token; a response is published only while its token is still the latest
//! and the resource selection has not changed, so the published snapshot can
//! never revert to an older one. In-flight I/O is never aborted, only its
//! result is dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, Utc};
use futures::future::join_all;

use crate::{
    api::BookingApi,
    error::AppResult,
    models::{BookingType, Resource, Slot},
};

#[derive(Default)]
struct SyncState {
    token: u64,
    loading: bool,
    resource_id: Option<i64>,
    slots_by_date: HashMap<NaiveDate, Vec<Slot>>,
    day_free: HashMap<NaiveDate, bool>,
}

pub struct AvailabilitySync {
    api: Arc<dyn BookingApi>,
    state: Mutex<SyncState>,
}

impl AvailabilitySync {
    pub fn new(api: Arc<dyn BookingApi>) -> Self {
        Self {
            api,
            state: Mutex::new(SyncState::default()),
        }
    }

    /// Fetch availability for `dates` and publish the result wholesale.
    ///
    /// Stale results (superseded token or changed resource) are dropped
    /// silently. A fetch error publishes nothing; the maps stay cleared
    /// rather than holding a partial snapshot.
    pub async fn refresh(&self, resource: &Resource, dates: &[NaiveDate]) -> AppResult<()> {
        let token = {
            let mut state = self.state.lock().expect("availability state poisoned");
            state.token += 1;
            state.loading = true;
            state.resource_id = Some(resource.id);
            state.slots_by_date.clear();
            state.day_free.clear();
            state.token
        };

        let fetches = dates.iter().map(|&date| {
            let api = Arc::clone(&self.api);
            let resource_id = resource.id;
            async move { (date, api.availability(resource_id, date).await) }
        });
        let results = join_all(fetches).await;

        let now = Utc::now();
        let mut slots_by_date = HashMap::new();
        let mut day_free = HashMap::new();
        let mut failure = None;
        for (date, result) in results {
            match result {
                Ok(raw) => {
                    let slots: Vec<Slot> =
                        raw.into_iter().map(|slot| slot.normalize(now)).collect();
                    match resource.booking_type {
                        BookingType::TimeSlot => {
                            slots_by_date.insert(date, slots);
                        }
                        BookingType::FullDay => {
                            // A date is bookable iff the synthetic full-day
                            // slot exists, is not booked and is not past.
                            let free = slots.first().map(Slot::is_bookable).unwrap_or(false);
                            day_free.insert(date, free);
                        }
                    }
                }
                Err(error) => failure = Some(error),
            }
        }

        let mut state = self.state.lock().expect("availability state poisoned");
        if state.token != token || state.resource_id != Some(resource.id) {
            tracing::debug!(token, resource = resource.id, "dropping stale availability result");
            return Ok(());
        }
        state.loading = false;
        match failure {
            Some(error) => Err(error),
            None => {
                state.slots_by_date = slots_by_date;
                state.day_free = day_free;
                Ok(())
            }
        }
    }

    /// Advance the token and clear the published snapshot. Invalidates all
    /// in-flight responses without touching the underlying I/O.
    pub fn invalidate(&self) {
        let mut state = self.state.lock().expect("availability state poisoned");
        state.token += 1;
        state.loading = false;
        state.resource_id = None;
        state.slots_by_date.clear();
        state.day_free.clear();
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().expect("availability state poisoned").loading
    }

    pub fn slots_for(&self, date: NaiveDate) -> Vec<Slot> {
        let state = self.state.lock().expect("availability state poisoned");
        state.slots_by_date.get(&date).cloned().unwrap_or_default()
    }

    pub fn slot(&self, date: NaiveDate, slot_id: &str) -> Option<Slot> {
        let state = self.state.lock().expect("availability state poisoned");
        state
            .slots_by_date
            .get(&date)
            .and_then(|slots| slots.iter().find(|slot| slot.id == slot_id).cloned())
    }

    /// `Some(true)` free, `Some(false)` taken, `None` not yet known.
    pub fn day_free(&self, date: NaiveDate) -> Option<bool> {
        let state = self.state.lock().expect("availability state poisoned");
        state.day_free.get(&date).copied()
    }

    /// A day is shown as booked only once it is known to be taken.
    pub fn is_day_booked(&self, date: NaiveDate) -> bool {
        self.day_free(date) == Some(false)
    }

    /// True when no snapshot has been published for any date.
    pub fn is_empty(&self) -> bool {
        let state = self.state.lock().expect("availability state poisoned");
        state.slots_by_date.is_empty() && state.day_free.is_empty()
    }
}
