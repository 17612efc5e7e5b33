//! Booking workflow state machine
//!
//! Session and step state for one terminal: login, resource setup, schedule
//! browsing, confirmation gating and the commit protocol. All collaborators
//! are injected; the state lives behind a mutex that is never held across an
//! await, so every local transition between suspension points is atomic.

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, Utc};
use validator::Validate;

use crate::{
    api::BookingApi,
    config::TerminalConfig,
    error::{AppError, AppResult},
    models::{Booking, BookingRequest, BookingType, RawBooking, Resource},
    notice::NoticeCenter,
    services::availability::AvailabilitySync,
    services::conflict::{conflicts, Reservation},
    store::{resolve_mode, InteractionMode, ModeStore},
    timeutil,
};

/// Width of the schedule viewport for time-slot resources.
pub const VISIBLE_DAYS: usize = 4;

/// Coarse UI phase gating which actions are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Setup,
    Schedule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Anonymous,
    Authenticating,
    Active { subject_id: String, step: Step },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingKind {
    BookTimeSlot {
        resource_id: i64,
        date: NaiveDate,
        slot_id: String,
    },
    BookFullDay {
        resource_id: i64,
        date: NaiveDate,
    },
    Cancel {
        booking_id: i64,
    },
}

/// Staged action awaiting confirmation before commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAction {
    pub kind: PendingKind,
    pub resource_name: String,
    pub price_units: i64,
}

#[derive(Validate)]
struct SecretChange {
    #[validate(length(min = 4, message = "secret must be at least 4 characters"))]
    new_secret: String,
}

struct WorkflowState {
    phase: Phase,
    mode: InteractionMode,
    resources: Vec<Resource>,
    bookings: Vec<Booking>,
    days: Vec<NaiveDate>,
    selected_resource_id: Option<i64>,
    viewport_start: usize,
    confirm: Option<PendingAction>,
    loading: bool,
    subject_input: String,
    secret_input: String,
    new_secret_input: String,
}

pub struct Workflow {
    api: Arc<dyn BookingApi>,
    availability: AvailabilitySync,
    notices: NoticeCenter,
    mode_store: Arc<dyn ModeStore>,
    config: TerminalConfig,
    state: Mutex<WorkflowState>,
}

impl Workflow {
    pub fn new(
        api: Arc<dyn BookingApi>,
        mode_store: Arc<dyn ModeStore>,
        config: TerminalConfig,
        mode_override: Option<InteractionMode>,
    ) -> Self {
        let default_mode =
            InteractionMode::parse(&config.default_mode).unwrap_or(InteractionMode::SelfService);
        let mode = resolve_mode(mode_override, &*mode_store, default_mode);
        mode_store.save(mode);

        let days = timeutil::upcoming_days(Self::today(), config.full_day_horizon);
        let availability = AvailabilitySync::new(Arc::clone(&api));
        Self {
            api,
            availability,
            notices: NoticeCenter::new(),
            mode_store,
            config,
            state: Mutex::new(WorkflowState {
                phase: Phase::Anonymous,
                mode,
                resources: Vec::new(),
                bookings: Vec::new(),
                days,
                selected_resource_id: None,
                viewport_start: 0,
                confirm: None,
                loading: false,
                subject_input: String::new(),
                secret_input: String::new(),
                new_secret_input: String::new(),
            }),
        }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, WorkflowState> {
        self.state.lock().expect("workflow state poisoned")
    }

    // ---- Authentication ----

    /// Log in with a scanned tag identifier.
    pub async fn login_with_tag(&self, uid: &str) -> AppResult<()> {
        let uid = uid.trim().to_string();
        if uid.is_empty() {
            return Err(AppError::Validation("empty tag identifier".to_string()));
        }
        self.login(|api| async move { api.login_with_tag(&uid).await }).await
    }

    /// Log in with the subject id and secret currently in the form fields.
    pub async fn login_with_credentials(&self) -> AppResult<()> {
        let (subject, secret) = {
            let state = self.lock();
            (
                state.subject_input.trim().to_string(),
                state.secret_input.trim().to_string(),
            )
        };
        self.login(|api| async move { api.login_with_credentials(&subject, &secret).await })
            .await
    }

    async fn login<F, Fut>(&self, authenticate: F) -> AppResult<()>
    where
        F: FnOnce(Arc<dyn BookingApi>) -> Fut,
        Fut: std::future::Future<Output = AppResult<String>>,
    {
        {
            let mut state = self.lock();
            if !matches!(state.phase, Phase::Anonymous) {
                return Err(AppError::Validation("already signed in".to_string()));
            }
            if state.loading {
                tracing::debug!("ignoring re-entrant login");
                return Ok(());
            }
            state.loading = true;
            state.phase = Phase::Authenticating;
        }
        self.notices.clear();

        let outcome = authenticate(Arc::clone(&self.api)).await;
        let result = match outcome {
            Ok(subject_id) => {
                tracing::info!(subject = %subject_id, "login succeeded");
                {
                    let mut state = self.lock();
                    state.phase = Phase::Active {
                        subject_id,
                        step: Step::Setup,
                    };
                    state.secret_input.clear();
                }
                // Eager loads converge the fresh session to server truth. A
                // failure here surfaces as a notice; the session itself
                // stays established. Non-secret form fields are untouched.
                if let Err(error) = self.bootstrap_session().await {
                    self.report(&error);
                }
                Ok(())
            }
            Err(error) => {
                self.lock().phase = Phase::Anonymous;
                self.report(&error);
                Err(error)
            }
        };
        self.lock().loading = false;
        result
    }

    async fn bootstrap_session(&self) -> AppResult<()> {
        self.load_resources().await?;
        self.reload_bookings().await?;
        self.refresh_availability().await
    }

    /// Replace the subject's secret with the staged form value.
    pub async fn change_secret(&self) -> AppResult<()> {
        let new_secret = self.lock().new_secret_input.trim().to_string();
        let request = SecretChange {
            new_secret: new_secret.clone(),
        };
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        {
            let mut state = self.lock();
            if state.loading {
                tracing::debug!("ignoring re-entrant secret change");
                return Ok(());
            }
            state.loading = true;
        }
        let result = self.api.change_secret(&new_secret).await;
        {
            let mut state = self.lock();
            state.loading = false;
            if result.is_ok() {
                state.new_secret_input.clear();
            }
        }
        if let Err(error) = result {
            self.report(&error);
            return Err(error);
        }
        Ok(())
    }

    /// Return to anonymous and drop all session-scoped state. No stale
    /// availability response can publish afterwards: the token advances.
    pub fn logout(&self) {
        tracing::info!("logging out");
        {
            let mut state = self.lock();
            state.phase = Phase::Anonymous;
            state.selected_resource_id = None;
            state.bookings.clear();
            state.confirm = None;
            state.viewport_start = 0;
            state.loading = false;
            state.subject_input.clear();
            state.secret_input.clear();
            state.new_secret_input.clear();
        }
        self.availability.invalidate();
    }

    // ---- Resource selection & schedule browsing ----

    /// Pick a resource and move to the schedule step.
    pub async fn select_resource(&self, resource_id: i64) -> AppResult<()> {
        {
            let mut state = self.lock();
            if !matches!(state.phase, Phase::Active { .. }) {
                return Err(AppError::Validation("no active session".to_string()));
            }
            let resource = state
                .resources
                .iter()
                .find(|r| r.id == resource_id)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("resource {}", resource_id)))?;
            state.selected_resource_id = Some(resource.id);
            if let Phase::Active { step, .. } = &mut state.phase {
                *step = Step::Schedule;
            }
            state.days = timeutil::horizon(
                Self::today(),
                resource.min_advance_days,
                resource.max_advance_days,
            );
            state.viewport_start = 0;
        }
        self.availability.invalidate();
        if let Err(error) = self.refresh_availability().await {
            self.report(&error);
            return Err(error);
        }
        Ok(())
    }

    /// Leave the schedule step; keeps the resource list, drops the view.
    pub fn back_to_setup(&self) {
        {
            let mut state = self.lock();
            if let Phase::Active { step, .. } = &mut state.phase {
                *step = Step::Setup;
            }
            state.selected_resource_id = None;
            state.viewport_start = 0;
        }
        self.availability.invalidate();
    }

    /// Shift the 4-day viewport; a no-op when the window would leave
    /// `[0, days - 4]`. A successful shift refreshes availability.
    pub async fn navigate_viewport(&self, step: i64) -> AppResult<()> {
        let shifted = {
            let mut state = self.lock();
            let next = state.viewport_start as i64 + step;
            if next < 0 || next as usize + VISIBLE_DAYS > state.days.len() {
                false
            } else {
                state.viewport_start = next as usize;
                true
            }
        };
        if shifted {
            if let Err(error) = self.refresh_availability().await {
                self.report(&error);
                return Err(error);
            }
        }
        Ok(())
    }

    // ---- Confirmation gating & commit ----

    /// Stage a booking for confirmation. Time-slot resources need the slot
    /// id; full-day resources book the whole calendar day.
    pub fn stage_booking(&self, date: NaiveDate, slot_id: Option<&str>) -> AppResult<()> {
        let subject_id = self
            .subject_id()
            .ok_or_else(|| AppError::Validation("no active session".to_string()))?;
        let resource = self
            .selected_resource()
            .ok_or_else(|| AppError::Validation("no resource selected".to_string()))?;

        let (kind, start, end) = match resource.booking_type {
            BookingType::TimeSlot => {
                let slot_id = slot_id
                    .ok_or_else(|| AppError::Validation("slot id required".to_string()))?;
                let slot = self
                    .availability
                    .slot(date, slot_id)
                    .ok_or_else(|| AppError::Validation("unknown slot".to_string()))?;
                if !slot.is_bookable() {
                    return Err(AppError::Validation("slot unavailable".to_string()));
                }
                if slot.end_time <= slot.start_time {
                    return Err(AppError::Validation("empty booking window".to_string()));
                }
                (
                    PendingKind::BookTimeSlot {
                        resource_id: resource.id,
                        date,
                        slot_id: slot_id.to_string(),
                    },
                    slot.start_time,
                    slot.end_time,
                )
            }
            BookingType::FullDay => {
                if self.availability.day_free(date) != Some(true) {
                    return Err(AppError::Validation("day unavailable".to_string()));
                }
                let (start, end) = timeutil::day_window(date);
                (
                    PendingKind::BookFullDay {
                        resource_id: resource.id,
                        date,
                    },
                    start,
                    end,
                )
            }
        };

        // Early overlap check against the subject's own reservation set.
        // The backend re-checks at commit time; this only catches what is
        // already known locally.
        let mut state = self.lock();
        let reservations: Vec<Reservation> = state
            .bookings
            .iter()
            .map(|b| Reservation {
                resource_id: b.resource_id,
                subject_id: subject_id.clone(),
                start: b.start_time,
                end: b.end_time,
            })
            .collect();
        if conflicts(reservations.iter(), resource.id, &subject_id, start, end) {
            return Err(AppError::Conflict("overlapping reservation".to_string()));
        }

        state.confirm = Some(PendingAction {
            kind,
            resource_name: resource.name,
            price_units: resource.price_units,
        });
        Ok(())
    }

    /// Stage a cancellation for confirmation. The id is taken as given; a
    /// booking already removed on the server surfaces at commit time.
    pub fn stage_cancel(&self, booking_id: i64) -> AppResult<()> {
        if self.subject_id().is_none() {
            return Err(AppError::Validation("no active session".to_string()));
        }
        let mut state = self.lock();
        let resource_name = state
            .bookings
            .iter()
            .find(|b| b.id == booking_id)
            .map(|b| b.resource_name.clone())
            .unwrap_or_default();
        state.confirm = Some(PendingAction {
            kind: PendingKind::Cancel { booking_id },
            resource_name,
            price_units: 0,
        });
        Ok(())
    }

    pub fn dismiss_confirm(&self) {
        self.lock().confirm = None;
    }

    /// Execute the staged action, then reconverge with server truth by
    /// reloading the booking list and refreshing availability regardless of
    /// the outcome. Only on success is the confirmation dismissed.
    pub async fn commit(&self) -> AppResult<()> {
        let pending = {
            let mut state = self.lock();
            let Some(pending) = state.confirm.clone() else {
                return Ok(());
            };
            if state.loading {
                tracing::debug!("ignoring re-entrant commit");
                return Ok(());
            }
            state.loading = true;
            pending
        };
        self.notices.clear();

        let result = self.execute(&pending).await;

        if let Err(error) = self.reload_bookings().await {
            self.report(&error);
        }
        if let Err(error) = self.refresh_availability().await {
            self.report(&error);
        }

        let outcome = match result {
            Ok(()) => {
                self.lock().confirm = None;
                Ok(())
            }
            Err(error) => {
                self.report(&error);
                Err(error)
            }
        };
        self.lock().loading = false;
        outcome
    }

    async fn execute(&self, pending: &PendingAction) -> AppResult<()> {
        let subject_id = self
            .subject_id()
            .ok_or_else(|| AppError::Validation("no active session".to_string()))?;
        match &pending.kind {
            PendingKind::BookFullDay { resource_id, date } => {
                let (start, end) = timeutil::day_window(*date);
                let id = self
                    .api
                    .create_booking(&BookingRequest {
                        resource_id: *resource_id,
                        subject_id,
                        start_time: start,
                        end_time: end,
                        is_billable: pending.price_units > 0,
                    })
                    .await?;
                tracing::info!(booking = id, resource = resource_id, "full-day booking created");
                Ok(())
            }
            PendingKind::BookTimeSlot { resource_id, date, slot_id } => {
                let slot = self
                    .availability
                    .slot(*date, slot_id)
                    .ok_or_else(|| AppError::Validation("slot no longer available".to_string()))?;
                let id = self
                    .api
                    .create_booking(&BookingRequest {
                        resource_id: *resource_id,
                        subject_id,
                        start_time: slot.start_time,
                        end_time: slot.end_time,
                        is_billable: pending.price_units > 0,
                    })
                    .await?;
                tracing::info!(booking = id, resource = resource_id, "slot booking created");
                Ok(())
            }
            PendingKind::Cancel { booking_id } => {
                self.api.cancel_booking(*booking_id).await?;
                tracing::info!(booking = booking_id, "booking cancelled");
                Ok(())
            }
        }
    }

    // ---- Loads ----

    async fn load_resources(&self) -> AppResult<()> {
        let raw = self.api.resources().await?;
        let default_horizon = self.config.full_day_horizon;
        {
            let mut state = self.lock();
            state.resources = raw
                .into_iter()
                .map(|r| r.normalize(default_horizon))
                .collect();
            // Pre-select the first resource so the schedule prefetch has a
            // target; the step stays at Setup until an explicit selection.
            state.selected_resource_id = state.resources.first().map(|r| r.id);
            if let Some(first) = state.resources.first() {
                state.days = timeutil::horizon(
                    Self::today(),
                    first.min_advance_days,
                    first.max_advance_days,
                );
            }
            state.viewport_start = 0;
        }
        self.availability.invalidate();
        Ok(())
    }

    async fn reload_bookings(&self) -> AppResult<()> {
        let Some(subject_id) = self.subject_id() else {
            return Ok(());
        };
        let raw = self.api.bookings(&subject_id).await?;
        self.lock().bookings = raw.into_iter().map(RawBooking::normalize).collect();
        Ok(())
    }

    async fn refresh_availability(&self) -> AppResult<()> {
        let Some(resource) = self.selected_resource() else {
            return Ok(());
        };
        let dates = {
            let state = self.lock();
            match resource.booking_type {
                BookingType::TimeSlot => {
                    let start = state.viewport_start.min(state.days.len());
                    let end = (start + VISIBLE_DAYS).min(state.days.len());
                    state.days[start..end].to_vec()
                }
                BookingType::FullDay => state.days.clone(),
            }
        };
        self.availability.refresh(&resource, &dates).await
    }

    // ---- Error funnel ----

    fn report(&self, error: &AppError) {
        tracing::warn!(%error, "operation failed");
        self.notices.publish(error.notice_message());
        if error.forces_logout() {
            self.logout();
        }
    }

    // ---- Derivations ----

    pub fn phase(&self) -> Phase {
        self.lock().phase.clone()
    }

    pub fn step(&self) -> Option<Step> {
        match self.lock().phase {
            Phase::Active { step, .. } => Some(step),
            _ => None,
        }
    }

    pub fn subject_id(&self) -> Option<String> {
        match &self.lock().phase {
            Phase::Active { subject_id, .. } => Some(subject_id.clone()),
            _ => None,
        }
    }

    pub fn mode(&self) -> InteractionMode {
        self.lock().mode
    }

    pub fn set_mode(&self, mode: InteractionMode) {
        self.lock().mode = mode;
        self.mode_store.save(mode);
    }

    /// Tag scanning is live only on an unauthenticated front-desk terminal.
    pub fn scanning_active(&self) -> bool {
        let state = self.lock();
        state.mode == InteractionMode::FrontDesk && matches!(state.phase, Phase::Anonymous)
    }

    pub fn resources(&self) -> Vec<Resource> {
        self.lock().resources.clone()
    }

    pub fn bookings(&self) -> Vec<Booking> {
        self.lock().bookings.clone()
    }

    pub fn selected_resource(&self) -> Option<Resource> {
        let state = self.lock();
        let id = state.selected_resource_id?;
        state.resources.iter().find(|r| r.id == id).cloned()
    }

    pub fn days(&self) -> Vec<NaiveDate> {
        self.lock().days.clone()
    }

    /// The 4-day window currently shown for time-slot resources.
    pub fn visible_days(&self) -> Vec<NaiveDate> {
        let state = self.lock();
        let start = state.viewport_start.min(state.days.len());
        let end = (start + VISIBLE_DAYS).min(state.days.len());
        state.days[start..end].to_vec()
    }

    pub fn viewport_start(&self) -> usize {
        self.lock().viewport_start
    }

    pub fn can_navigate_back(&self) -> bool {
        self.lock().viewport_start > 0
    }

    pub fn can_navigate_forward(&self) -> bool {
        let state = self.lock();
        state.viewport_start + VISIBLE_DAYS < state.days.len()
    }

    pub fn confirm(&self) -> Option<PendingAction> {
        self.lock().confirm.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    /// An unknown slot reads as booked: never offer what is not published.
    pub fn is_slot_booked(&self, date: NaiveDate, slot_id: &str) -> bool {
        if self.lock().selected_resource_id.is_none() {
            return true;
        }
        self.availability
            .slot(date, slot_id)
            .map(|slot| slot.is_booked)
            .unwrap_or(true)
    }

    pub fn is_slot_past(&self, date: NaiveDate, slot_id: &str) -> bool {
        self.availability
            .slot(date, slot_id)
            .map(|slot| slot.is_past)
            .unwrap_or(false)
    }

    pub fn is_day_booked(&self, date: NaiveDate) -> bool {
        self.availability.is_day_booked(date)
    }

    pub fn availability(&self) -> &AvailabilitySync {
        &self.availability
    }

    pub fn notices(&self) -> &NoticeCenter {
        &self.notices
    }

    // ---- Form fields ----

    pub fn set_subject_input(&self, value: &str) {
        self.lock().subject_input = value.to_string();
    }

    pub fn subject_input(&self) -> String {
        self.lock().subject_input.clone()
    }

    pub fn set_secret_input(&self, value: &str) {
        self.lock().secret_input = value.to_string();
    }

    pub fn set_new_secret_input(&self, value: &str) {
        self.lock().new_secret_input = value.to_string();
    }
}
