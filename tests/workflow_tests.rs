//! Workflow integration tests
//!
//! Drive the full workflow against the in-memory backend: login, resource
//! selection, schedule browsing, confirmation gating and the commit
//! protocol, including the conflict and reconciliation paths.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use tokio_test::assert_ok;

use bokning_terminal::{
    api::{BookingApi, InMemoryApiClient},
    config::TerminalConfig,
    error::AppError,
    models::BookingType,
    services::workflow::{Phase, Step, Workflow, VISIBLE_DAYS},
    store::InMemoryModeStore,
};

const LAUNDRY: i64 = 1;
const GUEST_APARTMENT: i64 = 3;

fn workflow_over(api: Arc<dyn BookingApi>) -> Workflow {
    Workflow::new(
        api,
        Arc::new(InMemoryModeStore::new()),
        TerminalConfig::default(),
        None,
    )
}

fn workflow() -> Workflow {
    workflow_over(Arc::new(InMemoryApiClient::new()))
}

async fn login(workflow: &Workflow, subject: &str, secret: &str) {
    workflow.set_subject_input(subject);
    workflow.set_secret_input(secret);
    workflow
        .login_with_credentials()
        .await
        .expect("login failed");
}

fn tomorrow() -> NaiveDate {
    Utc::now().date_naive() + Duration::days(1)
}

#[tokio::test]
async fn test_login_loads_resources_and_bookings() {
    let workflow = workflow();
    login(&workflow, "1001", "1234").await;

    assert_eq!(
        workflow.phase(),
        Phase::Active {
            subject_id: "1001".to_string(),
            step: Step::Setup
        }
    );
    assert_eq!(workflow.resources().len(), 3);
    assert!(workflow.bookings().is_empty());
}

#[tokio::test]
async fn test_failed_login_keeps_subject_input() {
    let workflow = workflow();
    workflow.set_subject_input("1001");
    workflow.set_secret_input("wrong");

    let result = workflow.login_with_credentials().await;
    assert!(matches!(result, Err(AppError::Authentication(_))));
    assert_eq!(workflow.phase(), Phase::Anonymous);
    // The non-secret form field survives the failure.
    assert_eq!(workflow.subject_input(), "1001");
    assert!(workflow.notices().current().is_some());
}

#[tokio::test]
async fn test_tag_login() {
    let primary = workflow();
    primary.login_with_tag("UID123").await.unwrap();
    assert_eq!(primary.subject_id().as_deref(), Some("1001"));

    let other = workflow();
    let result = other.login_with_tag("UNKNOWN").await;
    assert!(matches!(result, Err(AppError::Authentication(_))));
    assert_eq!(other.phase(), Phase::Anonymous);
}

#[tokio::test]
async fn test_select_time_slot_resource_yields_14_days_and_4_day_viewport() {
    let workflow = workflow();
    login(&workflow, "1001", "1234").await;

    workflow.select_resource(LAUNDRY).await.unwrap();
    assert_eq!(workflow.step(), Some(Step::Schedule));
    assert_eq!(workflow.days().len(), 14);
    assert_eq!(workflow.visible_days().len(), VISIBLE_DAYS);
    assert_eq!(workflow.viewport_start(), 0);

    // Availability is published for the visible window.
    let first_day = workflow.visible_days()[0];
    assert_eq!(workflow.availability().slots_for(first_day).len(), 16);
}

#[tokio::test]
async fn test_viewport_stays_within_bounds() {
    let workflow = workflow();
    login(&workflow, "1001", "1234").await;
    workflow.select_resource(LAUNDRY).await.unwrap();

    // Backwards from the start is a no-op.
    workflow.navigate_viewport(-1).await.unwrap();
    assert_eq!(workflow.viewport_start(), 0);
    assert!(!workflow.can_navigate_back());

    // Forward until the window hits the end of the horizon.
    for _ in 0..20 {
        workflow.navigate_viewport(1).await.unwrap();
    }
    assert_eq!(workflow.viewport_start(), 14 - VISIBLE_DAYS);
    assert!(!workflow.can_navigate_forward());

    workflow.navigate_viewport(1).await.unwrap();
    assert_eq!(workflow.viewport_start(), 14 - VISIBLE_DAYS);
}

#[tokio::test]
async fn test_time_slot_booking_round_trip() {
    let workflow = workflow();
    login(&workflow, "1001", "1234").await;
    workflow.select_resource(LAUNDRY).await.unwrap();

    let date = tomorrow();
    let slot = workflow
        .availability()
        .slots_for(date)
        .into_iter()
        .find(|slot| slot.is_bookable())
        .expect("no bookable slot tomorrow");

    workflow.stage_booking(date, Some(&slot.id)).unwrap();
    let pending = workflow.confirm().expect("nothing staged");
    assert_eq!(pending.price_units, 0);

    assert_ok!(workflow.commit().await);
    assert!(workflow.confirm().is_none());

    let bookings = workflow.bookings();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].resource_id, LAUNDRY);
    assert_eq!(bookings[0].booking_type, BookingType::TimeSlot);
    assert_eq!(bookings[0].slot_label.as_deref(), Some(slot.id.as_str()));

    // The availability snapshot reconverged: the slot now reads booked.
    assert!(workflow.is_slot_booked(date, &slot.id));
}

#[tokio::test]
async fn test_full_day_booking_commits_utc_day_window() {
    let workflow = workflow();
    login(&workflow, "1001", "1234").await;
    workflow.select_resource(GUEST_APARTMENT).await.unwrap();

    let date = tomorrow();
    workflow.stage_booking(date, None).unwrap();
    let pending = workflow.confirm().expect("nothing staged");
    // The guest apartment is billable at 250 units.
    assert_eq!(pending.price_units, 250);

    workflow.commit().await.unwrap();

    let bookings = workflow.bookings();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].booking_type, BookingType::FullDay);
    assert_eq!(bookings[0].slot_label, None);
    assert_eq!(bookings[0].date, date);
    // The committed window is [00:00Z, 00:00Z next day).
    assert_eq!(
        bookings[0].start_time,
        date.and_hms_opt(0, 0, 0).unwrap().and_utc()
    );
    assert_eq!(
        bookings[0].end_time,
        (date + Duration::days(1)).and_hms_opt(0, 0, 0).unwrap().and_utc()
    );

    // The day now reads booked.
    assert!(workflow.is_day_booked(date));
}

#[tokio::test]
async fn test_overlapping_booking_rejected_with_conflict() {
    let api: Arc<dyn BookingApi> = Arc::new(InMemoryApiClient::new());

    let first = workflow_over(Arc::clone(&api));
    login(&first, "1001", "1234").await;
    first.select_resource(LAUNDRY).await.unwrap();

    let date = tomorrow();
    let slot = first
        .availability()
        .slots_for(date)
        .into_iter()
        .find(|slot| slot.is_bookable())
        .expect("no bookable slot tomorrow");
    first.stage_booking(date, Some(&slot.id)).unwrap();
    first.commit().await.unwrap();

    // A second subject races for the same window before its availability
    // snapshot knows about the first booking.
    let second = workflow_over(Arc::clone(&api));
    login(&second, "1002", "").await;
    second.select_resource(LAUNDRY).await.unwrap();

    // Stage from a pre-commit snapshot by hand: the slot id is stable.
    let result = second.stage_booking(date, Some(&slot.id));
    // The refreshed snapshot already shows the slot as booked, so staging
    // is rejected before commit even runs.
    assert!(result.is_err());
    assert!(second.bookings().is_empty());
}

#[tokio::test]
async fn test_commit_time_conflict_reconciles() {
    let api: Arc<dyn BookingApi> = Arc::new(InMemoryApiClient::new());

    let first = workflow_over(Arc::clone(&api));
    login(&first, "1001", "1234").await;
    first.select_resource(LAUNDRY).await.unwrap();

    let second = workflow_over(Arc::clone(&api));
    login(&second, "1002", "").await;
    second.select_resource(LAUNDRY).await.unwrap();

    let date = tomorrow();
    let slot = first
        .availability()
        .slots_for(date)
        .into_iter()
        .find(|slot| slot.is_bookable())
        .expect("no bookable slot tomorrow");

    // Both stage while the slot is still free; only the first commit wins.
    first.stage_booking(date, Some(&slot.id)).unwrap();
    second.stage_booking(date, Some(&slot.id)).unwrap();
    first.commit().await.unwrap();

    let result = second.commit().await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
    // The losing booking never appears in the reloaded list, and the
    // confirmation stays up because the commit did not succeed.
    assert!(second.bookings().is_empty());
    assert!(second.confirm().is_some());
    assert!(second.notices().current().is_some());
    // Reconciliation already made the now-current availability visible.
    assert!(second.is_slot_booked(date, &slot.id));
}

#[tokio::test]
async fn test_cancel_unknown_booking_yields_not_found() {
    let workflow = workflow();
    login(&workflow, "1001", "1234").await;
    workflow.select_resource(LAUNDRY).await.unwrap();

    let date = tomorrow();
    let slot = workflow
        .availability()
        .slots_for(date)
        .into_iter()
        .find(|slot| slot.is_bookable())
        .expect("no bookable slot tomorrow");
    workflow.stage_booking(date, Some(&slot.id)).unwrap();
    workflow.commit().await.unwrap();
    let before = workflow.bookings();

    workflow.stage_cancel(424_242).unwrap();
    let result = workflow.commit().await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    // The list is unchanged after reconciliation.
    let after = workflow.bookings();
    assert_eq!(after.len(), before.len());
    assert_eq!(after[0].id, before[0].id);
}

#[tokio::test]
async fn test_cancel_round_trip() {
    let workflow = workflow();
    login(&workflow, "1001", "1234").await;
    workflow.select_resource(GUEST_APARTMENT).await.unwrap();

    let date = tomorrow();
    workflow.stage_booking(date, None).unwrap();
    workflow.commit().await.unwrap();
    let booking_id = workflow.bookings()[0].id;
    assert!(workflow.is_day_booked(date));

    workflow.stage_cancel(booking_id).unwrap();
    assert_ok!(workflow.commit().await);
    assert!(workflow.bookings().is_empty());
    assert!(workflow.confirm().is_none());
    // The day is free again after reconciliation.
    assert!(!workflow.is_day_booked(date));
}

#[tokio::test]
async fn test_subject_cannot_hold_overlapping_reservations_across_resources() {
    let workflow = workflow();
    login(&workflow, "1001", "1234").await;

    // Book the guest apartment for tomorrow.
    workflow.select_resource(GUEST_APARTMENT).await.unwrap();
    let date = tomorrow();
    workflow.stage_booking(date, None).unwrap();
    workflow.commit().await.unwrap();

    // The same subject staging an overlapping laundry slot is rejected
    // locally, before the backend would 409 anyway.
    workflow.select_resource(LAUNDRY).await.unwrap();
    let slot = workflow
        .availability()
        .slots_for(date)
        .into_iter()
        .find(|slot| slot.is_bookable())
        .expect("no bookable slot tomorrow");
    let result = workflow.stage_booking(date, Some(&slot.id));
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_back_to_setup_keeps_resource_list() {
    let workflow = workflow();
    login(&workflow, "1001", "1234").await;
    workflow.select_resource(LAUNDRY).await.unwrap();

    workflow.back_to_setup();
    assert_eq!(workflow.step(), Some(Step::Setup));
    assert_eq!(workflow.resources().len(), 3);
    assert!(workflow.selected_resource().is_none());
    assert!(workflow.availability().is_empty());
}

#[tokio::test]
async fn test_logout_clears_session_state() {
    let workflow = workflow();
    login(&workflow, "1001", "1234").await;
    workflow.select_resource(GUEST_APARTMENT).await.unwrap();
    workflow.stage_booking(tomorrow(), None).unwrap();

    workflow.logout();
    assert_eq!(workflow.phase(), Phase::Anonymous);
    assert!(workflow.selected_resource().is_none());
    assert!(workflow.bookings().is_empty());
    assert!(workflow.confirm().is_none());
    assert!(workflow.availability().is_empty());
    assert_eq!(workflow.subject_input(), "");
}

#[tokio::test]
async fn test_change_secret_validates_length_then_sticks() {
    let api: Arc<dyn BookingApi> = Arc::new(InMemoryApiClient::new());
    let workflow = workflow_over(Arc::clone(&api));
    login(&workflow, "1001", "1234").await;

    workflow.set_new_secret_input("123");
    let result = workflow.change_secret().await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    workflow.set_new_secret_input("5678");
    workflow.change_secret().await.unwrap();
    workflow.logout();

    // The new secret works, the old one does not.
    let again = workflow_over(Arc::clone(&api));
    again.set_subject_input("1001");
    again.set_secret_input("1234");
    assert!(again.login_with_credentials().await.is_err());

    again.set_subject_input("1001");
    again.set_secret_input("5678");
    again.login_with_credentials().await.unwrap();
}
