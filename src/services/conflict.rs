//! Overlap and conflict checking
//!
//! Pure predicates over the current reservation set; no side effects.

use chrono::{DateTime, Utc};

/// One existing reservation as seen by the conflict checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub resource_id: i64,
    pub subject_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Half-open interval overlap. Touching endpoints do not overlap.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Whether a candidate window is inadmissible against the reservation set.
///
/// A conflict is raised if any existing reservation on the same resource OR
/// held by the same subject overlaps the candidate: one subject may not hold
/// two simultaneous reservations even across resources. Zero-length
/// candidates never conflict; callers reject them before committing.
pub fn conflicts<'a>(
    existing: impl IntoIterator<Item = &'a Reservation>,
    resource_id: i64,
    subject_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> bool {
    if end <= start {
        return false;
    }
    existing.into_iter().any(|reservation| {
        (reservation.resource_id == resource_id || reservation.subject_id == subject_id)
            && overlaps(reservation.start, reservation.end, start, end)
    })
}
