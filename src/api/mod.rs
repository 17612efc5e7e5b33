//! Backend API port
//!
//! The workflow and the availability synchronizer talk to the backend only
//! through [`BookingApi`]. The trait is object-safe so the terminal can be
//! wired against the HTTP client or the in-memory backend at startup.

pub mod http;
pub mod mock;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    error::AppResult,
    models::{BookingRequest, RawBooking, RawResource, RawSlot},
};

pub use http::HttpApiClient;
pub use mock::InMemoryApiClient;

/// Abstract backend contract, independent of transport.
#[async_trait]
pub trait BookingApi: Send + Sync {
    /// Resolve a scanned tag identifier to a subject id.
    async fn login_with_tag(&self, uid: &str) -> AppResult<String>;

    /// Authenticate a stored-credential pair.
    async fn login_with_credentials(&self, subject_id: &str, secret: &str) -> AppResult<String>;

    /// Replace the authenticated subject's secret.
    async fn change_secret(&self, new_secret: &str) -> AppResult<()>;

    async fn resources(&self) -> AppResult<Vec<RawResource>>;

    async fn bookings(&self, subject_id: &str) -> AppResult<Vec<RawBooking>>;

    /// Per-date availability for one resource.
    async fn availability(&self, resource_id: i64, date: NaiveDate) -> AppResult<Vec<RawSlot>>;

    /// Returns the server-assigned booking id.
    async fn create_booking(&self, request: &BookingRequest) -> AppResult<i64>;

    async fn cancel_booking(&self, booking_id: i64) -> AppResult<()>;

    /// Reachability probe, used once at startup for the log line.
    async fn health(&self) -> AppResult<()>;
}
