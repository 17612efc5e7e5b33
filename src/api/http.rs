//! HTTP implementation of the backend port
//!
//! The session rides on an httponly cookie set by the login endpoints, so
//! the client keeps a cookie store for the lifetime of the terminal process.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::{
    config::BackendConfig,
    error::{AppError, AppResult},
    models::{BookingRequest, RawBooking, RawResource, RawSlot},
};

use super::BookingApi;

#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    apartment_id: String,
}

#[derive(Debug, Deserialize)]
struct ResourcesResponse {
    resources: Vec<RawResource>,
}

#[derive(Debug, Deserialize)]
struct BookingsResponse {
    bookings: Vec<RawBooking>,
}

#[derive(Debug, Deserialize)]
struct SlotsResponse {
    slots: Vec<RawSlot>,
}

#[derive(Debug, Deserialize)]
struct BookingResponse {
    booking_id: i64,
}

impl HttpApiClient {
    pub fn new(config: &BackendConfig) -> AppResult<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a non-success status to the error taxonomy. 401 means a bad
    /// credential during login but an expired session on any later call.
    async fn check(response: Response, during_login: bool) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = response
            .text()
            .await
            .unwrap_or_else(|_| status.to_string());
        Err(match status {
            StatusCode::UNAUTHORIZED if during_login => AppError::Authentication(detail),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::AuthorizationExpired,
            StatusCode::CONFLICT => AppError::Conflict(detail),
            StatusCode::NOT_FOUND => AppError::NotFound(detail),
            StatusCode::BAD_REQUEST => AppError::Validation(detail),
            _ => AppError::Transient(format!("{}: {}", status, detail)),
        })
    }

    async fn parse<T: for<'de> Deserialize<'de>>(response: Response) -> AppResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| AppError::Transient(format!("Malformed backend response: {}", e)))
    }

    fn transport(error: reqwest::Error) -> AppError {
        AppError::Transient(error.to_string())
    }
}

#[async_trait]
impl BookingApi for HttpApiClient {
    async fn login_with_tag(&self, uid: &str) -> AppResult<String> {
        let response = self
            .client
            .post(self.url("/rfid-login"))
            .json(&json!({ "uid": uid }))
            .send()
            .await
            .map_err(Self::transport)?;
        let body: LoginResponse = Self::parse(Self::check(response, true).await?).await?;
        Ok(body.apartment_id)
    }

    async fn login_with_credentials(&self, subject_id: &str, secret: &str) -> AppResult<String> {
        let response = self
            .client
            .post(self.url("/mobile-login"))
            .json(&json!({ "apartment_id": subject_id, "password": secret }))
            .send()
            .await
            .map_err(Self::transport)?;
        let body: LoginResponse = Self::parse(Self::check(response, true).await?).await?;
        Ok(body.apartment_id)
    }

    async fn change_secret(&self, new_secret: &str) -> AppResult<()> {
        let response = self
            .client
            .post(self.url("/mobile-password"))
            .json(&json!({ "new_password": new_secret }))
            .send()
            .await
            .map_err(Self::transport)?;
        Self::check(response, false).await?;
        Ok(())
    }

    async fn resources(&self) -> AppResult<Vec<RawResource>> {
        let response = self
            .client
            .get(self.url("/resources"))
            .send()
            .await
            .map_err(Self::transport)?;
        let body: ResourcesResponse = Self::parse(Self::check(response, false).await?).await?;
        Ok(body.resources)
    }

    async fn bookings(&self, _subject_id: &str) -> AppResult<Vec<RawBooking>> {
        // The backend scopes the list to the session cookie.
        let response = self
            .client
            .get(self.url("/bookings"))
            .send()
            .await
            .map_err(Self::transport)?;
        let body: BookingsResponse = Self::parse(Self::check(response, false).await?).await?;
        Ok(body.bookings)
    }

    async fn availability(&self, resource_id: i64, date: NaiveDate) -> AppResult<Vec<RawSlot>> {
        let response = self
            .client
            .get(self.url("/slots"))
            .query(&[
                ("resource_id", resource_id.to_string()),
                ("date", date.to_string()),
            ])
            .send()
            .await
            .map_err(Self::transport)?;
        let body: SlotsResponse = Self::parse(Self::check(response, false).await?).await?;
        Ok(body.slots)
    }

    async fn create_booking(&self, request: &BookingRequest) -> AppResult<i64> {
        let response = self
            .client
            .post(self.url("/book"))
            .json(&json!({
                "apartment_id": request.subject_id,
                "resource_id": request.resource_id,
                "start_time": request.start_time.to_rfc3339(),
                "end_time": request.end_time.to_rfc3339(),
                "is_billable": request.is_billable,
            }))
            .send()
            .await
            .map_err(Self::transport)?;
        let body: BookingResponse = Self::parse(Self::check(response, false).await?).await?;
        Ok(body.booking_id)
    }

    async fn cancel_booking(&self, booking_id: i64) -> AppResult<()> {
        let response = self
            .client
            .delete(self.url("/cancel"))
            .json(&json!({ "booking_id": booking_id }))
            .send()
            .await
            .map_err(Self::transport)?;
        Self::check(response, false).await?;
        Ok(())
    }

    async fn health(&self) -> AppResult<()> {
        let response = self
            .client
            .get(self.url("/health"))
            .send()
            .await
            .map_err(Self::transport)?;
        Self::check(response, false).await?;
        Ok(())
    }
}
