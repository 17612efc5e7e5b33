//! Bokning - Shared Resource Booking Terminal
//!
//! Availability synchronization and conflict-resolution engine for shared
//! resources (laundry machines, guest apartments) booked by time slot or by
//! whole calendar day, driven by an explicit workflow state machine over an
//! injected backend API.

pub mod api;
pub mod config;
pub mod error;
pub mod input;
pub mod models;
pub mod notice;
pub mod services;
pub mod store;
pub mod timeutil;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use services::{AvailabilitySync, Workflow};
