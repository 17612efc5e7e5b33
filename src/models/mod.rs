//! Data models for the booking terminal

pub mod booking;
pub mod resource;
pub mod slot;

// Re-export commonly used types
pub use booking::{Booking, BookingRequest, RawBooking};
pub use resource::{BookingType, RawResource, Resource};
pub use slot::{RawSlot, Slot};
