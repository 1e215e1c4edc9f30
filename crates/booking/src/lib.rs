//! Client for the desk-booking service.
//!
//! Reads today's bookings per floor (who sits where) and the floor's
//! bookable resources with their polygon vertices. [`BookingSource`]
//! adapts both to the engine's presence and resource ports.

pub mod api;
pub mod config;
pub mod messages;
pub mod source;

pub use api::{BookingApi, BookingApiError};
pub use config::BookingConfig;
pub use source::BookingSource;
