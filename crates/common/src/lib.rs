//! Shared types for the hotel-booking system.
//!
//! Every entity is keyed by its own UUID newtype so that a booking ID can
//! never be passed where a hotel ID is expected.

pub mod types;

pub use types::{BookingId, DiscountId, HotelId, PaymentId, UserId};
