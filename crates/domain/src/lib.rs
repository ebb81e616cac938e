//! Domain layer for the hotel-booking system.
//!
//! This crate provides the core entities and rules:
//! - Booking entity with its lifecycle state machine
//! - Hotel inventory counters and per-unit pricing
//! - Payment records and instant/deferred method classification
//! - Discount codes with per-user usage allowances

pub mod booking;
pub mod discount;
pub mod error;
pub mod hotel;
pub mod money;
pub mod payment;

pub use booking::{Booking, BookingStatus, BookingType, HOLD_TTL_HOURS};
pub use discount::Discount;
pub use error::DomainError;
pub use hotel::Hotel;
pub use money::Money;
pub use payment::{Payment, PaymentMethod, PaymentStatus};
