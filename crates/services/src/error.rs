//! Service error types.

use common::{BookingId, HotelId};
use domain::DomainError;
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by the booking, payment, and discount services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Booking not found.
    #[error("booking not found: {0}")]
    BookingNotFound(BookingId),

    /// Hotel not found.
    #[error("hotel not found: {0}")]
    HotelNotFound(HotelId),

    /// Discount code not found.
    #[error("discount code not found: {code}")]
    DiscountNotFound { code: String },

    /// The caller does not own the booking.
    #[error("caller does not own booking {booking_id}")]
    NotOwner { booking_id: BookingId },

    /// Inventory exhausted at the authoritative check.
    #[error("no rooms available")]
    NoCapacity,

    /// A settled payment already exists for the booking.
    #[error("payment already settled for booking {0}")]
    AlreadyPaid(BookingId),

    /// A concurrent request moved the booking out of Pending first.
    #[error("booking {0} was already processed by a concurrent request")]
    AlreadyProcessed(BookingId),

    /// The discount code is already taken.
    #[error("discount code already exists: {code}")]
    DiscountExists { code: String },

    /// Domain rule violation.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Storage error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience type alias for service results.
pub type Result<T> = std::result::Result<T, ServiceError>;
