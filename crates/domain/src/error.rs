//! Domain error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::booking::{BookingStatus, BookingType};

/// Errors raised by entity state machines and request validation.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Check-out must be strictly after check-in.
    #[error("invalid range: check-in {check_in} is not before check-out {check_out}")]
    InvalidRange {
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    },

    /// The hotel has no usable price for the requested booking type.
    #[error("hotel has no {booking_type} price configured")]
    PricingUnavailable { booking_type: BookingType },

    /// The pending hold deadline has passed.
    #[error("booking hold expired at {expires_at}")]
    HoldExpired { expires_at: DateTime<Utc> },

    /// The booking is no longer pending.
    #[error("booking is not pending (status: {status})")]
    NotPending { status: BookingStatus },

    /// The booking state does not admit the requested action.
    #[error("cannot {action} booking in {status} state")]
    InvalidState {
        status: BookingStatus,
        action: &'static str,
    },

    /// The discount code is past its deadline.
    #[error("discount expired at {expires_at}")]
    DiscountExpired { expires_at: DateTime<Utc> },

    /// The user exhausted their redemption allowance for this code.
    #[error("discount usage limit reached ({max_usage} per user)")]
    LimitReached { max_usage: u32 },
}
