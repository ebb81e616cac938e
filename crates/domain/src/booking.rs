//! Booking entity and its lifecycle state machine.

use chrono::{DateTime, Duration, Utc};
use common::{BookingId, HotelId, UserId};
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// How long a pending hold stays confirmable before the expiry sweep
/// cancels it.
pub const HOLD_TTL_HOURS: i64 = 24;

/// The state of a booking in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──► Active ──► Completed
///    │           │
///    └───────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Hold created, awaiting confirmation or payment.
    #[default]
    Pending,

    /// Capacity committed; the stay is upcoming or in progress.
    Active,

    /// The stay ended and capacity was returned (terminal state).
    Completed,

    /// Hold expired or the booking was cancelled (terminal state).
    Cancelled,
}

impl BookingStatus {
    /// Returns true if the booking can be confirmed or paid in this state.
    pub fn can_confirm(&self) -> bool {
        matches!(self, BookingStatus::Pending)
    }

    /// Returns true if the booking can be cancelled in this state.
    pub fn can_cancel(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Active)
    }

    /// Returns true if the booking can be completed in this state.
    pub fn can_complete(&self) -> bool {
        matches!(self, BookingStatus::Active)
    }

    /// Returns true if this is a terminal state (no further transitions
    /// possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Returns the status name as stored and displayed.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Active => "active",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Parses a stored status name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "active" => Some(BookingStatus::Active),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Billing granularity for a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingType {
    /// Billed per whole hour (ceiling).
    PerHour,

    /// Billed per whole day (ceiling of hours / 24).
    PerDay,

    /// A single overnight stay, billed at the daily rate.
    Overnight,
}

impl BookingType {
    /// Returns the type name as stored and displayed.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingType::PerHour => "per_hour",
            BookingType::PerDay => "per_day",
            BookingType::Overnight => "overnight",
        }
    }

    /// Parses a stored type name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "per_hour" => Some(BookingType::PerHour),
            "per_day" => Some(BookingType::PerDay),
            "overnight" => Some(BookingType::Overnight),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A reservation held by a user against a hotel's room capacity.
///
/// Bookings are never deleted; terminal rows remain as the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub hotel_id: HotelId,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub booking_type: BookingType,
    /// Computed at creation, immutable thereafter.
    pub total_price: Money,
    /// Set once, from the settled payment.
    pub paid_amount: Option<Money>,
    pub status: BookingStatus,
    /// Hold deadline; only meaningful while the booking is Pending.
    pub expires_at: DateTime<Utc>,
    pub booked_at: DateTime<Utc>,
}

impl Booking {
    /// Creates a new pending hold expiring [`HOLD_TTL_HOURS`] from `now`.
    pub fn hold(
        user_id: UserId,
        hotel_id: HotelId,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
        booking_type: BookingType,
        total_price: Money,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BookingId::new(),
            user_id,
            hotel_id,
            check_in,
            check_out,
            booking_type,
            total_price,
            paid_amount: None,
            status: BookingStatus::Pending,
            expires_at: now + Duration::hours(HOLD_TTL_HOURS),
            booked_at: now,
        }
    }

    /// Returns true if the pending hold deadline has passed.
    pub fn is_hold_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Interval overlap test against another reservation window.
    pub fn overlaps(&self, check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> bool {
        self.check_in < check_out && self.check_out > check_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 20, hour, 0, 0).unwrap()
    }

    #[test]
    fn default_status_is_pending() {
        assert_eq!(BookingStatus::default(), BookingStatus::Pending);
    }

    #[test]
    fn pending_can_confirm() {
        assert!(BookingStatus::Pending.can_confirm());
        assert!(!BookingStatus::Active.can_confirm());
        assert!(!BookingStatus::Completed.can_confirm());
        assert!(!BookingStatus::Cancelled.can_confirm());
    }

    #[test]
    fn can_cancel_from_pending_and_active_only() {
        assert!(BookingStatus::Pending.can_cancel());
        assert!(BookingStatus::Active.can_cancel());
        assert!(!BookingStatus::Completed.can_cancel());
        assert!(!BookingStatus::Cancelled.can_cancel());
    }

    #[test]
    fn active_can_complete() {
        assert!(!BookingStatus::Pending.can_complete());
        assert!(BookingStatus::Active.can_complete());
        assert!(!BookingStatus::Completed.can_complete());
        assert!(!BookingStatus::Cancelled.can_complete());
    }

    #[test]
    fn terminal_states() {
        assert!(!BookingStatus::Pending.is_terminal());
        assert!(!BookingStatus::Active.is_terminal());
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
    }

    #[test]
    fn status_parse_roundtrip() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Active,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("paused"), None);
    }

    #[test]
    fn type_parse_roundtrip() {
        for ty in [
            BookingType::PerHour,
            BookingType::PerDay,
            BookingType::Overnight,
        ] {
            assert_eq!(BookingType::parse(ty.as_str()), Some(ty));
        }
        assert_eq!(BookingType::parse("weekly"), None);
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&BookingStatus::Active).unwrap();
        assert_eq!(json, "\"active\"");
    }

    #[test]
    fn hold_starts_pending_with_deadline() {
        let now = at(10);
        let booking = Booking::hold(
            UserId::new(),
            HotelId::new(),
            at(12),
            at(14),
            BookingType::PerHour,
            Money::from_minor(100_000),
            now,
        );

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.expires_at, now + Duration::hours(24));
        assert_eq!(booking.booked_at, now);
        assert!(booking.paid_amount.is_none());
    }

    #[test]
    fn hold_expiry_check() {
        let now = at(10);
        let booking = Booking::hold(
            UserId::new(),
            HotelId::new(),
            at(12),
            at(14),
            BookingType::PerHour,
            Money::from_minor(100_000),
            now,
        );

        assert!(!booking.is_hold_expired(now));
        assert!(booking.is_hold_expired(now + Duration::hours(24)));
        assert!(booking.is_hold_expired(now + Duration::hours(25)));
    }

    #[test]
    fn overlap_detection() {
        let booking = Booking::hold(
            UserId::new(),
            HotelId::new(),
            at(12),
            at(16),
            BookingType::PerHour,
            Money::from_minor(100_000),
            at(10),
        );

        // Overlapping windows
        assert!(booking.overlaps(at(14), at(18)));
        assert!(booking.overlaps(at(10), at(13)));
        assert!(booking.overlaps(at(13), at(15)));

        // Touching endpoints do not overlap
        assert!(!booking.overlaps(at(16), at(18)));
        assert!(!booking.overlaps(at(10), at(12)));
    }
}
