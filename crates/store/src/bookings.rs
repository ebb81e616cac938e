//! Booking store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{BookingId, HotelId, UserId};
use domain::{Booking, BookingStatus, Money};

use crate::error::Result;

/// Storage for bookings.
///
/// State transitions are compare-and-swap operations keyed on the current
/// status; a transition that finds the booking already moved on returns
/// `None` and changes nothing. Bookings are never deleted.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Inserts a booking.
    async fn insert(&self, booking: Booking) -> Result<()>;

    /// Retrieves a booking by ID.
    async fn get(&self, id: BookingId) -> Result<Option<Booking>>;

    /// Counts Pending/Active bookings of a hotel whose stay window
    /// overlaps `[check_in, check_out)`.
    async fn count_overlapping(
        &self,
        hotel_id: HotelId,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    ) -> Result<u64>;

    /// Atomically moves a Pending booking to Active, recording the
    /// settled amount when given.
    ///
    /// Returns the updated booking, or `None` if the booking is missing
    /// or already left Pending.
    async fn activate_if_pending(
        &self,
        id: BookingId,
        paid_amount: Option<Money>,
    ) -> Result<Option<Booking>>;

    /// Atomically moves a booking from `from` to `to`.
    ///
    /// Returns the updated booking, or `None` if the booking is missing
    /// or no longer in `from`.
    async fn transition(
        &self,
        id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<Option<Booking>>;

    /// Lists Active bookings whose check-out is at or before `now`.
    async fn list_due_active(&self, now: DateTime<Utc>) -> Result<Vec<Booking>>;

    /// Bulk-cancels Pending bookings whose hold deadline is at or before
    /// `now`, returning the IDs that were transitioned.
    ///
    /// The status guard makes the sweep idempotent.
    async fn cancel_expired_pending(&self, now: DateTime<Utc>) -> Result<Vec<BookingId>>;

    /// Lists a user's bookings with the given status, newest first.
    async fn list_by_user(&self, user_id: UserId, status: BookingStatus) -> Result<Vec<Booking>>;
}
