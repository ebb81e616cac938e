//! Payment store.

use async_trait::async_trait;
use common::BookingId;
use domain::{Money, Payment};

use crate::error::Result;

/// Storage for payment records.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Inserts a payment.
    async fn insert(&self, payment: Payment) -> Result<()>;

    /// Returns true if a settled (Paid) payment exists for the booking.
    async fn settled_exists(&self, booking_id: BookingId) -> Result<bool>;

    /// Returns a pending payment for the booking, if any.
    async fn pending_for_booking(&self, booking_id: BookingId) -> Result<Option<Payment>>;

    /// Atomically settles one pending payment of the booking
    /// (Pending → Paid), returning the updated record.
    ///
    /// Returns `None` if the booking has no pending payment.
    async fn settle_pending(&self, booking_id: BookingId) -> Result<Option<Payment>>;

    /// Returns the most recent payment amount recorded for the booking.
    async fn amount_for_booking(&self, booking_id: BookingId) -> Result<Option<Money>>;
}
