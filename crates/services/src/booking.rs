//! Booking service: holds, confirmation, cancellation, queries, and the
//! booking reconciliation sweeps.

use chrono::{DateTime, Utc};
use common::{BookingId, HotelId, UserId};
use domain::{Booking, BookingStatus, BookingType, DomainError, Money};
use store::{BookingStore, HotelStore, PaymentStore};

use crate::error::{Result, ServiceError};

/// Request to create a booking hold.
#[derive(Debug, Clone)]
pub struct CreateBooking {
    pub hotel_id: HotelId,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub booking_type: BookingType,
}

/// Who is asking for a cancellation.
///
/// Users may only cancel their own bookings; admins skip the ownership
/// check.
#[derive(Debug, Clone, Copy)]
pub enum CancelActor {
    User(UserId),
    Admin,
}

/// A user-facing booking history row.
///
/// `price` is the amount that actually mattered for the stay: the settled
/// amount if the booking was paid, else the recorded payment amount, else
/// the quoted total.
#[derive(Debug, Clone)]
pub struct BookingHistoryEntry {
    pub booking_id: BookingId,
    pub hotel_id: HotelId,
    pub status: BookingStatus,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub booking_type: BookingType,
    pub price: Money,
    pub booked_at: DateTime<Utc>,
}

/// Result of a completion sweep.
#[derive(Debug, Default)]
pub struct CompletionReport {
    /// Bookings moved to Completed with their room returned.
    pub completed: usize,
    /// Per-booking failures; the sweep continues past each one.
    pub errors: Vec<(BookingId, ServiceError)>,
}

/// Service owning the booking lifecycle.
pub struct BookingService<H, B, P> {
    hotels: H,
    bookings: B,
    payments: P,
}

impl<H, B, P> BookingService<H, B, P>
where
    H: HotelStore,
    B: BookingStore,
    P: PaymentStore,
{
    /// Creates a new booking service.
    pub fn new(hotels: H, bookings: B, payments: P) -> Self {
        Self {
            hotels,
            bookings,
            payments,
        }
    }

    /// Creates a pending hold for a stay.
    ///
    /// The capacity check here is advisory: concurrent creates may admit
    /// more holds than rooms remain, and the surplus fails later at the
    /// confirm/pay-time conditional decrement.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, user_id: UserId, req: CreateBooking) -> Result<Booking> {
        if req.check_in >= req.check_out {
            return Err(DomainError::InvalidRange {
                check_in: req.check_in,
                check_out: req.check_out,
            }
            .into());
        }

        let hotel = self
            .hotels
            .get(req.hotel_id)
            .await?
            .ok_or(ServiceError::HotelNotFound(req.hotel_id))?;

        if !hotel.has_capacity() {
            return Err(ServiceError::NoCapacity);
        }

        let total_price = hotel.quote(req.check_in, req.check_out, req.booking_type)?;

        let overlapping = self
            .bookings
            .count_overlapping(req.hotel_id, req.check_in, req.check_out)
            .await?;
        if overlapping >= u64::from(hotel.available_rooms) {
            return Err(ServiceError::NoCapacity);
        }

        let booking = Booking::hold(
            user_id,
            req.hotel_id,
            req.check_in,
            req.check_out,
            req.booking_type,
            total_price,
            Utc::now(),
        );
        self.bookings.insert(booking.clone()).await?;

        metrics::counter!("bookings_created_total").increment(1);
        tracing::info!(booking_id = %booking.id, hotel_id = %req.hotel_id, "hold created");

        Ok(booking)
    }

    /// Confirms a pending hold, committing one room of capacity.
    ///
    /// The conditional decrement is the authoritative capacity check. If a
    /// pending payment exists it is settled and its amount mirrored into
    /// the booking.
    #[tracing::instrument(skip(self))]
    pub async fn confirm(&self, booking_id: BookingId) -> Result<Booking> {
        let booking = self
            .bookings
            .get(booking_id)
            .await?
            .ok_or(ServiceError::BookingNotFound(booking_id))?;

        if !booking.status.can_confirm() {
            return Err(DomainError::NotPending {
                status: booking.status,
            }
            .into());
        }
        if booking.is_hold_expired(Utc::now()) {
            return Err(DomainError::HoldExpired {
                expires_at: booking.expires_at,
            }
            .into());
        }

        if !self.hotels.try_reserve_room(booking.hotel_id).await? {
            return Err(ServiceError::NoCapacity);
        }

        let pending_payment = self.payments.pending_for_booking(booking_id).await?;
        let paid_amount = pending_payment.as_ref().map(|p| p.amount);

        match self
            .bookings
            .activate_if_pending(booking_id, paid_amount)
            .await?
        {
            Some(active) => {
                if pending_payment.is_some() {
                    self.payments.settle_pending(booking_id).await?;
                }
                metrics::counter!("bookings_confirmed_total").increment(1);
                Ok(active)
            }
            None => {
                // A concurrent pay/confirm won; hand the room back before
                // surfacing the error.
                self.hotels.release_room(booking.hotel_id).await?;
                Err(ServiceError::AlreadyProcessed(booking_id))
            }
        }
    }

    /// Cancels a pending or active booking.
    ///
    /// An Active cancellation returns the committed room; a Pending one
    /// never held capacity. The transition is guarded on the observed
    /// status so a racing sweep cannot cause a double release.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, booking_id: BookingId, actor: CancelActor) -> Result<Booking> {
        let booking = self
            .bookings
            .get(booking_id)
            .await?
            .ok_or(ServiceError::BookingNotFound(booking_id))?;

        if let CancelActor::User(user_id) = actor
            && booking.user_id != user_id
        {
            return Err(ServiceError::NotOwner { booking_id });
        }

        if !booking.status.can_cancel() {
            return Err(DomainError::InvalidState {
                status: booking.status,
                action: "cancel",
            }
            .into());
        }

        let was_active = booking.status == BookingStatus::Active;
        match self
            .bookings
            .transition(booking_id, booking.status, BookingStatus::Cancelled)
            .await?
        {
            Some(cancelled) => {
                if was_active {
                    self.hotels.release_room(booking.hotel_id).await?;
                }
                metrics::counter!("bookings_cancelled_total").increment(1);
                Ok(cancelled)
            }
            None => Err(ServiceError::AlreadyProcessed(booking_id)),
        }
    }

    /// Scheduler entry point: completes every active booking whose stay
    /// has ended, returning its room to the hotel.
    ///
    /// Each booking is processed independently; failures are collected,
    /// never raised.
    #[tracing::instrument(skip(self))]
    pub async fn complete_due(&self) -> Result<CompletionReport> {
        let due = self.bookings.list_due_active(Utc::now()).await?;
        let mut report = CompletionReport::default();

        for booking in due {
            match self
                .bookings
                .transition(booking.id, BookingStatus::Active, BookingStatus::Completed)
                .await
            {
                Ok(Some(_)) => {
                    if let Err(err) = self.hotels.release_room(booking.hotel_id).await {
                        tracing::error!(
                            booking_id = %booking.id,
                            error = %err,
                            "failed to release room for completed booking"
                        );
                        report.errors.push((booking.id, err.into()));
                    } else {
                        report.completed += 1;
                    }
                }
                // A cancel won the race and already handled the room.
                Ok(None) => {}
                Err(err) => {
                    tracing::error!(
                        booking_id = %booking.id,
                        error = %err,
                        "failed to complete booking"
                    );
                    report.errors.push((booking.id, err.into()));
                }
            }
        }

        if report.completed > 0 {
            metrics::counter!("bookings_completed_total").increment(report.completed as u64);
        }
        Ok(report)
    }

    /// Scheduler entry point: cancels pending holds past their deadline.
    ///
    /// No inventory adjustment is needed: pending holds never decremented
    /// capacity.
    #[tracing::instrument(skip(self))]
    pub async fn expire_pending(&self) -> Result<Vec<BookingId>> {
        let cancelled = self.bookings.cancel_expired_pending(Utc::now()).await?;
        if !cancelled.is_empty() {
            metrics::counter!("holds_expired_total").increment(cancelled.len() as u64);
        }
        Ok(cancelled)
    }

    /// Lists a user's bookings with the given status, newest first.
    pub async fn bookings_for_user(
        &self,
        user_id: UserId,
        status: BookingStatus,
    ) -> Result<Vec<Booking>> {
        Ok(self.bookings.list_by_user(user_id, status).await?)
    }

    /// Returns a user's booking history rows for the given status.
    #[tracing::instrument(skip(self))]
    pub async fn booking_history(
        &self,
        user_id: UserId,
        status: BookingStatus,
    ) -> Result<Vec<BookingHistoryEntry>> {
        let bookings = self.bookings.list_by_user(user_id, status).await?;

        let mut entries = Vec::with_capacity(bookings.len());
        for booking in bookings {
            let price = match booking.paid_amount {
                Some(paid) => paid,
                None => self
                    .payments
                    .amount_for_booking(booking.id)
                    .await?
                    .unwrap_or(booking.total_price),
            };
            entries.push(BookingHistoryEntry {
                booking_id: booking.id,
                hotel_id: booking.hotel_id,
                status: booking.status,
                check_in: booking.check_in,
                check_out: booking.check_out,
                booking_type: booking.booking_type,
                price,
                booked_at: booking.booked_at,
            });
        }
        Ok(entries)
    }
}
