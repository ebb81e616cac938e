//! Payment settlement.

use chrono::Utc;
use common::{BookingId, UserId};
use domain::{DomainError, Payment, PaymentMethod};
use store::{BookingStore, DiscountStore, HotelStore, PaymentStore, RedeemStatus};

use crate::error::{Result, ServiceError};
use crate::notify::NotificationSink;

/// Request to settle a booking.
#[derive(Debug, Clone)]
pub struct PayBooking {
    pub booking_id: BookingId,
    pub method: PaymentMethod,
    pub discount_code: Option<String>,
}

/// Service converting pending bookings into paid, active ones.
pub struct PaymentService<H, B, P, D, N> {
    hotels: H,
    bookings: B,
    payments: P,
    discounts: D,
    notifications: N,
}

impl<H, B, P, D, N> PaymentService<H, B, P, D, N>
where
    H: HotelStore,
    B: BookingStore,
    P: PaymentStore,
    D: DiscountStore,
    N: NotificationSink,
{
    /// Creates a new payment service.
    pub fn new(hotels: H, bookings: B, payments: P, discounts: D, notifications: N) -> Self {
        Self {
            hotels,
            bookings,
            payments,
            discounts,
            notifications,
        }
    }

    /// Settles a booking.
    ///
    /// Instant methods commit one room of capacity and activate the
    /// booking synchronously; deferred methods only record a pending
    /// payment and leave the booking untouched. A discount code is
    /// redeemed before any capacity change, and a redemption that
    /// committed before a `NoCapacity` failure stays committed.
    #[tracing::instrument(skip(self))]
    pub async fn pay(&self, user_id: UserId, req: PayBooking) -> Result<Payment> {
        metrics::counter!("payment_attempts_total").increment(1);
        let now = Utc::now();

        let booking = self
            .bookings
            .get(req.booking_id)
            .await?
            .ok_or(ServiceError::BookingNotFound(req.booking_id))?;
        self.hotels
            .get(booking.hotel_id)
            .await?
            .ok_or(ServiceError::HotelNotFound(booking.hotel_id))?;

        if booking.user_id != user_id {
            return Err(ServiceError::NotOwner {
                booking_id: booking.id,
            });
        }
        if self.payments.settled_exists(booking.id).await? {
            return Err(ServiceError::AlreadyPaid(booking.id));
        }
        if !booking.status.can_confirm() {
            return Err(DomainError::InvalidState {
                status: booking.status,
                action: "pay for",
            }
            .into());
        }

        let mut discount_pct = 0u8;
        if let Some(code) = &req.discount_code {
            match self.discounts.redeem(code, user_id, now).await? {
                RedeemStatus::Applied { value } => discount_pct = value,
                RedeemStatus::LimitReached { max_usage } => {
                    return Err(DomainError::LimitReached { max_usage }.into());
                }
                RedeemStatus::Expired { expires_at } => {
                    return Err(DomainError::DiscountExpired { expires_at }.into());
                }
                RedeemStatus::NotFound => {
                    return Err(ServiceError::DiscountNotFound { code: code.clone() });
                }
            }
        }
        let final_amount = booking.total_price.discounted_by(discount_pct);

        if !req.method.is_instant() {
            let payment = Payment::deferred(
                booking.id,
                user_id,
                req.method,
                req.discount_code,
                final_amount,
                now,
            );
            self.payments.insert(payment.clone()).await?;
            tracing::info!(booking_id = %booking.id, method = %req.method, "deferred payment recorded");
            return Ok(payment);
        }

        // Authoritative capacity check. The redemption above is not rolled
        // back on failure.
        if !self.hotels.try_reserve_room(booking.hotel_id).await? {
            return Err(ServiceError::NoCapacity);
        }

        if self
            .bookings
            .activate_if_pending(booking.id, Some(final_amount))
            .await?
            .is_none()
        {
            // A concurrent pay/confirm moved the booking out of Pending;
            // the decrement just taken must be handed back.
            self.hotels.release_room(booking.hotel_id).await?;
            return Err(ServiceError::AlreadyProcessed(booking.id));
        }

        let payment = Payment::settled(
            booking.id,
            user_id,
            req.method,
            req.discount_code,
            final_amount,
            now,
        );
        self.payments.insert(payment.clone()).await?;

        metrics::counter!("payments_settled_total").increment(1);
        tracing::info!(
            booking_id = %booking.id,
            amount = %final_amount,
            method = %payment.method,
            "payment settled"
        );

        let message = format!(
            "Payment of {} received for booking {}",
            final_amount, booking.id
        );
        if let Err(err) = self.notifications.send(user_id, &message).await {
            tracing::warn!(
                booking_id = %booking.id,
                error = %err,
                "notification sink failed after settlement"
            );
        }

        Ok(payment)
    }
}
