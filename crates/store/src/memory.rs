//! In-memory store implementations.
//!
//! Each conditional operation takes the write lock once and performs its
//! guard check and mutation inside that single critical section, giving
//! the same atomicity as the PostgreSQL backend's guarded `UPDATE`s.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{BookingId, DiscountId, HotelId, PaymentId, UserId};
use domain::{Booking, BookingStatus, Discount, Hotel, Money, Payment, PaymentStatus};
use tokio::sync::RwLock;

use crate::bookings::BookingStore;
use crate::discounts::{DiscountStore, RedeemStatus};
use crate::error::Result;
use crate::hotels::HotelStore;
use crate::payments::PaymentStore;

/// In-memory hotel store.
#[derive(Clone, Default)]
pub struct InMemoryHotelStore {
    rows: Arc<RwLock<HashMap<HotelId, Hotel>>>,
}

impl InMemoryHotelStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HotelStore for InMemoryHotelStore {
    async fn insert(&self, hotel: Hotel) -> Result<()> {
        self.rows.write().await.insert(hotel.id, hotel);
        Ok(())
    }

    async fn get(&self, id: HotelId) -> Result<Option<Hotel>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn try_reserve_room(&self, id: HotelId) -> Result<bool> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&id) {
            Some(hotel) if hotel.available_rooms > 0 => {
                hotel.available_rooms -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_room(&self, id: HotelId) -> Result<()> {
        let mut rows = self.rows.write().await;
        if let Some(hotel) = rows.get_mut(&id) {
            hotel.available_rooms += 1;
        }
        Ok(())
    }
}

/// In-memory booking store.
#[derive(Clone, Default)]
pub struct InMemoryBookingStore {
    rows: Arc<RwLock<HashMap<BookingId, Booking>>>,
}

impl InMemoryBookingStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of bookings stored.
    pub async fn booking_count(&self) -> usize {
        self.rows.read().await.len()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert(&self, booking: Booking) -> Result<()> {
        self.rows.write().await.insert(booking.id, booking);
        Ok(())
    }

    async fn get(&self, id: BookingId) -> Result<Option<Booking>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn count_overlapping(
        &self,
        hotel_id: HotelId,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    ) -> Result<u64> {
        let rows = self.rows.read().await;
        let count = rows
            .values()
            .filter(|b| {
                b.hotel_id == hotel_id
                    && matches!(b.status, BookingStatus::Pending | BookingStatus::Active)
                    && b.overlaps(check_in, check_out)
            })
            .count();
        Ok(count as u64)
    }

    async fn activate_if_pending(
        &self,
        id: BookingId,
        paid_amount: Option<Money>,
    ) -> Result<Option<Booking>> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&id) {
            Some(booking) if booking.status == BookingStatus::Pending => {
                booking.status = BookingStatus::Active;
                if paid_amount.is_some() {
                    booking.paid_amount = paid_amount;
                }
                Ok(Some(booking.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn transition(
        &self,
        id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<Option<Booking>> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&id) {
            Some(booking) if booking.status == from => {
                booking.status = to;
                Ok(Some(booking.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn list_due_active(&self, now: DateTime<Utc>) -> Result<Vec<Booking>> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|b| b.status == BookingStatus::Active && b.check_out <= now)
            .cloned()
            .collect())
    }

    async fn cancel_expired_pending(&self, now: DateTime<Utc>) -> Result<Vec<BookingId>> {
        let mut rows = self.rows.write().await;
        let mut cancelled = Vec::new();
        for booking in rows.values_mut() {
            if booking.status == BookingStatus::Pending && booking.expires_at <= now {
                booking.status = BookingStatus::Cancelled;
                cancelled.push(booking.id);
            }
        }
        Ok(cancelled)
    }

    async fn list_by_user(&self, user_id: UserId, status: BookingStatus) -> Result<Vec<Booking>> {
        let rows = self.rows.read().await;
        let mut bookings: Vec<_> = rows
            .values()
            .filter(|b| b.user_id == user_id && b.status == status)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.booked_at.cmp(&a.booked_at));
        Ok(bookings)
    }
}

/// In-memory payment store.
#[derive(Clone, Default)]
pub struct InMemoryPaymentStore {
    rows: Arc<RwLock<HashMap<PaymentId, Payment>>>,
}

impl InMemoryPaymentStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of payment records stored.
    pub async fn payment_count(&self) -> usize {
        self.rows.read().await.len()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, payment: Payment) -> Result<()> {
        self.rows.write().await.insert(payment.id, payment);
        Ok(())
    }

    async fn settled_exists(&self, booking_id: BookingId) -> Result<bool> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .any(|p| p.booking_id == booking_id && p.status == PaymentStatus::Paid))
    }

    async fn pending_for_booking(&self, booking_id: BookingId) -> Result<Option<Payment>> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|p| p.booking_id == booking_id && p.status == PaymentStatus::Pending)
            .min_by_key(|p| p.created_at)
            .cloned())
    }

    async fn settle_pending(&self, booking_id: BookingId) -> Result<Option<Payment>> {
        let mut rows = self.rows.write().await;
        let pending = rows
            .values_mut()
            .filter(|p| p.booking_id == booking_id && p.status == PaymentStatus::Pending)
            .min_by_key(|p| p.created_at);
        match pending {
            Some(payment) => {
                payment.status = PaymentStatus::Paid;
                Ok(Some(payment.clone()))
            }
            None => Ok(None),
        }
    }

    async fn amount_for_booking(&self, booking_id: BookingId) -> Result<Option<Money>> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|p| p.booking_id == booking_id)
            .max_by_key(|p| p.created_at)
            .map(|p| p.amount))
    }
}

/// In-memory discount store.
#[derive(Clone, Default)]
pub struct InMemoryDiscountStore {
    rows: Arc<RwLock<HashMap<DiscountId, Discount>>>,
}

impl InMemoryDiscountStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of discounts stored.
    pub async fn discount_count(&self) -> usize {
        self.rows.read().await.len()
    }
}

#[async_trait]
impl DiscountStore for InMemoryDiscountStore {
    async fn insert(&self, discount: Discount) -> Result<bool> {
        let mut rows = self.rows.write().await;
        if rows.values().any(|d| d.code == discount.code) {
            return Ok(false);
        }
        rows.insert(discount.id, discount);
        Ok(true)
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Discount>> {
        let rows = self.rows.read().await;
        Ok(rows.values().find(|d| d.code == code).cloned())
    }

    async fn redeem(
        &self,
        code: &str,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<RedeemStatus> {
        let mut rows = self.rows.write().await;
        let Some(discount) = rows.values_mut().find(|d| d.code == code) else {
            return Ok(RedeemStatus::NotFound);
        };

        if let Some(expires_at) = discount.expires_at
            && expires_at < now
        {
            return Ok(RedeemStatus::Expired { expires_at });
        }

        let count = discount.used_by.entry(user_id).or_insert(0);
        if *count >= discount.max_usage {
            return Ok(RedeemStatus::LimitReached {
                max_usage: discount.max_usage,
            });
        }
        *count += 1;

        Ok(RedeemStatus::Applied {
            value: discount.value,
        })
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|_, d| !d.expires_at.is_some_and(|deadline| deadline <= now));
        Ok((before - rows.len()) as u64)
    }

    async fn remove(&self, code: &str) -> Result<bool> {
        let mut rows = self.rows.write().await;
        let id = rows.values().find(|d| d.code == code).map(|d| d.id);
        match id {
            Some(id) => {
                rows.remove(&id);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
