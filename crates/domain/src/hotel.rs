//! Hotel entity: room inventory counters and per-unit pricing.

use chrono::{DateTime, Utc};
use common::HotelId;
use serde::{Deserialize, Serialize};

use crate::booking::BookingType;
use crate::error::DomainError;
use crate::money::Money;

/// A hotel and its room inventory.
///
/// `available_rooms` is the single source of truth for "can a reservation
/// be made"; it is mutated only through the store's conditional decrement
/// and the reversal increment, never set directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hotel {
    pub id: HotelId,
    pub name: String,
    pub total_rooms: u32,
    /// Invariant: `0 <= available_rooms <= total_rooms`.
    pub available_rooms: u32,
    pub price_hour: Option<Money>,
    pub price_day: Option<Money>,
}

impl Hotel {
    /// Creates a hotel with all rooms available.
    pub fn new(
        name: impl Into<String>,
        total_rooms: u32,
        price_hour: Option<Money>,
        price_day: Option<Money>,
    ) -> Self {
        Self {
            id: HotelId::new(),
            name: name.into(),
            total_rooms,
            available_rooms: total_rooms,
            price_hour,
            price_day,
        }
    }

    /// Returns true if at least one room is free.
    pub fn has_capacity(&self) -> bool {
        self.available_rooms > 0
    }

    /// Returns the configured per-unit price for a booking type, if usable.
    ///
    /// Per-hour bookings use the hourly rate; per-day and overnight
    /// bookings both use the daily rate.
    pub fn unit_price(&self, booking_type: BookingType) -> Option<Money> {
        let price = match booking_type {
            BookingType::PerHour => self.price_hour,
            BookingType::PerDay | BookingType::Overnight => self.price_day,
        };
        price.filter(Money::is_positive)
    }

    /// Computes the total price for a stay.
    ///
    /// Duration is billed in whole hours (ceiling), or whole days
    /// (ceiling of hours / 24) for day-based types.
    pub fn quote(
        &self,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
        booking_type: BookingType,
    ) -> Result<Money, DomainError> {
        let seconds = (check_out - check_in).num_seconds();
        if seconds <= 0 {
            return Err(DomainError::InvalidRange {
                check_in,
                check_out,
            });
        }

        let hours = (seconds as u64).div_ceil(3600) as i64;
        let units = match booking_type {
            BookingType::PerHour => hours,
            BookingType::PerDay | BookingType::Overnight => (hours as u64).div_ceil(24) as i64,
        };

        let unit_price = self
            .unit_price(booking_type)
            .ok_or(DomainError::PricingUnavailable { booking_type })?;

        Ok(unit_price.multiply(units))
    }
}
