//! Hotel inventory store.

use async_trait::async_trait;
use common::HotelId;
use domain::Hotel;

use crate::error::Result;

/// Storage for hotels and their room counters.
///
/// `try_reserve_room` is the authoritative capacity check: the guard
/// (`available_rooms > 0`) and the decrement happen in one round trip, so
/// two concurrent reservations can never both consume the last room.
#[async_trait]
pub trait HotelStore: Send + Sync {
    /// Inserts a hotel.
    async fn insert(&self, hotel: Hotel) -> Result<()>;

    /// Retrieves a hotel by ID.
    async fn get(&self, id: HotelId) -> Result<Option<Hotel>>;

    /// Atomically decrements `available_rooms` if it is positive.
    ///
    /// Returns false when no room could be taken (counter at zero or
    /// hotel missing).
    async fn try_reserve_room(&self, id: HotelId) -> Result<bool>;

    /// Returns one room to the hotel's available pool.
    ///
    /// Unconditional increment: every call site reverses a prior
    /// successful decrement.
    async fn release_room(&self, id: HotelId) -> Result<()>;
}
