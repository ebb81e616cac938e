//! Storage layer for the hotel-booking system.
//!
//! Every consistency-critical operation is exposed as a single call that
//! bundles its guard condition with its mutation (decrement only if
//! positive, transition only if still in the expected state, increment a
//! usage counter only while below the limit). The in-memory backend runs
//! each such call inside one write critical section; the PostgreSQL
//! backend issues one guarded `UPDATE` and inspects the affected row
//! count. Callers never read-modify-write shared counters.

pub mod bookings;
pub mod discounts;
pub mod error;
pub mod hotels;
pub mod memory;
pub mod payments;
pub mod postgres;

pub use bookings::BookingStore;
pub use discounts::{DiscountStore, RedeemStatus};
pub use error::{Result, StoreError};
pub use hotels::HotelStore;
pub use memory::{
    InMemoryBookingStore, InMemoryDiscountStore, InMemoryHotelStore, InMemoryPaymentStore,
};
pub use payments::PaymentStore;
pub use postgres::{
    PgBookingStore, PgDiscountStore, PgHotelStore, PgPaymentStore, run_migrations,
};
