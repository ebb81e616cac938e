//! Booking lifecycle services.
//!
//! This crate orchestrates the booking state machine, payment settlement,
//! and discount redemption over the storage layer:
//! - `BookingService` — holds, confirmation, cancellation, and the two
//!   booking reconciliation sweeps
//! - `PaymentService` — instant/deferred settlement with atomic discount
//!   application and capacity compensation
//! - `DiscountService` — code administration, non-consuming previews, and
//!   the expiry sweep
//!
//! Services take their collaborators by constructor injection and rely
//! exclusively on the stores' conditional updates for concurrency safety;
//! there are no in-process locks here.

pub mod booking;
pub mod discount;
pub mod error;
pub mod notify;
pub mod payment;

pub use booking::{
    BookingHistoryEntry, BookingService, CancelActor, CompletionReport, CreateBooking,
};
pub use discount::{CreateDiscount, DiscountService};
pub use error::{Result, ServiceError};
pub use notify::{InMemoryNotificationSink, NotificationSink, NotifyError};
pub use payment::{PayBooking, PaymentService};
