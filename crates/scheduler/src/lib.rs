//! Periodic reconciliation for the booking system.
//!
//! Each tick runs three independent, order-insensitive sweeps:
//! completing past-due active bookings, cancelling expired pending holds,
//! and deleting expired discounts. Every sweep is guarded by its own
//! conditional updates, so a missed or doubled tick only changes the
//! latency of state transitions, never correctness.

use std::time::Duration;

use services::{BookingService, DiscountService};
use store::{BookingStore, DiscountStore, HotelStore, PaymentStore};

/// Counters from one reconciliation tick.
#[derive(Debug, Default, Clone, Copy)]
pub struct SweepReport {
    /// Active bookings moved to Completed.
    pub completed: usize,
    /// Pending holds cancelled past their deadline.
    pub expired_holds: usize,
    /// Discount codes deleted past their deadline.
    pub expired_discounts: u64,
    /// Per-entity failures collected across all three sweeps.
    pub errors: usize,
}

/// Drives the reconciliation sweeps on a fixed period.
pub struct Reconciler<H, B, P, D> {
    bookings: BookingService<H, B, P>,
    discounts: DiscountService<D>,
    period: Duration,
}

impl<H, B, P, D> Reconciler<H, B, P, D>
where
    H: HotelStore,
    B: BookingStore,
    P: PaymentStore,
    D: DiscountStore,
{
    /// Creates a new reconciler.
    pub fn new(
        bookings: BookingService<H, B, P>,
        discounts: DiscountService<D>,
        period: Duration,
    ) -> Self {
        Self {
            bookings,
            discounts,
            period,
        }
    }

    /// Runs the three sweeps once.
    ///
    /// A sweep failure is recorded and never aborts the others.
    #[tracing::instrument(skip(self))]
    pub async fn tick(&self) -> SweepReport {
        let mut report = SweepReport::default();

        match self.bookings.complete_due().await {
            Ok(completion) => {
                report.completed = completion.completed;
                report.errors += completion.errors.len();
            }
            Err(err) => {
                tracing::error!(error = %err, "completion sweep failed");
                report.errors += 1;
            }
        }

        match self.bookings.expire_pending().await {
            Ok(cancelled) => report.expired_holds = cancelled.len(),
            Err(err) => {
                tracing::error!(error = %err, "hold expiry sweep failed");
                report.errors += 1;
            }
        }

        match self.discounts.expire().await {
            Ok(deleted) => report.expired_discounts = deleted,
            Err(err) => {
                tracing::error!(error = %err, "discount expiry sweep failed");
                report.errors += 1;
            }
        }

        metrics::counter!("reconciler_ticks_total").increment(1);
        if report.errors > 0 {
            metrics::counter!("reconciler_errors_total").increment(report.errors as u64);
        }

        report
    }

    /// Drives `tick` forever on the configured period.
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let report = self.tick().await;
            tracing::info!(
                completed = report.completed,
                expired_holds = report.expired_holds,
                expired_discounts = report.expired_discounts,
                errors = report.errors,
                "reconciliation sweep finished"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};
    use common::UserId;
    use domain::{Booking, BookingStatus, BookingType, Discount, Hotel, Money};
    use store::{
        InMemoryBookingStore, InMemoryDiscountStore, InMemoryHotelStore, InMemoryPaymentStore,
    };

    struct Fixture {
        hotels: InMemoryHotelStore,
        bookings: InMemoryBookingStore,
        discounts: InMemoryDiscountStore,
        reconciler: Reconciler<
            InMemoryHotelStore,
            InMemoryBookingStore,
            InMemoryPaymentStore,
            InMemoryDiscountStore,
        >,
    }

    fn fixture() -> Fixture {
        let hotels = InMemoryHotelStore::new();
        let bookings = InMemoryBookingStore::new();
        let payments = InMemoryPaymentStore::new();
        let discounts = InMemoryDiscountStore::new();

        let reconciler = Reconciler::new(
            BookingService::new(hotels.clone(), bookings.clone(), payments),
            DiscountService::new(discounts.clone()),
            Duration::from_secs(3600),
        );

        Fixture {
            hotels,
            bookings,
            discounts,
            reconciler,
        }
    }

    async fn seed_hotel(f: &Fixture, rooms: u32) -> Hotel {
        let hotel = Hotel::new(
            "Sweep Hotel",
            rooms,
            None,
            Some(Money::from_minor(500_000)),
        );
        f.hotels.insert(hotel.clone()).await.unwrap();
        hotel
    }

    #[tokio::test]
    async fn tick_runs_all_three_sweeps() {
        let f = fixture();
        let hotel = seed_hotel(&f, 2).await;
        let now = Utc::now();

        // A past-due active booking holding one room
        let created = now - ChronoDuration::days(3);
        let due = Booking::hold(
            UserId::new(),
            hotel.id,
            created,
            created + ChronoDuration::days(1),
            BookingType::PerDay,
            Money::from_minor(500_000),
            created,
        );
        let due_id = due.id;
        f.bookings.insert(due).await.unwrap();
        f.hotels.try_reserve_room(hotel.id).await.unwrap();
        f.bookings
            .activate_if_pending(due_id, None)
            .await
            .unwrap()
            .unwrap();

        // An expired pending hold
        let stale = Booking::hold(
            UserId::new(),
            hotel.id,
            now + ChronoDuration::days(1),
            now + ChronoDuration::days(2),
            BookingType::PerDay,
            Money::from_minor(500_000),
            now - ChronoDuration::hours(25),
        );
        let stale_id = stale.id;
        f.bookings.insert(stale).await.unwrap();

        // An expired discount
        f.discounts
            .insert(Discount::new("OLD", 10, 1, Some(now - ChronoDuration::hours(1))))
            .await
            .unwrap();

        let report = f.reconciler.tick().await;
        assert_eq!(report.completed, 1);
        assert_eq!(report.expired_holds, 1);
        assert_eq!(report.expired_discounts, 1);
        assert_eq!(report.errors, 0);

        assert_eq!(
            f.bookings.get(due_id).await.unwrap().unwrap().status,
            BookingStatus::Completed
        );
        assert_eq!(
            f.bookings.get(stale_id).await.unwrap().unwrap().status,
            BookingStatus::Cancelled
        );
        assert_eq!(
            f.hotels.get(hotel.id).await.unwrap().unwrap().available_rooms,
            2
        );
        assert!(f.discounts.get_by_code("OLD").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn doubled_tick_is_a_no_op() {
        let f = fixture();
        let hotel = seed_hotel(&f, 1).await;
        let now = Utc::now();

        let stale = Booking::hold(
            UserId::new(),
            hotel.id,
            now + ChronoDuration::days(1),
            now + ChronoDuration::days(2),
            BookingType::PerDay,
            Money::from_minor(500_000),
            now - ChronoDuration::hours(25),
        );
        f.bookings.insert(stale).await.unwrap();

        let first = f.reconciler.tick().await;
        assert_eq!(first.expired_holds, 1);

        let second = f.reconciler.tick().await;
        assert_eq!(second.expired_holds, 0);
        assert_eq!(second.completed, 0);
        assert_eq!(second.errors, 0);
    }

    #[tokio::test]
    async fn tick_on_empty_stores_reports_nothing() {
        let f = fixture();
        let report = f.reconciler.tick().await;
        assert_eq!(report.completed, 0);
        assert_eq!(report.expired_holds, 0);
        assert_eq!(report.expired_discounts, 0);
        assert_eq!(report.errors, 0);
    }
}
