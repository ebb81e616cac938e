//! Reconciliation worker entry point.
//!
//! Composition root for the booking system: builds the stores for the
//! configured backend, wires the services into the reconciler, and drives
//! it until shutdown.

mod config;

use scheduler::Reconciler;
use services::{BookingService, DiscountService};
use store::{
    BookingStore, DiscountStore, HotelStore, InMemoryBookingStore, InMemoryDiscountStore,
    InMemoryHotelStore, InMemoryPaymentStore, PaymentStore, PgBookingStore, PgDiscountStore,
    PgHotelStore, PgPaymentStore,
};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use config::Config;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Runs the reconciler until a shutdown signal arrives.
async fn run_until_shutdown<H, B, P, D>(reconciler: Reconciler<H, B, P, D>)
where
    H: HotelStore,
    B: BookingStore,
    P: PaymentStore,
    D: DiscountStore,
{
    tokio::select! {
        () = reconciler.run() => {}
        () = shutdown_signal() => {}
    }
}

#[tokio::main]
async fn main() {
    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Wire stores and services for the configured backend
    let config = Config::from_env();
    let period = config.reconcile_interval();
    tracing::info!(
        interval_secs = config.reconcile_interval_secs,
        backend = if config.database_url.is_some() {
            "postgres"
        } else {
            "memory"
        },
        "starting reconciliation worker"
    );

    match &config.database_url {
        Some(url) => {
            let pool = sqlx::PgPool::connect(url)
                .await
                .expect("failed to connect to PostgreSQL");
            store::run_migrations(&pool)
                .await
                .expect("failed to run migrations");

            let hotels = PgHotelStore::new(pool.clone());
            let bookings = PgBookingStore::new(pool.clone());
            let payments = PgPaymentStore::new(pool.clone());
            let discounts = PgDiscountStore::new(pool);

            let reconciler = Reconciler::new(
                BookingService::new(hotels, bookings, payments),
                DiscountService::new(discounts),
                period,
            );
            run_until_shutdown(reconciler).await;
        }
        None => {
            let hotels = InMemoryHotelStore::new();
            let bookings = InMemoryBookingStore::new();
            let payments = InMemoryPaymentStore::new();
            let discounts = InMemoryDiscountStore::new();

            let reconciler = Reconciler::new(
                BookingService::new(hotels, bookings, payments),
                DiscountService::new(discounts),
                period,
            );
            run_until_shutdown(reconciler).await;
        }
    }

    tracing::info!("worker shut down gracefully");
}
