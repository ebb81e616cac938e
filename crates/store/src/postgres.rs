//! PostgreSQL store implementations.
//!
//! Each conditional operation is a single guarded `UPDATE` checked via
//! the affected row count, so the condition and the mutation share one
//! round trip.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{BookingId, DiscountId, HotelId, PaymentId, UserId};
use domain::{
    Booking, BookingStatus, BookingType, Discount, Hotel, Money, Payment, PaymentMethod,
    PaymentStatus,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::bookings::BookingStore;
use crate::discounts::{DiscountStore, RedeemStatus};
use crate::error::{Result, StoreError};
use crate::hotels::HotelStore;
use crate::payments::PaymentStore;

/// Runs the database migrations.
pub async fn run_migrations(pool: &PgPool) -> std::result::Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

fn decode_u32(column: &'static str, value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| StoreError::Decode {
        column,
        value: value.to_string(),
    })
}

fn row_to_hotel(row: PgRow) -> Result<Hotel> {
    Ok(Hotel {
        id: HotelId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        total_rooms: decode_u32("total_rooms", row.try_get("total_rooms")?)?,
        available_rooms: decode_u32("available_rooms", row.try_get("available_rooms")?)?,
        price_hour: row
            .try_get::<Option<i64>, _>("price_hour")?
            .map(Money::from_minor),
        price_day: row
            .try_get::<Option<i64>, _>("price_day")?
            .map(Money::from_minor),
    })
}

fn row_to_booking(row: PgRow) -> Result<Booking> {
    let booking_type: String = row.try_get("booking_type")?;
    let status: String = row.try_get("status")?;

    Ok(Booking {
        id: BookingId::from_uuid(row.try_get::<Uuid, _>("id")?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        hotel_id: HotelId::from_uuid(row.try_get::<Uuid, _>("hotel_id")?),
        check_in: row.try_get("check_in")?,
        check_out: row.try_get("check_out")?,
        booking_type: BookingType::parse(&booking_type).ok_or(StoreError::Decode {
            column: "booking_type",
            value: booking_type,
        })?,
        total_price: Money::from_minor(row.try_get("total_price")?),
        paid_amount: row
            .try_get::<Option<i64>, _>("paid_amount")?
            .map(Money::from_minor),
        status: BookingStatus::parse(&status).ok_or(StoreError::Decode {
            column: "status",
            value: status,
        })?,
        expires_at: row.try_get("expires_at")?,
        booked_at: row.try_get("booked_at")?,
    })
}

fn row_to_payment(row: PgRow) -> Result<Payment> {
    let method: String = row.try_get("method")?;
    let status: String = row.try_get("status")?;

    Ok(Payment {
        id: PaymentId::from_uuid(row.try_get::<Uuid, _>("id")?),
        booking_id: BookingId::from_uuid(row.try_get::<Uuid, _>("booking_id")?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        method: PaymentMethod::parse(&method).ok_or(StoreError::Decode {
            column: "method",
            value: method,
        })?,
        discount_code: row.try_get("discount_code")?,
        amount: Money::from_minor(row.try_get("amount")?),
        status: PaymentStatus::parse(&status).ok_or(StoreError::Decode {
            column: "status",
            value: status,
        })?,
        created_at: row.try_get("created_at")?,
    })
}

/// PostgreSQL-backed hotel store.
#[derive(Clone)]
pub struct PgHotelStore {
    pool: PgPool,
}

impl PgHotelStore {
    /// Creates a new PostgreSQL hotel store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HotelStore for PgHotelStore {
    async fn insert(&self, hotel: Hotel) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO hotels (id, name, total_rooms, available_rooms, price_hour, price_day)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(hotel.id.as_uuid())
        .bind(&hotel.name)
        .bind(hotel.total_rooms as i32)
        .bind(hotel.available_rooms as i32)
        .bind(hotel.price_hour.map(|p| p.minor()))
        .bind(hotel.price_day.map(|p| p.minor()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: HotelId) -> Result<Option<Hotel>> {
        let row = sqlx::query("SELECT * FROM hotels WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_hotel).transpose()
    }

    async fn try_reserve_room(&self, id: HotelId) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE hotels
            SET available_rooms = available_rooms - 1
            WHERE id = $1 AND available_rooms > 0
            "#,
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn release_room(&self, id: HotelId) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE hotels
            SET available_rooms = available_rooms + 1
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// PostgreSQL-backed booking store.
#[derive(Clone)]
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    /// Creates a new PostgreSQL booking store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn insert(&self, booking: Booking) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, user_id, hotel_id, check_in, check_out, booking_type,
                                  total_price, paid_amount, status, expires_at, booked_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(booking.id.as_uuid())
        .bind(booking.user_id.as_uuid())
        .bind(booking.hotel_id.as_uuid())
        .bind(booking.check_in)
        .bind(booking.check_out)
        .bind(booking.booking_type.as_str())
        .bind(booking.total_price.minor())
        .bind(booking.paid_amount.map(|p| p.minor()))
        .bind(booking.status.as_str())
        .bind(booking.expires_at)
        .bind(booking.booked_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: BookingId) -> Result<Option<Booking>> {
        let row = sqlx::query("SELECT * FROM bookings WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_booking).transpose()
    }

    async fn count_overlapping(
        &self,
        hotel_id: HotelId,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    ) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM bookings
            WHERE hotel_id = $1
              AND status IN ('pending', 'active')
              AND check_in < $3
              AND check_out > $2
            "#,
        )
        .bind(hotel_id.as_uuid())
        .bind(check_in)
        .bind(check_out)
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }

    async fn activate_if_pending(
        &self,
        id: BookingId,
        paid_amount: Option<Money>,
    ) -> Result<Option<Booking>> {
        let row = sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'active', paid_amount = COALESCE($2, paid_amount)
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id.as_uuid())
        .bind(paid_amount.map(|p| p.minor()))
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_booking).transpose()
    }

    async fn transition(
        &self,
        id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<Option<Booking>> {
        let row = sqlx::query(
            r#"
            UPDATE bookings
            SET status = $3
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id.as_uuid())
        .bind(from.as_str())
        .bind(to.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_booking).transpose()
    }

    async fn list_due_active(&self, now: DateTime<Utc>) -> Result<Vec<Booking>> {
        let rows = sqlx::query(
            "SELECT * FROM bookings WHERE status = 'active' AND check_out <= $1",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_booking).collect()
    }

    async fn cancel_expired_pending(&self, now: DateTime<Utc>) -> Result<Vec<BookingId>> {
        let rows = sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'cancelled'
            WHERE status = 'pending' AND expires_at <= $1
            RETURNING id
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| Ok(BookingId::from_uuid(row.try_get::<Uuid, _>("id")?)))
            .collect()
    }

    async fn list_by_user(&self, user_id: UserId, status: BookingStatus) -> Result<Vec<Booking>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM bookings
            WHERE user_id = $1 AND status = $2
            ORDER BY booked_at DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_booking).collect()
    }
}

/// PostgreSQL-backed payment store.
#[derive(Clone)]
pub struct PgPaymentStore {
    pool: PgPool,
}

impl PgPaymentStore {
    /// Creates a new PostgreSQL payment store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentStore for PgPaymentStore {
    async fn insert(&self, payment: Payment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (id, booking_id, user_id, method, discount_code,
                                  amount, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.booking_id.as_uuid())
        .bind(payment.user_id.as_uuid())
        .bind(payment.method.as_str())
        .bind(&payment.discount_code)
        .bind(payment.amount.minor())
        .bind(payment.status.as_str())
        .bind(payment.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn settled_exists(&self, booking_id: BookingId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM payments WHERE booking_id = $1 AND status = 'paid')",
        )
        .bind(booking_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn pending_for_booking(&self, booking_id: BookingId) -> Result<Option<Payment>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM payments
            WHERE booking_id = $1 AND status = 'pending'
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(booking_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_payment).transpose()
    }

    async fn settle_pending(&self, booking_id: BookingId) -> Result<Option<Payment>> {
        let row = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'paid'
            WHERE id = (
                SELECT id FROM payments
                WHERE booking_id = $1 AND status = 'pending'
                ORDER BY created_at
                LIMIT 1
            )
            RETURNING *
            "#,
        )
        .bind(booking_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_payment).transpose()
    }

    async fn amount_for_booking(&self, booking_id: BookingId) -> Result<Option<Money>> {
        let amount: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT amount FROM payments
            WHERE booking_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(booking_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(amount.map(Money::from_minor))
    }
}

/// PostgreSQL-backed discount store.
#[derive(Clone)]
pub struct PgDiscountStore {
    pool: PgPool,
}

impl PgDiscountStore {
    /// Creates a new PostgreSQL discount store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_usages(&self, discount_id: DiscountId) -> Result<Vec<(UserId, u32)>> {
        let rows = sqlx::query(
            "SELECT user_id, used_count FROM discount_usages WHERE discount_id = $1",
        )
        .bind(discount_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| {
                let user_id = UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?);
                let count = decode_u32("used_count", row.try_get("used_count")?)?;
                Ok((user_id, count))
            })
            .collect()
    }
}

fn row_to_discount(row: PgRow) -> Result<Discount> {
    let value: i16 = row.try_get("value")?;
    Ok(Discount {
        id: DiscountId::from_uuid(row.try_get::<Uuid, _>("id")?),
        code: row.try_get("code")?,
        value: u8::try_from(value).map_err(|_| StoreError::Decode {
            column: "value",
            value: value.to_string(),
        })?,
        description: row.try_get("description")?,
        max_usage: decode_u32("max_usage", row.try_get("max_usage")?)?,
        expires_at: row.try_get("expires_at")?,
        used_by: Default::default(),
    })
}

#[async_trait]
impl DiscountStore for PgDiscountStore {
    async fn insert(&self, discount: Discount) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO discounts (id, code, value, description, max_usage, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(discount.id.as_uuid())
        .bind(&discount.code)
        .bind(i16::from(discount.value))
        .bind(&discount.description)
        .bind(discount.max_usage as i32)
        .bind(discount.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Discount>> {
        let row = sqlx::query("SELECT * FROM discounts WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut discount = row_to_discount(row)?;
        for (user_id, count) in self.load_usages(discount.id).await? {
            discount.used_by.insert(user_id, count);
        }
        Ok(Some(discount))
    }

    async fn redeem(
        &self,
        code: &str,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<RedeemStatus> {
        let row = sqlx::query("SELECT id, value, max_usage, expires_at FROM discounts WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(RedeemStatus::NotFound);
        };
        let discount_id: Uuid = row.try_get("id")?;
        let value: i16 = row.try_get("value")?;
        let value = u8::try_from(value).map_err(|_| StoreError::Decode {
            column: "value",
            value: value.to_string(),
        })?;
        let max_usage = decode_u32("max_usage", row.try_get("max_usage")?)?;
        let expires_at: Option<DateTime<Utc>> = row.try_get("expires_at")?;

        if let Some(expires_at) = expires_at
            && expires_at < now
        {
            return Ok(RedeemStatus::Expired { expires_at });
        }
        if max_usage == 0 {
            return Ok(RedeemStatus::LimitReached { max_usage });
        }

        // Single round trip: insert a fresh counter at 1, or increment the
        // existing one only while it is below the limit.
        let result = sqlx::query(
            r#"
            INSERT INTO discount_usages (discount_id, user_id, used_count)
            VALUES ($1, $2, 1)
            ON CONFLICT (discount_id, user_id)
            DO UPDATE SET used_count = discount_usages.used_count + 1
            WHERE discount_usages.used_count < $3
            "#,
        )
        .bind(discount_id)
        .bind(user_id.as_uuid())
        .bind(max_usage as i32)
        .execute(&self.pool)
        .await;

        match result {
            Ok(result) if result.rows_affected() == 1 => Ok(RedeemStatus::Applied { value }),
            Ok(_) => Ok(RedeemStatus::LimitReached { max_usage }),
            // The discount was deleted between the lookup and the upsert.
            Err(sqlx::Error::Database(db_err))
                if db_err.constraint() == Some("discount_usages_discount_id_fkey") =>
            {
                Ok(RedeemStatus::NotFound)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM discounts WHERE expires_at IS NOT NULL AND expires_at <= $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn remove(&self, code: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM discounts WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
