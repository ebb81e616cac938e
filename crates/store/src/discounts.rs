//! Discount ledger store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::UserId;
use domain::Discount;

use crate::error::Result;

/// Outcome of an atomic redemption attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemStatus {
    /// One usage was consumed; carries the percentage granted.
    Applied { value: u8 },

    /// The user's counter is already at the per-user limit.
    LimitReached { max_usage: u32 },

    /// The code is past its deadline.
    Expired { expires_at: DateTime<Utc> },

    /// No such code.
    NotFound,
}

/// Storage for discount codes and their per-user usage counters.
///
/// `redeem` performs the existence check and the counter increment as one
/// conditional update keyed on `(discount, user)`, so two concurrent
/// redemptions can never both take the last slot.
#[async_trait]
pub trait DiscountStore: Send + Sync {
    /// Inserts a discount. Returns false if the code is already taken.
    async fn insert(&self, discount: Discount) -> Result<bool>;

    /// Retrieves a discount by code.
    async fn get_by_code(&self, code: &str) -> Result<Option<Discount>>;

    /// Atomically consumes one unit of the user's allowance for the code.
    async fn redeem(&self, code: &str, user_id: UserId, now: DateTime<Utc>)
    -> Result<RedeemStatus>;

    /// Deletes every discount whose deadline is at or before `now`,
    /// returning how many were removed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;

    /// Deletes a discount by code. Returns false if the code is unknown.
    async fn remove(&self, code: &str) -> Result<bool>;
}
