//! Discount codes with per-user usage allowances.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{DiscountId, UserId};
use serde::{Deserialize, Serialize};

/// A percentage discount code.
///
/// Redemption consumes one unit of the calling user's allowance; the
/// check and the counter increment are a single atomic store operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discount {
    pub id: DiscountId,
    /// Globally unique code, e.g. `SUMMER25`.
    pub code: String,
    /// Percentage off, 0-100.
    pub value: u8,
    pub description: Option<String>,
    /// Maximum number of redemptions a single user gets.
    pub max_usage: u32,
    /// Global deadline; the expiry sweep deletes the code after this.
    pub expires_at: Option<DateTime<Utc>>,
    /// Per-user redemption counters. Invariant: every count <= `max_usage`.
    pub used_by: HashMap<UserId, u32>,
}

impl Discount {
    /// Creates a new discount with no redemptions yet.
    pub fn new(
        code: impl Into<String>,
        value: u8,
        max_usage: u32,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: DiscountId::new(),
            code: code.into(),
            value,
            description: None,
            max_usage,
            expires_at,
            used_by: HashMap::new(),
        }
    }

    /// Returns true if the code is past its deadline.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|deadline| deadline < now)
    }

    /// Returns how many times the user has redeemed this code.
    pub fn usage_for(&self, user_id: &UserId) -> u32 {
        self.used_by.get(user_id).copied().unwrap_or(0)
    }

    /// Returns how many redemptions the user has left.
    pub fn remaining_for(&self, user_id: &UserId) -> u32 {
        self.max_usage.saturating_sub(self.usage_for(user_id))
    }
}
