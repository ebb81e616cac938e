//! Discount administration and previews.

use chrono::{DateTime, Utc};
use common::UserId;
use domain::{Discount, DomainError};
use store::DiscountStore;

use crate::error::{Result, ServiceError};

/// Request to create a discount code.
#[derive(Debug, Clone)]
pub struct CreateDiscount {
    pub code: String,
    /// Percentage off, 0-100.
    pub value: u8,
    pub description: Option<String>,
    pub max_usage: u32,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Service owning discount codes.
///
/// Redemption itself is performed by the payment service through the
/// ledger's atomic `redeem`; this service covers administration, the
/// non-consuming preview, and the expiry sweep.
pub struct DiscountService<D> {
    discounts: D,
}

impl<D: DiscountStore> DiscountService<D> {
    /// Creates a new discount service.
    pub fn new(discounts: D) -> Self {
        Self { discounts }
    }

    /// Creates a discount code. Codes are globally unique.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, req: CreateDiscount) -> Result<Discount> {
        let mut discount = Discount::new(req.code, req.value, req.max_usage, req.expires_at);
        discount.description = req.description;

        if !self.discounts.insert(discount.clone()).await? {
            return Err(ServiceError::DiscountExists {
                code: discount.code,
            });
        }
        Ok(discount)
    }

    /// Returns the percentage a code would currently grant the user,
    /// without consuming any allowance.
    #[tracing::instrument(skip(self))]
    pub async fn preview(&self, code: &str, user_id: UserId) -> Result<u8> {
        let discount = self
            .discounts
            .get_by_code(code)
            .await?
            .ok_or_else(|| ServiceError::DiscountNotFound {
                code: code.to_string(),
            })?;

        if let Some(expires_at) = discount.expires_at
            && expires_at < Utc::now()
        {
            return Err(DomainError::DiscountExpired { expires_at }.into());
        }
        if discount.remaining_for(&user_id) == 0 {
            return Err(DomainError::LimitReached {
                max_usage: discount.max_usage,
            }
            .into());
        }

        Ok(discount.value)
    }

    /// Removes a discount code.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, code: &str) -> Result<()> {
        if !self.discounts.remove(code).await? {
            return Err(ServiceError::DiscountNotFound {
                code: code.to_string(),
            });
        }
        Ok(())
    }

    /// Scheduler entry point: deletes every discount past its deadline,
    /// returning how many were removed.
    #[tracing::instrument(skip(self))]
    pub async fn expire(&self) -> Result<u64> {
        let deleted = self.discounts.delete_expired(Utc::now()).await?;
        if deleted > 0 {
            metrics::counter!("discounts_expired_total").increment(deleted);
        }
        Ok(deleted)
    }
}
