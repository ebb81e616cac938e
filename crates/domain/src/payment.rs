//! Payment records and method classification.

use chrono::{DateTime, Utc};
use common::{BookingId, PaymentId, UserId};
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// The state of a payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Intent recorded, not yet settled.
    #[default]
    Pending,

    /// Settled; immutable from here on (terminal state).
    Paid,
}

impl PaymentStatus {
    /// Returns the status name as stored and displayed.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
        }
    }

    /// Parses a stored status name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Supported payment methods.
///
/// Instant methods settle and activate the booking synchronously;
/// deferred methods record intent without committing capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Credit,
    Atm,
    Momo,
    Zalopay,
    Shopeepay,
    BankTransfer,
    PayAtProperty,
}

impl PaymentMethod {
    /// Returns true for card/wallet-style methods that settle synchronously.
    pub fn is_instant(&self) -> bool {
        matches!(
            self,
            PaymentMethod::Credit
                | PaymentMethod::Atm
                | PaymentMethod::Momo
                | PaymentMethod::Zalopay
                | PaymentMethod::Shopeepay
        )
    }

    /// Returns the method name as stored and displayed.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Credit => "credit",
            PaymentMethod::Atm => "atm",
            PaymentMethod::Momo => "momo",
            PaymentMethod::Zalopay => "zalopay",
            PaymentMethod::Shopeepay => "shopeepay",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::PayAtProperty => "pay_at_property",
        }
    }

    /// Parses a stored method name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "credit" => Some(PaymentMethod::Credit),
            "atm" => Some(PaymentMethod::Atm),
            "momo" => Some(PaymentMethod::Momo),
            "zalopay" => Some(PaymentMethod::Zalopay),
            "shopeepay" => Some(PaymentMethod::Shopeepay),
            "bank_transfer" => Some(PaymentMethod::BankTransfer),
            "pay_at_property" => Some(PaymentMethod::PayAtProperty),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A payment attempt against a booking.
///
/// At most one payment per booking ever reaches [`PaymentStatus::Paid`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub booking_id: BookingId,
    pub user_id: UserId,
    pub method: PaymentMethod,
    /// The code applied at settlement, if any.
    pub discount_code: Option<String>,
    /// Post-discount amount.
    pub amount: Money,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Creates an already-settled payment (instant methods).
    pub fn settled(
        booking_id: BookingId,
        user_id: UserId,
        method: PaymentMethod,
        discount_code: Option<String>,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            booking_id,
            user_id,
            method,
            discount_code,
            amount,
            status: PaymentStatus::Paid,
            created_at: now,
        }
    }

    /// Creates a pending payment intent (deferred methods).
    pub fn deferred(
        booking_id: BookingId,
        user_id: UserId,
        method: PaymentMethod,
        discount_code: Option<String>,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            booking_id,
            user_id,
            method,
            discount_code,
            amount,
            status: PaymentStatus::Pending,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_and_wallet_methods_are_instant() {
        assert!(PaymentMethod::Credit.is_instant());
        assert!(PaymentMethod::Atm.is_instant());
        assert!(PaymentMethod::Momo.is_instant());
        assert!(PaymentMethod::Zalopay.is_instant());
        assert!(PaymentMethod::Shopeepay.is_instant());
    }

    #[test]
    fn transfer_and_on_site_methods_are_deferred() {
        assert!(!PaymentMethod::BankTransfer.is_instant());
        assert!(!PaymentMethod::PayAtProperty.is_instant());
    }

    #[test]
    fn method_parse_roundtrip() {
        for method in [
            PaymentMethod::Credit,
            PaymentMethod::Atm,
            PaymentMethod::Momo,
            PaymentMethod::Zalopay,
            PaymentMethod::Shopeepay,
            PaymentMethod::BankTransfer,
            PaymentMethod::PayAtProperty,
        ] {
            assert_eq!(PaymentMethod::parse(method.as_str()), Some(method));
        }
        assert_eq!(PaymentMethod::parse("barter"), None);
    }

    #[test]
    fn settled_payment_is_paid() {
        let payment = Payment::settled(
            BookingId::new(),
            UserId::new(),
            PaymentMethod::Credit,
            None,
            Money::from_minor(750_000),
            Utc::now(),
        );
        assert_eq!(payment.status, PaymentStatus::Paid);
    }

    #[test]
    fn deferred_payment_is_pending() {
        let payment = Payment::deferred(
            BookingId::new(),
            UserId::new(),
            PaymentMethod::BankTransfer,
            Some("SUMMER25".to_string()),
            Money::from_minor(750_000),
            Utc::now(),
        );
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.discount_code.as_deref(), Some("SUMMER25"));
    }
}
