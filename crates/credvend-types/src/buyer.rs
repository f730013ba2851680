//! Buyer account type.
//!
//! The engine only cares about one thing on a buyer: the stored wallet
//! balance. It is a single non-negative scalar, mutated exclusively
//! through the `WalletLedger` operations in `credvend-wallet`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::UserId;

/// A buyer account with a prepaid wallet balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buyer {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// Non-negative. Starts at zero; the ledger never lets it go below.
    #[serde(default)]
    pub wallet_balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Buyer {
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            name: name.into(),
            email: email.into(),
            wallet_balance: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Buyer {
    pub fn dummy(balance: Decimal) -> Self {
        let mut buyer = Self::new("Test Buyer", "buyer@example.com");
        buyer.wallet_balance = balance;
        buyer
    }
}
