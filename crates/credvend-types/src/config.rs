//! Configuration types for the wallet policy and the bank-transfer rail.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants;

/// Bounds on wallet top-ups. Policy-configurable per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletPolicy {
    /// Smallest accepted top-up (currency units).
    pub min_topup: Decimal,
    /// Largest accepted top-up (currency units).
    pub max_topup: Decimal,
}

impl WalletPolicy {
    /// Whether an amount is inside the accepted top-up range.
    #[must_use]
    pub fn accepts(&self, amount: Decimal) -> bool {
        amount >= self.min_topup && amount <= self.max_topup
    }
}

impl Default for WalletPolicy {
    fn default() -> Self {
        Self {
            min_topup: constants::MIN_TOPUP,
            max_topup: constants::MAX_TOPUP,
        }
    }
}

/// Administrative configuration of the asynchronous bank-transfer rail.
///
/// The rail only accepts code generation when it is both enabled and
/// fully configured with the receiving account's details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankTransferConfig {
    pub enabled: bool,
    pub bank_name: String,
    pub account_name: String,
    pub account_number: String,
    /// Free-text payment instructions shown to the buyer.
    pub instructions: String,
}

impl BankTransferConfig {
    /// All account details present (non-blank).
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.bank_name.trim().is_empty()
            && !self.account_name.trim().is_empty()
            && !self.account_number.trim().is_empty()
    }
}

impl Default for BankTransferConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bank_name: String::new(),
            account_name: String::new(),
            account_number: String::new(),
            instructions: String::new(),
        }
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl BankTransferConfig {
    /// An enabled, fully configured rail for tests.
    pub fn dummy_enabled() -> Self {
        Self {
            enabled: true,
            bank_name: "First Test Bank".to_string(),
            account_name: "Credvend Ltd".to_string(),
            account_number: "0123456789".to_string(),
            instructions: "Quote the code in the transfer narration".to_string(),
        }
    }
}
