//! Payment oracle — the seam to the external instant-payment gateway.
//!
//! The factory never trusts a client-supplied "I paid" flag; it asks the
//! oracle to confirm the reference and the settled amount before any
//! inventory moves.

use credvend_types::Result;
use rust_decimal::Decimal;

/// What the gateway reports for a payment reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleReceipt {
    /// Whether the gateway settled the payment.
    pub success: bool,
    /// The settled amount. Checked against the cart total.
    pub amount: Decimal,
    /// Gateway-side failure reason, when unsettled.
    pub reason: Option<String>,
}

/// Confirms gateway payments by reference.
///
/// Implementations wrap a real gateway client; errors are for transport
/// failures only — a rejected payment is a successful `verify` call with
/// `success: false`.
pub trait PaymentOracle: Send + Sync {
    fn verify(&self, reference: &str) -> Result<OracleReceipt>;
}

/// A fixed-outcome oracle for development and tests: settles every
/// reference at a configured amount, or rejects everything.
pub struct StaticOracle {
    receipt: OracleReceipt,
}

impl StaticOracle {
    /// An oracle that settles every reference at `amount`.
    #[must_use]
    pub fn settling(amount: Decimal) -> Self {
        Self {
            receipt: OracleReceipt {
                success: true,
                amount,
                reason: None,
            },
        }
    }

    /// An oracle that rejects every reference with the given reason.
    #[must_use]
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            receipt: OracleReceipt {
                success: false,
                amount: Decimal::ZERO,
                reason: Some(reason.into()),
            },
        }
    }
}

impl PaymentOracle for StaticOracle {
    fn verify(&self, _reference: &str) -> Result<OracleReceipt> {
        Ok(self.receipt.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settling_oracle_reports_amount() {
        let oracle = StaticOracle::settling(Decimal::new(500, 0));
        let receipt = oracle.verify("any-ref").unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.amount, Decimal::new(500, 0));
    }

    #[test]
    fn rejecting_oracle_carries_reason() {
        let oracle = StaticOracle::rejecting("card declined");
        let receipt = oracle.verify("any-ref").unwrap();
        assert!(!receipt.success);
        assert_eq!(receipt.reason.as_deref(), Some("card declined"));
    }
}
