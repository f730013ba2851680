//! Order types.
//!
//! An order is the permanent receipt of what was delivered: once created,
//! its allocated credential blocks are immutable. This engine models
//! instant digital delivery, so every order is persisted already
//! completed and delivered — there is no separate shipping phase.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CredentialBlock, ListingId, OrderId, OrderNumber, UserId};

/// The payment rail a checkout rode in on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Instant external gateway, verified by the payment oracle.
    Gateway,
    /// Prepaid wallet balance, debited at checkout.
    StoredBalance,
    /// Asynchronous human-verified bank transfer via payment code.
    BankTransfer,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gateway => write!(f, "gateway"),
            Self::StoredBalance => write!(f, "stored-balance"),
            Self::BankTransfer => write!(f, "bank-transfer"),
        }
    }
}

/// Payment settlement status on the order record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Processing,
    Completed,
    Cancelled,
}

/// Delivery status. Digital delivery is instant, so `Delivered` is the
/// only state a persisted order ever carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryStatus {
    Pending,
    Delivered,
}

/// One fulfilled line: which listing, how many, at what unit price, and
/// the exact credential blocks that were allocated to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub listing_id: ListingId,
    pub quantity: u32,
    pub price: Decimal,
    pub credentials: Vec<CredentialBlock>,
}

/// A persisted order. Created exactly once per successful checkout or
/// per verified payment code; never partially.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub buyer: UserId,
    pub lines: Vec<OrderLine>,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    /// Gateway reference, wallet receipt, or the payment code itself.
    pub payment_reference: String,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub delivery_status: DeliveryStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Build a completed, delivered order — the only kind this engine
    /// ever persists.
    #[must_use]
    pub fn completed(
        buyer: UserId,
        lines: Vec<OrderLine>,
        total_amount: Decimal,
        payment_method: PaymentMethod,
        payment_reference: impl Into<String>,
    ) -> Self {
        Self {
            id: OrderId::new(),
            order_number: OrderNumber::generate(),
            buyer,
            lines,
            total_amount,
            payment_method,
            payment_reference: payment_reference.into(),
            payment_status: PaymentStatus::Completed,
            order_status: OrderStatus::Completed,
            delivery_status: DeliveryStatus::Delivered,
            created_at: Utc::now(),
        }
    }

    /// Total number of credential blocks delivered across all lines.
    #[must_use]
    pub fn delivered_block_count(&self) -> usize {
        self.lines.iter().map(|l| l.credentials.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_line() -> OrderLine {
        OrderLine {
            listing_id: ListingId::new(),
            quantity: 2,
            price: Decimal::new(100, 0),
            credentials: vec![
                CredentialBlock::Text("a:b".to_string()),
                CredentialBlock::Text("c:d".to_string()),
            ],
        }
    }

    #[test]
    fn completed_order_is_delivered() {
        let order = Order::completed(
            UserId::new(),
            vec![one_line()],
            Decimal::new(200, 0),
            PaymentMethod::Gateway,
            "ref-123",
        );
        assert_eq!(order.payment_status, PaymentStatus::Completed);
        assert_eq!(order.order_status, OrderStatus::Completed);
        assert_eq!(order.delivery_status, DeliveryStatus::Delivered);
        assert_eq!(order.delivered_block_count(), 2);
    }

    #[test]
    fn payment_method_display() {
        assert_eq!(format!("{}", PaymentMethod::Gateway), "gateway");
        assert_eq!(format!("{}", PaymentMethod::StoredBalance), "stored-balance");
        assert_eq!(format!("{}", PaymentMethod::BankTransfer), "bank-transfer");
    }

    #[test]
    fn serde_roundtrip() {
        let order = Order::completed(
            UserId::new(),
            vec![one_line()],
            Decimal::new(200, 0),
            PaymentMethod::StoredBalance,
            "wallet",
        );
        let json = serde_json::to_string(&order).unwrap();
        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order.id, back.id);
        assert_eq!(order.order_number, back.order_number);
        assert_eq!(order.lines, back.lines);
    }
}
