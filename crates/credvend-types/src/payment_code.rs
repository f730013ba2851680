//! # PaymentCode — the asynchronous-rail token
//!
//! A payment code represents an unpaid order awaiting human verification
//! on the bank-transfer rail. The buyer generates a code, pays out of
//! band, and an administrator later verifies the code, which is the
//! moment the order is actually created.
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐  admin verify   ┌──────────┐
//!   │ PENDING ├────────────────▶│ VERIFIED │
//!   └───┬─────┘                 └──────────┘
//!       │ TTL elapsed / cancel
//!       ▼
//!   ┌─────────┐   ┌───────────┐
//!   │ EXPIRED │   │ CANCELLED │
//!   └─────────┘   └───────────┘
//! ```
//!
//! Transitions are monotonic: `VERIFIED`, `EXPIRED`, and `CANCELLED` are
//! all terminal. `PENDING → VERIFIED` is the only transition that also
//! creates an order; it stamps who verified, when, and which order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CredvendError, OrderId, PricedLine, Result, UserId, constants, ids::random_suffix};

/// Lifecycle state of a payment code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentCodeState {
    /// Awaiting out-of-band payment and admin verification.
    Pending,
    /// An admin confirmed payment; an order exists. **Irreversible** —
    /// this is what makes double verification impossible.
    Verified,
    /// The TTL elapsed before verification.
    Expired,
    /// Withdrawn before verification.
    Cancelled,
}

impl PaymentCodeState {
    /// Can this code transition to the given target state?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (
                Self::Pending,
                Self::Verified | Self::Expired | Self::Cancelled
            )
        )
    }

    /// Whether this state accepts no further transitions.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for PaymentCodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Verified => write!(f, "VERIFIED"),
            Self::Expired => write!(f, "EXPIRED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// A time-boxed payment code with a denormalized snapshot of the cart it
/// was generated for. Later listing edits never alter the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCode {
    /// Opaque alphanumeric code the buyer quotes when paying.
    pub code: String,
    pub buyer: UserId,
    /// Cart lines frozen at generation time (listing, quantity, price, title).
    pub cart: Vec<PricedLine>,
    pub total_amount: Decimal,
    pub state: PaymentCodeState,
    pub verified_by: Option<UserId>,
    pub verified_at: Option<DateTime<Utc>>,
    pub order_id: Option<OrderId>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PaymentCode {
    /// Create a pending code expiring [`constants::PAYMENT_CODE_TTL_HOURS`]
    /// from now.
    #[must_use]
    pub fn new(code: String, buyer: UserId, cart: Vec<PricedLine>, total_amount: Decimal) -> Self {
        let now = Utc::now();
        Self {
            code,
            buyer,
            cart,
            total_amount,
            state: PaymentCodeState::Pending,
            verified_by: None,
            verified_at: None,
            order_id: None,
            created_at: now,
            expires_at: now + chrono::Duration::hours(constants::PAYMENT_CODE_TTL_HOURS),
        }
    }

    /// Generate a candidate code value: prefix, the trailing six digits of
    /// the wall clock in milliseconds, and a random suffix. Uniqueness is
    /// the registry's job (bounded retry against the store).
    #[must_use]
    pub fn generate_code() -> String {
        let millis = Utc::now().timestamp_millis();
        format!(
            "{}{:06}{}",
            constants::PAYMENT_CODE_PREFIX,
            millis % 1_000_000,
            random_suffix(constants::PAYMENT_CODE_SUFFIX_LEN)
        )
    }

    /// Whether the TTL has elapsed, regardless of stored state.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// The state an observer should see at `now`: a pending code past its
    /// TTL reads as expired even if no sweep has run yet.
    #[must_use]
    pub fn effective_state(&self, now: DateTime<Utc>) -> PaymentCodeState {
        if self.state == PaymentCodeState::Pending && self.is_expired_at(now) {
            PaymentCodeState::Expired
        } else {
            self.state
        }
    }

    /// Transition to VERIFIED, stamping the verifier and the order.
    pub fn mark_verified(&mut self, admin: UserId, order_id: OrderId) -> Result<()> {
        self.transition(PaymentCodeState::Verified)?;
        self.verified_by = Some(admin);
        self.verified_at = Some(Utc::now());
        self.order_id = Some(order_id);
        Ok(())
    }

    /// Transition to EXPIRED.
    pub fn mark_expired(&mut self) -> Result<()> {
        self.transition(PaymentCodeState::Expired)
    }

    /// Transition to CANCELLED.
    pub fn mark_cancelled(&mut self) -> Result<()> {
        self.transition(PaymentCodeState::Cancelled)
    }

    fn transition(&mut self, target: PaymentCodeState) -> Result<()> {
        if !self.state.can_transition_to(target) {
            return Err(CredvendError::InvalidCodeTransition {
                from: self.state,
                to: target,
            });
        }
        self.state = target;
        Ok(())
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl PaymentCode {
    /// A pending code over an arbitrary snapshot, for unit tests.
    pub fn dummy(buyer: UserId, total: Decimal) -> Self {
        Self::new(Self::generate_code(), buyer, Vec::new(), total)
    }
}
