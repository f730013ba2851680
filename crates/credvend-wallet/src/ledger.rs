//! Wallet ledger — the only mutation path for stored balances.
//!
//! All operations are atomic per buyer: the sufficiency check and the
//! subtraction happen under one write lock, so the balance can never be
//! driven negative by a concurrent debit passing a stale check.

use std::sync::Arc;

use credvend_types::{CredvendError, Result, UserId, WalletPolicy};
use rust_decimal::Decimal;

use crate::store::BuyerStore;

/// Credits and debits buyer wallet balances under a top-up policy.
pub struct WalletLedger {
    store: Arc<BuyerStore>,
    policy: WalletPolicy,
}

impl WalletLedger {
    #[must_use]
    pub fn new(store: Arc<BuyerStore>, policy: WalletPolicy) -> Self {
        Self { store, policy }
    }

    /// The buyer store this ledger operates on.
    #[must_use]
    pub fn store(&self) -> &Arc<BuyerStore> {
        &self.store
    }

    /// Top up a buyer's balance. The amount must fall inside the policy
    /// bounds. Returns the new balance.
    ///
    /// # Errors
    /// - `InvalidAmount` if the amount is outside `[min_topup, max_topup]`
    /// - `BuyerNotFound` if the buyer does not exist
    pub fn credit(&self, buyer: UserId, amount: Decimal) -> Result<Decimal> {
        if !self.policy.accepts(amount) {
            return Err(CredvendError::InvalidAmount {
                amount,
                min: self.policy.min_topup,
                max: self.policy.max_topup,
            });
        }

        let new_balance = self.store.update(buyer, |b| {
            b.wallet_balance += amount;
            Ok(b.wallet_balance)
        })?;
        tracing::info!(%buyer, %amount, %new_balance, "wallet credited");
        Ok(new_balance)
    }

    /// Spend from a buyer's balance. The sufficiency check and the
    /// subtraction are one atomic step. Returns the new balance.
    ///
    /// # Errors
    /// - `InsufficientBalance` if the balance cannot cover the amount
    /// - `BuyerNotFound` if the buyer does not exist
    pub fn debit(&self, buyer: UserId, amount: Decimal) -> Result<Decimal> {
        let new_balance = self.store.update(buyer, |b| {
            if b.wallet_balance < amount {
                return Err(CredvendError::InsufficientBalance {
                    balance: b.wallet_balance,
                    required: amount,
                });
            }
            b.wallet_balance -= amount;
            Ok(b.wallet_balance)
        })?;
        tracing::info!(%buyer, %amount, %new_balance, "wallet debited");
        Ok(new_balance)
    }

    /// Current balance. An unknown buyer reads as zero — the balance is
    /// initialized on first use, not on account creation.
    #[must_use]
    pub fn balance(&self, buyer: UserId) -> Decimal {
        self.store
            .find(buyer)
            .map_or(Decimal::ZERO, |b| b.wallet_balance)
    }
}
