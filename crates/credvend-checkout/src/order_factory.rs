//! Order factory — the synchronous checkout orchestrator.
//!
//! Step order is load-bearing: validate, price, gate on payment,
//! allocate, persist. Payment gating happens before any inventory moves
//! for the gateway rail, and the stored-balance debit happens after
//! allocation so a failed debit can hand the blocks straight back.
//! Whatever fails, the outcome is all-or-nothing: either a completed
//! order exists and every allocated block is on it, or the pools and the
//! wallet read as if the checkout never happened.

use std::sync::Arc;

use credvend_inventory::AllocationEngine;
use credvend_types::{
    CartLine, CredvendError, Order, OrderLine, PaymentMethod, PricedLine, Result, UserId,
};
use credvend_wallet::WalletLedger;
use rust_decimal::Decimal;

use crate::oracle::PaymentOracle;
use crate::order_store::OrderStore;

/// How a synchronous checkout is paid.
#[derive(Debug, Clone)]
pub enum CheckoutPayment {
    /// An external gateway payment, identified by its reference and
    /// confirmed through the oracle before allocation.
    Gateway { reference: String },
    /// Debit the buyer's stored wallet balance.
    StoredBalance,
}

/// Prices carts, gates payments, and turns allocations into orders.
pub struct OrderFactory {
    allocator: Arc<AllocationEngine>,
    ledger: Arc<WalletLedger>,
    orders: Arc<OrderStore>,
    oracle: Arc<dyn PaymentOracle>,
}

impl OrderFactory {
    #[must_use]
    pub fn new(
        allocator: Arc<AllocationEngine>,
        ledger: Arc<WalletLedger>,
        orders: Arc<OrderStore>,
        oracle: Arc<dyn PaymentOracle>,
    ) -> Self {
        Self {
            allocator,
            ledger,
            orders,
            oracle,
        }
    }

    /// The order store this factory persists into.
    #[must_use]
    pub fn orders(&self) -> &Arc<OrderStore> {
        &self.orders
    }

    /// Run a synchronous checkout end to end. Returns the completed,
    /// delivered order.
    ///
    /// # Errors
    /// - `EmptyCart` / `InvalidQuantity` on a malformed cart
    /// - `StaleCartItems` if any line references a listing that no
    ///   longer exists
    /// - `PaymentRejected` if the oracle does not confirm a gateway
    ///   payment covering the total
    /// - `InsufficientInventory` / `AllocationContention` from the
    ///   allocation engine; nothing is consumed
    /// - `InsufficientBalance` on the stored-balance rail; allocated
    ///   blocks are released before this returns
    pub fn checkout(
        &self,
        buyer: UserId,
        cart: &[CartLine],
        payment: &CheckoutPayment,
    ) -> Result<Order> {
        let (lines, total) = self.price_cart(cart)?;

        let (method, reference) = match payment {
            CheckoutPayment::Gateway { reference } => {
                self.confirm_gateway_payment(reference, total)?;
                (PaymentMethod::Gateway, reference.clone())
            }
            CheckoutPayment::StoredBalance => (PaymentMethod::StoredBalance, "wallet".to_string()),
        };

        let order_lines = self.allocate_lines(buyer, &lines)?;

        if method == PaymentMethod::StoredBalance {
            if let Err(err) = self.ledger.debit(buyer, total) {
                self.release_lines(&order_lines);
                return Err(err);
            }
        }

        let order = Order::completed(buyer, order_lines, total, method, reference);
        self.orders.save(order.clone());
        tracing::info!(
            order = %order.order_number,
            %buyer,
            %total,
            method = %method,
            blocks = order.delivered_block_count(),
            "checkout completed"
        );
        Ok(order)
    }

    /// Fulfill a frozen cart snapshot on the bank-transfer rail. Called
    /// by the registry under its verification gate; the snapshot's
    /// prices are authoritative even if the listings have been edited
    /// since the code was generated.
    pub(crate) fn fulfill_snapshot(
        &self,
        buyer: UserId,
        snapshot: &[PricedLine],
        total: Decimal,
        code: &str,
    ) -> Result<Order> {
        let order_lines = self.allocate_lines(buyer, snapshot)?;
        let order = Order::completed(buyer, order_lines, total, PaymentMethod::BankTransfer, code);
        self.orders.save(order.clone());
        tracing::info!(
            order = %order.order_number,
            %buyer,
            %total,
            code,
            "bank-transfer order fulfilled"
        );
        Ok(order)
    }

    /// Resolve cart lines against the live listings: price, title, and
    /// total. Missing listings are collected rather than failing one at
    /// a time, so the caller can show the buyer every stale line at once.
    pub(crate) fn price_cart(&self, cart: &[CartLine]) -> Result<(Vec<PricedLine>, Decimal)> {
        if cart.is_empty() {
            return Err(CredvendError::EmptyCart);
        }
        if cart.iter().any(|line| line.quantity == 0) {
            return Err(CredvendError::InvalidQuantity);
        }

        let store = self.allocator.store();
        let mut lines = Vec::with_capacity(cart.len());
        let mut invalid_ids = Vec::new();
        for line in cart {
            match store.find(line.listing_id) {
                Some(listing) => lines.push(PricedLine {
                    listing_id: line.listing_id,
                    quantity: line.quantity,
                    price: listing.price,
                    title: listing.title,
                }),
                None => invalid_ids.push(line.listing_id),
            }
        }
        if !invalid_ids.is_empty() {
            return Err(CredvendError::StaleCartItems { invalid_ids });
        }

        let total = lines.iter().map(PricedLine::subtotal).sum();
        Ok((lines, total))
    }

    fn confirm_gateway_payment(&self, reference: &str, total: Decimal) -> Result<()> {
        let receipt = self.oracle.verify(reference)?;
        if !receipt.success {
            return Err(CredvendError::PaymentRejected {
                reference: reference.to_string(),
                reason: receipt
                    .reason
                    .unwrap_or_else(|| "gateway did not settle the payment".to_string()),
            });
        }
        if receipt.amount < total {
            return Err(CredvendError::PaymentRejected {
                reference: reference.to_string(),
                reason: format!("settled {} but cart totals {total}", receipt.amount),
            });
        }
        Ok(())
    }

    /// Allocate every line, or nothing: a failure part-way releases the
    /// blocks already taken before the error propagates.
    fn allocate_lines(&self, buyer: UserId, lines: &[PricedLine]) -> Result<Vec<OrderLine>> {
        let mut order_lines: Vec<OrderLine> = Vec::with_capacity(lines.len());
        for line in lines {
            match self.allocator.allocate(line.listing_id, line.quantity, buyer) {
                Ok(credentials) => order_lines.push(OrderLine {
                    listing_id: line.listing_id,
                    quantity: line.quantity,
                    price: line.price,
                    credentials,
                }),
                Err(err) => {
                    tracing::warn!(
                        listing = %line.listing_id,
                        %buyer,
                        error = %err,
                        "allocation failed mid-checkout, releasing prior lines"
                    );
                    self.release_lines(&order_lines);
                    return Err(err);
                }
            }
        }
        Ok(order_lines)
    }

    fn release_lines(&self, lines: &[OrderLine]) {
        for line in lines {
            if let Err(err) = self.allocator.release(line.listing_id, &line.credentials) {
                // Nothing left to do but record it; the blocks are on no
                // order and the pool commit kept refusing.
                tracing::error!(
                    listing = %line.listing_id,
                    error = %err,
                    "compensating release failed, blocks stranded"
                );
            }
        }
    }
}
