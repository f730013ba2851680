//! Payment-code registry — the asynchronous bank-transfer rail.
//!
//! Codes are issued over a frozen cart snapshot and verified later by an
//! administrator. Verification is the moment of truth: it is the only
//! place a bank-transfer order gets created, and it runs under a single
//! gate so two admins confirming the same code concurrently still
//! produce exactly one order. The PENDING → VERIFIED transition is
//! terminal, so a second pass over the same code fails before it can
//! touch inventory.

use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use credvend_types::{
    BankTransferConfig, CartLine, CredvendError, Order, OrderId, PaymentCode, PaymentCodeState,
    Result, UserId, constants,
};
use rust_decimal::Decimal;

use crate::code_store::PaymentCodeStore;
use crate::order_factory::OrderFactory;

/// Buyer-facing view of a code: state and totals, no cart payloads.
/// Once verified, the resolved order rides along — the code is the
/// buyer's only handle on an asynchronous purchase, so this is where
/// they collect what was delivered.
#[derive(Debug, Clone)]
pub struct CodeSnapshot {
    pub code: String,
    /// Effective state at the time of the query; a pending code past its
    /// TTL reads as EXPIRED here even before a sweep persists it.
    pub state: PaymentCodeState,
    pub total_amount: Decimal,
    pub line_count: usize,
    pub order_id: Option<OrderId>,
    /// The fulfilled order, populated only for verified codes.
    pub order: Option<Order>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Issues, verifies, and sweeps bank-transfer payment codes.
pub struct PaymentCodeRegistry {
    codes: Arc<PaymentCodeStore>,
    factory: Arc<OrderFactory>,
    config: RwLock<BankTransferConfig>,
    /// Serializes verification end to end. Allocation and the code-state
    /// commit happen under this gate, so no interleaving can fulfill one
    /// code twice.
    verify_gate: Mutex<()>,
}

impl PaymentCodeRegistry {
    #[must_use]
    pub fn new(
        codes: Arc<PaymentCodeStore>,
        factory: Arc<OrderFactory>,
        config: BankTransferConfig,
    ) -> Self {
        Self {
            codes,
            factory,
            config: RwLock::new(config),
            verify_gate: Mutex::new(()),
        }
    }

    /// The code store backing this registry.
    #[must_use]
    pub fn codes(&self) -> &Arc<PaymentCodeStore> {
        &self.codes
    }

    /// Current rail configuration (clone).
    #[must_use]
    pub fn config(&self) -> BankTransferConfig {
        self.config
            .read()
            .expect("rail config lock poisoned")
            .clone()
    }

    /// Replace the rail configuration. Pending codes are unaffected;
    /// only new generations check the rail switch.
    pub fn set_config(&self, config: BankTransferConfig) {
        *self.config.write().expect("rail config lock poisoned") = config;
    }

    /// Issue a payment code for a cart. The cart is priced now and
    /// frozen onto the code; later listing edits do not reprice it.
    /// Inventory is not reserved — availability is checked at
    /// verification, when the money has actually arrived.
    ///
    /// # Errors
    /// - `RailDisabled` / `RailNotConfigured` if the rail cannot accept
    ///   codes
    /// - `EmptyCart` / `InvalidQuantity` / `StaleCartItems` from pricing
    /// - `CodeGenerationExhausted` if every candidate value collided
    pub fn generate(&self, buyer: UserId, cart: &[CartLine]) -> Result<PaymentCode> {
        {
            let config = self.config.read().expect("rail config lock poisoned");
            if !config.enabled {
                return Err(CredvendError::RailDisabled);
            }
            if !config.is_configured() {
                return Err(CredvendError::RailNotConfigured);
            }
        }

        let (lines, total) = self.factory.price_cart(cart)?;

        for _ in 0..constants::MAX_CODE_GENERATION_ATTEMPTS {
            let candidate = PaymentCode::new(
                PaymentCode::generate_code(),
                buyer,
                lines.clone(),
                total,
            );
            match self.codes.insert(candidate.clone()) {
                Ok(()) => {
                    tracing::info!(
                        code = %candidate.code,
                        %buyer,
                        %total,
                        expires_at = %candidate.expires_at,
                        "payment code issued"
                    );
                    return Ok(candidate);
                }
                Err(CredvendError::DuplicateCode(_)) => {}
                Err(other) => return Err(other),
            }
        }
        Err(CredvendError::CodeGenerationExhausted)
    }

    /// Admin verification: confirm the transfer arrived and fulfill the
    /// code's snapshot as a bank-transfer order. Exactly one order can
    /// ever result from a code, no matter how many admins race.
    ///
    /// A fulfillment failure (say the pool sold out in the meantime)
    /// leaves the code PENDING so it can be retried after restock.
    ///
    /// # Errors
    /// - `CodeNotFound` for an unknown value
    /// - `CodeAlreadyResolved` if the code already left PENDING
    /// - `CodeExpired` if the TTL elapsed first (persisted as EXPIRED)
    /// - any allocation error from fulfillment, with the code untouched
    pub fn verify(&self, value: &str, admin: UserId) -> Result<Order> {
        let _gate = self.verify_gate.lock().expect("verify gate poisoned");

        let mut code = self
            .codes
            .find(value)
            .ok_or_else(|| CredvendError::CodeNotFound(value.to_string()))?;

        if code.state.is_terminal() {
            return Err(CredvendError::CodeAlreadyResolved { state: code.state });
        }
        if code.is_expired_at(Utc::now()) {
            code.mark_expired()?;
            self.codes.save(code)?;
            return Err(CredvendError::CodeExpired(value.to_string()));
        }

        let order =
            self.factory
                .fulfill_snapshot(code.buyer, &code.cart, code.total_amount, &code.code)?;

        code.mark_verified(admin, order.id)?;
        self.codes.save(code)?;
        tracing::info!(
            code = value,
            %admin,
            order = %order.order_number,
            "payment code verified"
        );
        Ok(order)
    }

    /// Buyer-initiated cancellation of their own pending code.
    ///
    /// # Errors
    /// - `CodeNotFound` for an unknown value or someone else's code
    /// - `CodeAlreadyResolved` if the code already left PENDING
    pub fn cancel(&self, value: &str, buyer: UserId) -> Result<()> {
        let _gate = self.verify_gate.lock().expect("verify gate poisoned");

        let mut code = self
            .codes
            .find(value)
            .filter(|c| c.buyer == buyer)
            .ok_or_else(|| CredvendError::CodeNotFound(value.to_string()))?;

        if code.state.is_terminal() {
            return Err(CredvendError::CodeAlreadyResolved { state: code.state });
        }
        code.mark_cancelled()?;
        self.codes.save(code)?;
        tracing::info!(code = value, %buyer, "payment code cancelled");
        Ok(())
    }

    /// Point-in-time view of a code, restricted to its owner. Someone
    /// else's code reads as missing rather than leaking its existence.
    /// A verified code carries its fulfilled order, credential blocks
    /// included — the requester is the buyer they were delivered to.
    pub fn status(&self, value: &str, requester: UserId, now: DateTime<Utc>) -> Result<CodeSnapshot> {
        let code = self
            .codes
            .find(value)
            .filter(|c| c.buyer == requester)
            .ok_or_else(|| CredvendError::CodeNotFound(value.to_string()))?;
        let order = match (code.effective_state(now), code.order_id) {
            (PaymentCodeState::Verified, Some(order_id)) => self.factory.orders().find(order_id),
            _ => None,
        };
        Ok(CodeSnapshot {
            code: code.code.clone(),
            state: code.effective_state(now),
            total_amount: code.total_amount,
            line_count: code.cart.len(),
            order_id: code.order_id,
            order,
            created_at: code.created_at,
            expires_at: code.expires_at,
        })
    }

    /// The admin verification queue: pending, unexpired codes.
    #[must_use]
    pub fn pending_codes(&self, now: DateTime<Utc>) -> Vec<PaymentCode> {
        self.codes.pending_codes(now)
    }

    /// Persist EXPIRED onto every overdue pending code. Returns how many
    /// were swept.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let swept = self.codes.expire_overdue(now);
        if swept > 0 {
            tracing::info!(swept, "expired overdue payment codes");
        }
        swept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credvend_inventory::{AllocationEngine, ListingStore};
    use credvend_types::{Buyer, Listing, ListingId, WalletPolicy};
    use credvend_wallet::{BuyerStore, WalletLedger};

    use crate::oracle::StaticOracle;
    use crate::order_store::OrderStore;

    struct Fixture {
        registry: PaymentCodeRegistry,
        listings: Arc<ListingStore>,
        orders: Arc<OrderStore>,
        buyer: UserId,
    }

    fn fixture() -> Fixture {
        let listings = Arc::new(ListingStore::new());
        let allocator = Arc::new(AllocationEngine::new(Arc::clone(&listings)));
        let buyers = Arc::new(BuyerStore::new());
        let buyer = Buyer::dummy(Decimal::ZERO);
        let buyer_id = buyer.id;
        buyers.insert(buyer);
        let ledger = Arc::new(WalletLedger::new(buyers, WalletPolicy::default()));
        let orders = Arc::new(OrderStore::new());
        let factory = Arc::new(OrderFactory::new(
            allocator,
            ledger,
            Arc::clone(&orders),
            Arc::new(StaticOracle::rejecting("unused")),
        ));
        let registry = PaymentCodeRegistry::new(
            Arc::new(PaymentCodeStore::new()),
            factory,
            BankTransferConfig::dummy_enabled(),
        );
        Fixture {
            registry,
            listings,
            orders,
            buyer: buyer_id,
        }
    }

    fn seeded_listing(fx: &Fixture, price: Decimal, blocks: &[&str]) -> ListingId {
        let listing = Listing::dummy_opaque(price, blocks);
        let id = listing.id;
        fx.listings.insert(listing);
        id
    }

    #[test]
    fn generate_freezes_cart_snapshot() {
        let fx = fixture();
        let listing = seeded_listing(&fx, Decimal::new(100, 0), &["a", "b"]);
        let code = fx
            .registry
            .generate(fx.buyer, &[CartLine::new(listing, 2)])
            .unwrap();

        assert_eq!(code.total_amount, Decimal::new(200, 0));
        assert_eq!(code.state, PaymentCodeState::Pending);
        // No reservation at generation time.
        assert_eq!(fx.listings.find(listing).unwrap().available_count(), 2);
    }

    #[test]
    fn disabled_rail_refuses_generation() {
        let fx = fixture();
        let listing = seeded_listing(&fx, Decimal::ONE, &["a"]);
        let mut config = BankTransferConfig::dummy_enabled();
        config.enabled = false;
        fx.registry.set_config(config);

        let err = fx
            .registry
            .generate(fx.buyer, &[CartLine::new(listing, 1)])
            .unwrap_err();
        assert!(matches!(err, CredvendError::RailDisabled));
    }

    #[test]
    fn unconfigured_rail_refuses_generation() {
        let fx = fixture();
        let listing = seeded_listing(&fx, Decimal::ONE, &["a"]);
        let mut config = BankTransferConfig::dummy_enabled();
        config.account_number = String::new();
        fx.registry.set_config(config);

        let err = fx
            .registry
            .generate(fx.buyer, &[CartLine::new(listing, 1)])
            .unwrap_err();
        assert!(matches!(err, CredvendError::RailNotConfigured));
    }

    #[test]
    fn verify_creates_order_at_snapshot_price() {
        let fx = fixture();
        let listing = seeded_listing(&fx, Decimal::new(100, 0), &["a", "b"]);
        let code = fx
            .registry
            .generate(fx.buyer, &[CartLine::new(listing, 2)])
            .unwrap();

        // Seller reprices after the code was issued.
        let mut edited = fx.listings.find(listing).unwrap();
        edited.price = Decimal::new(999, 0);
        fx.listings.save(edited).unwrap();

        let admin = UserId::new();
        let order = fx.registry.verify(&code.code, admin).unwrap();
        assert_eq!(order.total_amount, Decimal::new(200, 0), "snapshot price");
        assert_eq!(order.payment_reference, code.code);
        assert_eq!(order.delivered_block_count(), 2);

        let after = fx.registry.status(&code.code, fx.buyer, Utc::now()).unwrap();
        assert_eq!(after.state, PaymentCodeState::Verified);
        assert_eq!(after.order_id, Some(order.id));

        // The resolved order rides on the snapshot, delivery included.
        let embedded = after.order.expect("verified snapshot embeds the order");
        assert_eq!(embedded.id, order.id);
        assert_eq!(embedded.delivered_block_count(), 2);
    }

    #[test]
    fn pending_snapshot_carries_no_order() {
        let fx = fixture();
        let listing = seeded_listing(&fx, Decimal::ONE, &["a"]);
        let code = fx
            .registry
            .generate(fx.buyer, &[CartLine::new(listing, 1)])
            .unwrap();

        let snapshot = fx.registry.status(&code.code, fx.buyer, Utc::now()).unwrap();
        assert_eq!(snapshot.state, PaymentCodeState::Pending);
        assert!(snapshot.order_id.is_none());
        assert!(snapshot.order.is_none());
    }

    #[test]
    fn double_verify_yields_one_order() {
        let fx = fixture();
        let listing = seeded_listing(&fx, Decimal::ONE, &["a"]);
        let code = fx
            .registry
            .generate(fx.buyer, &[CartLine::new(listing, 1)])
            .unwrap();

        fx.registry.verify(&code.code, UserId::new()).unwrap();
        let err = fx.registry.verify(&code.code, UserId::new()).unwrap_err();
        assert!(matches!(
            err,
            CredvendError::CodeAlreadyResolved {
                state: PaymentCodeState::Verified
            }
        ));
        assert_eq!(fx.orders.len(), 1);
    }

    #[test]
    fn expired_code_cannot_verify_and_is_persisted() {
        let fx = fixture();
        let listing = seeded_listing(&fx, Decimal::ONE, &["a"]);
        let code = fx
            .registry
            .generate(fx.buyer, &[CartLine::new(listing, 1)])
            .unwrap();

        let mut stored = fx.registry.codes().find(&code.code).unwrap();
        stored.expires_at = Utc::now() - chrono::Duration::seconds(1);
        fx.registry.codes().save(stored).unwrap();

        let err = fx.registry.verify(&code.code, UserId::new()).unwrap_err();
        assert!(matches!(err, CredvendError::CodeExpired(_)));
        assert_eq!(
            fx.registry.codes().find(&code.code).unwrap().state,
            PaymentCodeState::Expired
        );
        assert_eq!(fx.listings.find(listing).unwrap().available_count(), 1);
        assert!(fx.orders.is_empty());
    }

    #[test]
    fn failed_fulfillment_leaves_code_pending() {
        let fx = fixture();
        let listing = seeded_listing(&fx, Decimal::ONE, &["only"]);
        let code = fx
            .registry
            .generate(fx.buyer, &[CartLine::new(listing, 1)])
            .unwrap();

        // Pool sells out between generation and verification.
        let mut edited = fx.listings.find(listing).unwrap();
        edited.credentials.clear();
        fx.listings.save(edited).unwrap();

        let err = fx.registry.verify(&code.code, UserId::new()).unwrap_err();
        assert!(matches!(err, CredvendError::InsufficientInventory { .. }));
        assert_eq!(
            fx.registry.codes().find(&code.code).unwrap().state,
            PaymentCodeState::Pending,
            "retryable after restock"
        );

        // Restock, retry, succeed.
        let mut restocked = fx.listings.find(listing).unwrap();
        restocked.append_credentials(["fresh".to_string()]);
        fx.listings.save(restocked).unwrap();
        let order = fx.registry.verify(&code.code, UserId::new()).unwrap();
        assert_eq!(order.delivered_block_count(), 1);
    }

    #[test]
    fn cancel_own_pending_code() {
        let fx = fixture();
        let listing = seeded_listing(&fx, Decimal::ONE, &["a"]);
        let code = fx
            .registry
            .generate(fx.buyer, &[CartLine::new(listing, 1)])
            .unwrap();

        fx.registry.cancel(&code.code, fx.buyer).unwrap();
        let err = fx.registry.verify(&code.code, UserId::new()).unwrap_err();
        assert!(matches!(
            err,
            CredvendError::CodeAlreadyResolved {
                state: PaymentCodeState::Cancelled
            }
        ));
    }

    #[test]
    fn cancel_someone_elses_code_reads_as_missing() {
        let fx = fixture();
        let listing = seeded_listing(&fx, Decimal::ONE, &["a"]);
        let code = fx
            .registry
            .generate(fx.buyer, &[CartLine::new(listing, 1)])
            .unwrap();

        let err = fx.registry.cancel(&code.code, UserId::new()).unwrap_err();
        assert!(matches!(err, CredvendError::CodeNotFound(_)));
    }

    #[test]
    fn status_of_someone_elses_code_reads_as_missing() {
        let fx = fixture();
        let listing = seeded_listing(&fx, Decimal::ONE, &["a"]);
        let code = fx
            .registry
            .generate(fx.buyer, &[CartLine::new(listing, 1)])
            .unwrap();

        let err = fx
            .registry
            .status(&code.code, UserId::new(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, CredvendError::CodeNotFound(_)));
    }

    #[test]
    fn sweep_marks_overdue_codes() {
        let fx = fixture();
        let listing = seeded_listing(&fx, Decimal::ONE, &["a", "b"]);
        let code = fx
            .registry
            .generate(fx.buyer, &[CartLine::new(listing, 1)])
            .unwrap();

        let mut stored = fx.registry.codes().find(&code.code).unwrap();
        stored.expires_at = Utc::now() - chrono::Duration::hours(1);
        fx.registry.codes().save(stored).unwrap();

        assert_eq!(fx.registry.sweep_expired(Utc::now()), 1);
        assert!(fx.registry.pending_codes(Utc::now()).is_empty());
    }

    #[test]
    fn status_reports_lazy_expiry() {
        let fx = fixture();
        let listing = seeded_listing(&fx, Decimal::ONE, &["a"]);
        let code = fx
            .registry
            .generate(fx.buyer, &[CartLine::new(listing, 1)])
            .unwrap();

        let later = code.expires_at + chrono::Duration::seconds(1);
        let snapshot = fx.registry.status(&code.code, fx.buyer, later).unwrap();
        assert_eq!(snapshot.state, PaymentCodeState::Expired);
        // Stored state untouched until verify or sweep persists it.
        assert_eq!(
            fx.registry.codes().find(&code.code).unwrap().state,
            PaymentCodeState::Pending
        );
    }
}
