//! # credvend-wallet
//!
//! **Wallet Plane**: the buyer store and the stored-balance ledger.
//!
//! A buyer's wallet is one non-negative scalar. The ledger is the only
//! mutation path: `credit` (bounds-checked top-up) and `debit`
//! (sufficiency check and subtraction as one atomic step under the
//! store's write lock). Concurrent debits against the same buyer can
//! never both pass the check against a stale balance.

pub mod ledger;
pub mod store;

pub use ledger::WalletLedger;
pub use store::BuyerStore;
