//! # credvend-checkout
//!
//! **Fulfillment Plane**: where payment rails and inventory meet.
//!
//! The [`OrderFactory`] runs synchronous checkouts: price the cart,
//! gate on payment (external gateway via the [`PaymentOracle`], or a
//! stored-balance debit), allocate credential blocks, and persist the
//! completed order. Allocation failures after partial progress are
//! compensated by releasing the already-taken blocks.
//!
//! The [`PaymentCodeRegistry`] runs the asynchronous bank-transfer
//! rail: it issues time-boxed payment codes over a frozen cart
//! snapshot and, on admin verification, drives the same fulfillment
//! path exactly once per code.

pub mod code_store;
pub mod oracle;
pub mod order_factory;
pub mod order_store;
pub mod registry;

pub use code_store::PaymentCodeStore;
pub use oracle::{OracleReceipt, PaymentOracle, StaticOracle};
pub use order_factory::{CheckoutPayment, OrderFactory};
pub use order_store::OrderStore;
pub use registry::{CodeSnapshot, PaymentCodeRegistry};
