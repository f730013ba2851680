//! # credvend-types
//!
//! Shared types, errors, and configuration for the **Credvend**
//! credential inventory and order fulfillment engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`ListingId`], [`UserId`], [`OrderId`], [`OrderNumber`]
//! - **Listing model**: [`Listing`], [`CredentialBlock`], [`CredentialRecord`], [`InventoryEntry`]
//! - **Order model**: [`Order`], [`OrderLine`], [`PaymentMethod`], [`OrderStatus`]
//! - **Payment-code model**: [`PaymentCode`], [`PaymentCodeState`]
//! - **Cart model**: [`CartLine`], [`PricedLine`]
//! - **Buyer model**: [`Buyer`]
//! - **Configuration**: [`WalletPolicy`], [`BankTransferConfig`]
//! - **Errors**: [`CredvendError`] with `CV_ERR_` prefix codes
//! - **Constants**: TTLs, retry bounds, and policy defaults

pub mod buyer;
pub mod cart;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod listing;
pub mod order;
pub mod payment_code;

// Re-export all primary types at crate root for ergonomic imports:
//   use credvend_types::{Listing, CredentialBlock, Order, PaymentCode, ...};

pub use buyer::*;
pub use cart::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use listing::*;
pub use order::*;
pub use payment_code::*;

// Constants are accessed via `credvend_types::constants::FOO`
// (not re-exported to avoid name collisions).
