//! Cart line types.
//!
//! A checkout request carries [`CartLine`]s — just a listing reference and
//! a quantity. The bank-transfer rail snapshots each line into a
//! [`PricedLine`] at code-generation time, so later listing edits cannot
//! retroactively change an in-flight code's price or title.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ListingId;

/// One line of a buyer's cart as submitted to checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub listing_id: ListingId,
    pub quantity: u32,
}

impl CartLine {
    #[must_use]
    pub fn new(listing_id: ListingId, quantity: u32) -> Self {
        Self {
            listing_id,
            quantity,
        }
    }
}

/// A cart line with price and title denormalized from the listing at
/// snapshot time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub listing_id: ListingId,
    pub quantity: u32,
    pub price: Decimal,
    pub title: String,
}

impl PricedLine {
    /// Line subtotal (unit price times quantity).
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}
