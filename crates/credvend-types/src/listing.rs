//! Listing and credential-pool types.
//!
//! A listing's credential storage evolved through three incompatible
//! shapes, and all three are still carried side by side:
//!
//! 1. `legacy_credential` — a single structured record (oldest shape,
//!    only ever read by the one-time migration),
//! 2. `credentials_inventory` — a per-item array where each entry carries
//!    its own `is_sold` / `sold_at` / `sold_to` markers,
//! 3. `credentials` — an array of opaque text blocks, consumed by removal
//!    (current shape).
//!
//! A listing uses exactly one shape at a time, determined by which field
//! is non-empty. The normalizer in `credvend-inventory` resolves whichever
//! shape is live into one canonical available/consumed view.
//!
//! The `is_sold` / `is_available` flags are **derived** projections of the
//! pool: [`Listing::recompute_sold_state`] re-derives them on every pool
//! mutation, and nothing else may set them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ListingId, UserId};

/// One structured credential record (the legacy field layout).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub recovery_email: String,
    #[serde(default)]
    pub additional_info: String,
}

/// One entry of the legacy per-item inventory array. The record stays in
/// the pool forever; consumption flips the sold marker and stamps who
/// bought it and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub record: CredentialRecord,
    pub is_sold: bool,
    pub sold_at: Option<DateTime<Utc>>,
    pub sold_to: Option<UserId>,
}

impl InventoryEntry {
    #[must_use]
    pub fn unsold(record: CredentialRecord) -> Self {
        Self {
            record,
            is_sold: false,
            sold_at: None,
            sold_to: None,
        }
    }
}

/// One consumable unit of secret login material, shape-independent.
///
/// This is what the allocation engine hands to an order line: either an
/// opaque text blob or a structured record, copied verbatim out of the
/// pool at the moment of sale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialBlock {
    Text(String),
    Record(CredentialRecord),
}

/// A sellable product owning a pool of credential blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub seller: UserId,
    /// Current shape: opaque text blocks, consumed by removal.
    pub credentials: Vec<String>,
    /// Legacy shape: per-item inventory with sold markers.
    pub credentials_inventory: Vec<InventoryEntry>,
    /// Oldest shape: a single structured record. Read only by the
    /// one-time migration; the normalizer ignores it.
    pub legacy_credential: Option<CredentialRecord>,
    /// Derived: `available_count() > 0`. Never hand-set.
    pub is_available: bool,
    /// Derived: `available_count() == 0`. Never hand-set.
    pub is_sold: bool,
    /// Optimistic-concurrency version, bumped on every committed pool
    /// write. Pool mutations are compare-and-set against this.
    pub pool_version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// Create a listing with an empty pool. The derived flags start in
    /// the sold-out position until credentials are appended.
    #[must_use]
    pub fn new(title: impl Into<String>, price: Decimal, seller: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: ListingId::new(),
            title: title.into(),
            description: String::new(),
            price,
            seller,
            credentials: Vec::new(),
            credentials_inventory: Vec::new(),
            legacy_credential: None,
            is_available: false,
            is_sold: true,
            pool_version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Number of blocks still sellable, derived from whichever shape is
    /// live. Pool contents are ground truth; the stored sold flag never
    /// overrides a non-empty pool.
    #[must_use]
    pub fn available_count(&self) -> usize {
        if !self.credentials.is_empty() {
            self.credentials
                .iter()
                .filter(|c| !c.trim().is_empty())
                .count()
        } else {
            self.credentials_inventory
                .iter()
                .filter(|e| !e.is_sold)
                .count()
        }
    }

    /// Number of blocks ever recorded in the live shape (available plus
    /// flagged-sold; removal-consumed opaque blocks are gone).
    #[must_use]
    pub fn total_count(&self) -> usize {
        if !self.credentials.is_empty() {
            self.credentials
                .iter()
                .filter(|c| !c.trim().is_empty())
                .count()
        } else {
            self.credentials_inventory.len()
        }
    }

    /// Number of consumed blocks observable in the live shape.
    #[must_use]
    pub fn consumed_count(&self) -> usize {
        self.total_count() - self.available_count()
    }

    /// Re-derive the sold/available flags from the pool. Must run inside
    /// the same logical write as any pool mutation.
    ///
    /// Also drops blank opaque blocks, which carry no payload and would
    /// otherwise distort the counts.
    pub fn recompute_sold_state(&mut self) {
        self.credentials.retain(|c| !c.trim().is_empty());
        self.is_sold = self.available_count() == 0;
        self.is_available = !self.is_sold;
        self.updated_at = Utc::now();
    }

    /// Seller path: append fresh opaque blocks. A sold-out listing comes
    /// back on sale when real payload arrives.
    pub fn append_credentials<I>(&mut self, blocks: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.credentials.extend(blocks);
        self.recompute_sold_state();
    }

    /// Payload-free projection for catalog surfaces. Raw credential
    /// material never leaves the engine outside an order.
    #[must_use]
    pub fn summary(&self) -> ListingSummary {
        ListingSummary {
            id: self.id,
            title: self.title.clone(),
            price: self.price,
            is_available: self.is_available,
            is_sold: self.is_sold,
            available_count: self.available_count(),
            total_count: self.total_count(),
        }
    }
}

/// What catalog callers see: counts, never payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingSummary {
    pub id: ListingId,
    pub title: String,
    pub price: Decimal,
    pub is_available: bool,
    pub is_sold: bool,
    pub available_count: usize,
    pub total_count: usize,
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Listing {
    /// Listing in the current opaque shape with the given blocks.
    pub fn dummy_opaque(price: Decimal, blocks: &[&str]) -> Self {
        let mut listing = Self::new("test listing", price, UserId::new());
        listing.append_credentials(blocks.iter().map(ToString::to_string));
        listing
    }

    /// Listing in the legacy inventory shape with `n` unsold entries.
    pub fn dummy_inventory(price: Decimal, n: usize) -> Self {
        let mut listing = Self::new("test listing", price, UserId::new());
        listing.credentials_inventory = (0..n)
            .map(|i| InventoryEntry::unsold(CredentialRecord::dummy(i)))
            .collect();
        listing.recompute_sold_state();
        listing
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl CredentialRecord {
    pub fn dummy(i: usize) -> Self {
        Self {
            email: format!("user{i}@example.com"),
            password: format!("hunter{i}"),
            username: format!("user{i}"),
            phone: String::new(),
            recovery_email: String::new(),
            additional_info: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_listing_starts_sold_out() {
        let listing = Listing::new("x", Decimal::new(500, 0), UserId::new());
        assert!(listing.is_sold);
        assert!(!listing.is_available);
        assert_eq!(listing.available_count(), 0);
    }

    #[test]
    fn opaque_counts_skip_blanks() {
        let mut listing = Listing::new("x", Decimal::ONE, UserId::new());
        listing.credentials = vec![
            "user:pass".to_string(),
            "   ".to_string(),
            "other:pass".to_string(),
        ];
        assert_eq!(listing.available_count(), 2);
        assert_eq!(listing.total_count(), 2);
    }

    #[test]
    fn recompute_drops_blanks_and_derives_flags() {
        let mut listing = Listing::new("x", Decimal::ONE, UserId::new());
        listing.credentials = vec!["a".to_string(), String::new()];
        listing.recompute_sold_state();
        assert_eq!(listing.credentials.len(), 1);
        assert!(!listing.is_sold);
        assert!(listing.is_available);
    }

    #[test]
    fn inventory_counts_track_sold_markers() {
        let mut listing = Listing::dummy_inventory(Decimal::ONE, 3);
        listing.credentials_inventory[0].is_sold = true;
        assert_eq!(listing.available_count(), 2);
        assert_eq!(listing.total_count(), 3);
        assert_eq!(listing.consumed_count(), 1);
    }

    #[test]
    fn append_unsells_listing() {
        let mut listing = Listing::new("x", Decimal::ONE, UserId::new());
        assert!(listing.is_sold);
        listing.append_credentials(["fresh:block".to_string()]);
        assert!(!listing.is_sold);
        assert!(listing.is_available);
        assert_eq!(listing.available_count(), 1);
    }

    #[test]
    fn stored_flag_never_overrides_pool() {
        // The flag is a projection; a non-empty pool wins and recompute
        // brings the flag back in line.
        let mut listing = Listing::dummy_opaque(Decimal::ONE, &["a", "b"]);
        listing.is_sold = true;
        assert_eq!(listing.available_count(), 2);
        listing.recompute_sold_state();
        assert!(!listing.is_sold);
    }

    #[test]
    fn summary_has_no_payload() {
        let listing = Listing::dummy_opaque(Decimal::new(1000, 0), &["secret:stuff"]);
        let summary = listing.summary();
        assert_eq!(summary.available_count, 1);
        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("secret:stuff"));
    }

    #[test]
    fn conservation_at_rest() {
        let mut listing = Listing::dummy_inventory(Decimal::ONE, 5);
        listing.credentials_inventory[1].is_sold = true;
        listing.credentials_inventory[4].is_sold = true;
        assert_eq!(
            listing.available_count() + listing.consumed_count(),
            listing.total_count()
        );
    }

    #[test]
    fn serde_roundtrip() {
        let listing = Listing::dummy_inventory(Decimal::new(2500, 2), 2);
        let json = serde_json::to_string(&listing).unwrap();
        let back: Listing = serde_json::from_str(&json).unwrap();
        assert_eq!(listing.id, back.id);
        assert_eq!(listing.price, back.price);
        assert_eq!(listing.credentials_inventory, back.credentials_inventory);
    }
}
