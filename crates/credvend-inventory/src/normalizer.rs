//! Credential record normalizer — pure read, no side effects.
//!
//! Resolves a listing's raw credential data (whichever of the legacy
//! shapes is populated) into a canonical ordered sequence of available
//! blocks plus a count of consumed ones. Callers decide whether to
//! persist any cleanup; this module never writes.

use credvend_types::{CredentialBlock, Listing};

/// The canonical, shape-independent view of a listing's pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPool {
    /// Sellable blocks in pool order (oldest-added first).
    pub available: Vec<CredentialBlock>,
    /// Blocks already consumed that are still observable in the pool
    /// (flagged inventory entries; removal-consumed blocks are gone).
    pub consumed: usize,
}

impl NormalizedPool {
    /// Total blocks observable in the pool.
    #[must_use]
    pub fn total(&self) -> usize {
        self.available.len() + self.consumed
    }
}

/// Normalize a listing's pool.
///
/// Shape resolution, in priority order:
/// - opaque text blocks populated: every non-blank block is available
///   (blank blocks carry no payload and are dropped from the view);
/// - legacy inventory populated: entries with `is_sold == false` are
///   available, the rest count as consumed;
/// - neither: empty.
///
/// Pool contents are ground truth. The listing's stored sold flag is a
/// derived projection and is deliberately ignored here; a stale flag
/// must never hide sellable blocks.
#[must_use]
pub fn normalize(listing: &Listing) -> NormalizedPool {
    if !listing.credentials.is_empty() {
        let available = listing
            .credentials
            .iter()
            .filter(|c| !c.trim().is_empty())
            .map(|c| CredentialBlock::Text(c.clone()))
            .collect();
        return NormalizedPool {
            available,
            consumed: 0,
        };
    }

    let mut available = Vec::new();
    let mut consumed = 0;
    for entry in &listing.credentials_inventory {
        if entry.is_sold {
            consumed += 1;
        } else {
            available.push(CredentialBlock::Record(entry.record.clone()));
        }
    }
    NormalizedPool { available, consumed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credvend_types::{CredentialRecord, InventoryEntry, UserId};
    use rust_decimal::Decimal;

    #[test]
    fn opaque_shape_filters_blanks() {
        let mut listing = Listing::dummy_opaque(Decimal::ONE, &["a:1", "b:2"]);
        listing.credentials.push("   ".to_string());
        let pool = normalize(&listing);
        assert_eq!(pool.available.len(), 2);
        assert_eq!(pool.consumed, 0);
        assert_eq!(pool.available[0], CredentialBlock::Text("a:1".to_string()));
    }

    #[test]
    fn inventory_shape_splits_sold() {
        let mut listing = Listing::dummy_inventory(Decimal::ONE, 4);
        listing.credentials_inventory[1].is_sold = true;
        listing.credentials_inventory[3].is_sold = true;
        let pool = normalize(&listing);
        assert_eq!(pool.available.len(), 2);
        assert_eq!(pool.consumed, 2);
        assert_eq!(pool.total(), 4);
    }

    #[test]
    fn empty_listing_normalizes_empty() {
        let listing = Listing::new("x", Decimal::ONE, UserId::new());
        let pool = normalize(&listing);
        assert!(pool.available.is_empty());
        assert_eq!(pool.consumed, 0);
    }

    #[test]
    fn opaque_shape_wins_over_inventory() {
        // A listing mid-migration can briefly carry both; the current
        // shape takes priority.
        let mut listing = Listing::dummy_opaque(Decimal::ONE, &["current:block"]);
        listing
            .credentials_inventory
            .push(InventoryEntry::unsold(CredentialRecord::dummy(0)));
        let pool = normalize(&listing);
        assert_eq!(pool.available.len(), 1);
        assert!(matches!(pool.available[0], CredentialBlock::Text(_)));
    }

    #[test]
    fn stale_sold_flag_does_not_hide_blocks() {
        let mut listing = Listing::dummy_opaque(Decimal::ONE, &["a:1"]);
        listing.is_sold = true;
        let pool = normalize(&listing);
        assert_eq!(pool.available.len(), 1);
    }

    #[test]
    fn normalize_is_pure() {
        let listing = Listing::dummy_inventory(Decimal::ONE, 3);
        let before = listing.clone();
        let _ = normalize(&listing);
        assert_eq!(listing.credentials_inventory, before.credentials_inventory);
        assert_eq!(listing.pool_version, before.pool_version);
    }

    #[test]
    fn ordering_is_fifo() {
        let listing = Listing::dummy_opaque(Decimal::ONE, &["first", "second", "third"]);
        let pool = normalize(&listing);
        let texts: Vec<String> = pool
            .available
            .iter()
            .map(|b| match b {
                CredentialBlock::Text(t) => t.clone(),
                CredentialBlock::Record(_) => unreachable!(),
            })
            .collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }
}
