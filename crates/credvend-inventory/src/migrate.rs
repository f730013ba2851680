//! One-time migration of the oldest credential shape.
//!
//! Listings created before the inventory array existed carry a single
//! structured record. This converts each such record into an inventory
//! entry (preserving the listing's sold status on the entry) so the
//! normalizer only ever has to deal with the two array shapes. Runs off
//! the hot path; idempotent.

use credvend_types::{CredvendError, InventoryEntry, Result};

use crate::store::ListingStore;

/// Migrate every listing still carrying the single-record shape. Returns
/// the number of listings converted.
pub fn migrate_legacy_records(store: &ListingStore) -> Result<usize> {
    let mut migrated = 0;

    for id in store.ids() {
        // Commit per listing; a conflict with a live allocation just
        // means we reload and look again.
        loop {
            let Some(mut listing) = store.find(id) else {
                break; // deleted mid-migration
            };
            let Some(record) = listing.legacy_credential.take() else {
                break; // nothing to migrate
            };
            let expected = listing.pool_version;

            if listing.credentials.is_empty() && listing.credentials_inventory.is_empty() {
                let mut entry = InventoryEntry::unsold(record);
                entry.is_sold = listing.is_sold;
                listing.credentials_inventory.push(entry);
            }
            // A populated array shape wins; the stale record is dropped
            // either way.
            listing.recompute_sold_state();

            match store.commit_pool(listing, expected) {
                Ok(()) => {
                    migrated += 1;
                    break;
                }
                Err(CredvendError::StalePoolVersion(_)) => {}
                Err(other) => return Err(other),
            }
        }
    }

    tracing::info!(migrated, "legacy credential migration finished");
    Ok(migrated)
}
