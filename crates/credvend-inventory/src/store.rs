//! In-memory listing store with optimistic pool commits.
//!
//! The store is the single source of truth for listing state. Reads hand
//! out clones; pool mutations go back in through [`ListingStore::commit_pool`],
//! a compare-and-set on `pool_version`. A writer that loaded a stale
//! version gets [`CredvendError::StalePoolVersion`] and must reload —
//! this is what makes per-listing allocation linearizable without a
//! separate lock table.

use std::collections::HashMap;
use std::sync::RwLock;

use credvend_types::{CredvendError, Listing, ListingId, ListingSummary, Result};

/// Shared listing store. Cheap to share behind an `Arc`.
pub struct ListingStore {
    listings: RwLock<HashMap<ListingId, Listing>>,
}

impl ListingStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listings: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a listing as-is. Seeded historic data keeps its stored
    /// flags; every mutation path (`save`, `commit_pool` callers)
    /// re-derives them.
    pub fn insert(&self, listing: Listing) {
        self.listings
            .write()
            .expect("listing store lock poisoned")
            .insert(listing.id, listing);
    }

    /// Load a listing by id (clone; carries the pool version to commit
    /// against).
    #[must_use]
    pub fn find(&self, id: ListingId) -> Option<Listing> {
        self.listings
            .read()
            .expect("listing store lock poisoned")
            .get(&id)
            .cloned()
    }

    /// Seller-path save: unconditional overwrite that still re-derives
    /// the sold state and bumps the pool version, so any in-flight
    /// allocation against the old pool fails its commit and reloads.
    pub fn save(&self, mut listing: Listing) -> Result<()> {
        let mut listings = self.listings.write().expect("listing store lock poisoned");
        let current = listings
            .get(&listing.id)
            .ok_or(CredvendError::ListingNotFound(listing.id))?;
        listing.pool_version = current.pool_version + 1;
        listing.recompute_sold_state();
        listings.insert(listing.id, listing);
        Ok(())
    }

    /// Compare-and-set pool commit. Succeeds only if the stored version
    /// still matches the version the caller loaded; the committed
    /// listing gets the next version.
    pub fn commit_pool(&self, mut listing: Listing, expected_version: u64) -> Result<()> {
        let mut listings = self.listings.write().expect("listing store lock poisoned");
        let current = listings
            .get(&listing.id)
            .ok_or(CredvendError::ListingNotFound(listing.id))?;
        if current.pool_version != expected_version {
            return Err(CredvendError::StalePoolVersion(listing.id));
        }
        listing.pool_version = expected_version + 1;
        listings.insert(listing.id, listing);
        Ok(())
    }

    /// Remove a listing (seller delete). Returns whether it existed.
    pub fn remove(&self, id: ListingId) -> bool {
        self.listings
            .write()
            .expect("listing store lock poisoned")
            .remove(&id)
            .is_some()
    }

    /// Payload-free summaries of every listing, for catalog surfaces.
    #[must_use]
    pub fn summaries(&self) -> Vec<ListingSummary> {
        self.listings
            .read()
            .expect("listing store lock poisoned")
            .values()
            .map(Listing::summary)
            .collect()
    }

    /// Number of listings with at least one sellable block.
    #[must_use]
    pub fn count_available(&self) -> usize {
        self.listings
            .read()
            .expect("listing store lock poisoned")
            .values()
            .filter(|l| l.available_count() > 0)
            .count()
    }

    /// All listing ids (migration iteration order is unspecified).
    #[must_use]
    pub fn ids(&self) -> Vec<ListingId> {
        self.listings
            .read()
            .expect("listing store lock poisoned")
            .keys()
            .copied()
            .collect()
    }

    /// Number of listings tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listings
            .read()
            .expect("listing store lock poisoned")
            .len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ListingStore {
    fn default() -> Self {
        Self::new()
    }
}
