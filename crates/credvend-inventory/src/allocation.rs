//! Allocation engine — exclusive assignment of credential blocks.
//!
//! `allocate` is the only code path that consumes inventory, and
//! `release` the only one that compensates. Both follow the same
//! discipline: load a listing clone, mutate the pool, re-derive the sold
//! state, and commit with compare-and-set. A stale commit reloads and
//! retries within a bounded budget, so two racing allocations can never
//! both take the same block.

use std::sync::Arc;

use chrono::Utc;
use credvend_types::{
    CredentialBlock, CredvendError, Listing, ListingId, Result, UserId, constants,
};

use crate::normalizer::normalize;
use crate::store::ListingStore;

/// Reserves and releases credential blocks against the listing store.
pub struct AllocationEngine {
    store: Arc<ListingStore>,
}

impl AllocationEngine {
    #[must_use]
    pub fn new(store: Arc<ListingStore>) -> Self {
        Self { store }
    }

    /// The store this engine allocates against.
    #[must_use]
    pub fn store(&self) -> &Arc<ListingStore> {
        &self.store
    }

    /// Atomically allocate `quantity` blocks from a listing's pool to a
    /// buyer, FIFO. Returns the allocated blocks verbatim — the only
    /// place the secret payload crosses into an order.
    ///
    /// On success the blocks are gone from the available pool (removed,
    /// or flagged and stamped) and the listing's derived sold state is
    /// committed in the same logical write.
    ///
    /// # Errors
    /// - `InvalidQuantity` if `quantity` is zero
    /// - `ListingNotFound` if the listing does not exist
    /// - `InsufficientInventory` if fewer blocks are available; the pool
    ///   is left untouched
    /// - `AllocationContention` if the commit retry budget runs out
    pub fn allocate(
        &self,
        listing_id: ListingId,
        quantity: u32,
        buyer: UserId,
    ) -> Result<Vec<CredentialBlock>> {
        if quantity == 0 {
            return Err(CredvendError::InvalidQuantity);
        }

        for attempt in 0..constants::MAX_POOL_COMMIT_RETRIES {
            let mut listing = self
                .store
                .find(listing_id)
                .ok_or(CredvendError::ListingNotFound(listing_id))?;
            let expected = listing.pool_version;

            let blocks = take_blocks(&mut listing, quantity, buyer)?;
            if blocks.len() != quantity as usize {
                return Err(CredvendError::InvariantViolation(format!(
                    "allocation produced {} blocks, promised {quantity}",
                    blocks.len()
                )));
            }
            listing.recompute_sold_state();
            let remaining = listing.available_count();

            match self.store.commit_pool(listing, expected) {
                Ok(()) => {
                    tracing::info!(
                        listing = %listing_id,
                        quantity,
                        remaining,
                        "allocated credential blocks"
                    );
                    return Ok(blocks);
                }
                Err(CredvendError::StalePoolVersion(_)) => {
                    tracing::warn!(
                        listing = %listing_id,
                        attempt,
                        "pool commit raced another writer, retrying"
                    );
                }
                Err(other) => return Err(other),
            }
        }

        Err(CredvendError::AllocationContention(listing_id))
    }

    /// Compensating release: return previously allocated blocks to the
    /// pool. Opaque blocks go back at the front (restoring FIFO order);
    /// inventory entries get their sold markers cleared. Entries the
    /// seller deleted in the meantime are re-appended rather than lost.
    pub fn release(&self, listing_id: ListingId, blocks: &[CredentialBlock]) -> Result<()> {
        if blocks.is_empty() {
            return Ok(());
        }

        for _ in 0..constants::MAX_POOL_COMMIT_RETRIES {
            let mut listing = self
                .store
                .find(listing_id)
                .ok_or(CredvendError::ListingNotFound(listing_id))?;
            let expected = listing.pool_version;

            restore_blocks(&mut listing, blocks);
            listing.recompute_sold_state();

            match self.store.commit_pool(listing, expected) {
                Ok(()) => {
                    tracing::info!(
                        listing = %listing_id,
                        count = blocks.len(),
                        "released credential blocks back to pool"
                    );
                    return Ok(());
                }
                Err(CredvendError::StalePoolVersion(_)) => {}
                Err(other) => return Err(other),
            }
        }

        Err(CredvendError::AllocationContention(listing_id))
    }
}

/// Take the first `quantity` available blocks out of whichever shape is
/// live. Fails without mutating if not enough are available.
fn take_blocks(listing: &mut Listing, quantity: u32, buyer: UserId) -> Result<Vec<CredentialBlock>> {
    let requested = quantity as usize;
    let available = normalize(listing).available.len();
    if available < requested {
        return Err(CredvendError::InsufficientInventory {
            listing: listing.id,
            available,
            requested,
        });
    }

    if !listing.credentials.is_empty() {
        // Opaque shape: consumption is removal; the remainder persists
        // as the new pool.
        let mut taken = Vec::with_capacity(requested);
        let mut kept = Vec::new();
        for block in listing.credentials.drain(..) {
            if taken.len() < requested && !block.trim().is_empty() {
                taken.push(CredentialBlock::Text(block));
            } else {
                kept.push(block);
            }
        }
        listing.credentials = kept;
        Ok(taken)
    } else {
        // Inventory shape: consumption flips the sold marker and stamps
        // the sale.
        let now = Utc::now();
        let mut taken = Vec::with_capacity(requested);
        for entry in &mut listing.credentials_inventory {
            if taken.len() == requested {
                break;
            }
            if !entry.is_sold {
                entry.is_sold = true;
                entry.sold_at = Some(now);
                entry.sold_to = Some(buyer);
                taken.push(CredentialBlock::Record(entry.record.clone()));
            }
        }
        Ok(taken)
    }
}

fn restore_blocks(listing: &mut Listing, blocks: &[CredentialBlock]) {
    let mut front = 0;
    for block in blocks {
        match block {
            CredentialBlock::Text(text) => {
                listing.credentials.insert(front, text.clone());
                front += 1;
            }
            CredentialBlock::Record(record) => {
                if let Some(entry) = listing
                    .credentials_inventory
                    .iter_mut()
                    .find(|e| e.is_sold && e.record == *record)
                {
                    entry.is_sold = false;
                    entry.sold_at = None;
                    entry.sold_to = None;
                } else {
                    listing
                        .credentials_inventory
                        .push(credvend_types::InventoryEntry::unsold(record.clone()));
                }
            }
        }
    }
}
