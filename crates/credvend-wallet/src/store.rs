//! In-memory buyer store.
//!
//! Reads hand out clones; mutations run inside [`BuyerStore::update`],
//! which holds the write lock across the caller's closure. That closure
//! is the check-and-act unit the ledger builds on.

use std::collections::HashMap;
use std::sync::RwLock;

use credvend_types::{Buyer, CredvendError, Result, UserId};

/// Shared buyer store. Cheap to share behind an `Arc`.
pub struct BuyerStore {
    buyers: RwLock<HashMap<UserId, Buyer>>,
}

impl BuyerStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buyers: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace a buyer.
    pub fn insert(&self, buyer: Buyer) {
        self.buyers
            .write()
            .expect("buyer store lock poisoned")
            .insert(buyer.id, buyer);
    }

    /// Load a buyer by id (clone).
    #[must_use]
    pub fn find(&self, id: UserId) -> Option<Buyer> {
        self.buyers
            .read()
            .expect("buyer store lock poisoned")
            .get(&id)
            .cloned()
    }

    /// Run a mutation against a buyer while holding the write lock.
    /// Check-then-act sequences inside `f` observe no interleaved writes.
    ///
    /// # Errors
    /// `BuyerNotFound` if the buyer does not exist; otherwise whatever
    /// `f` returns.
    pub fn update<T>(&self, id: UserId, f: impl FnOnce(&mut Buyer) -> Result<T>) -> Result<T> {
        let mut buyers = self.buyers.write().expect("buyer store lock poisoned");
        let buyer = buyers.get_mut(&id).ok_or(CredvendError::BuyerNotFound(id))?;
        f(buyer)
    }

    /// Number of buyers tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buyers.read().expect("buyer store lock poisoned").len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BuyerStore {
    fn default() -> Self {
        Self::new()
    }
}
