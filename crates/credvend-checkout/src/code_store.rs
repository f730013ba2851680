//! In-memory payment-code store, keyed by the code value itself.
//!
//! Insertion is the uniqueness check: two codes with the same value can
//! never coexist, which is what the registry's bounded generation loop
//! retries against.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use credvend_types::{CredvendError, PaymentCode, PaymentCodeState, Result, UserId};

/// Shared payment-code store. Cheap to share behind an `Arc`.
pub struct PaymentCodeStore {
    codes: RwLock<HashMap<String, PaymentCode>>,
}

impl PaymentCodeStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            codes: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a new code. Fails if the value is already taken.
    pub fn insert(&self, code: PaymentCode) -> Result<()> {
        let mut codes = self.codes.write().expect("code store lock poisoned");
        if codes.contains_key(&code.code) {
            return Err(CredvendError::DuplicateCode(code.code));
        }
        codes.insert(code.code.clone(), code);
        Ok(())
    }

    /// Load a code by value (clone).
    #[must_use]
    pub fn find(&self, value: &str) -> Option<PaymentCode> {
        self.codes
            .read()
            .expect("code store lock poisoned")
            .get(value)
            .cloned()
    }

    /// Persist a state change to an existing code.
    pub fn save(&self, code: PaymentCode) -> Result<()> {
        let mut codes = self.codes.write().expect("code store lock poisoned");
        if !codes.contains_key(&code.code) {
            return Err(CredvendError::CodeNotFound(code.code));
        }
        codes.insert(code.code.clone(), code);
        Ok(())
    }

    /// All codes still pending and inside their TTL at `now`, newest
    /// first. This is the admin verification queue.
    #[must_use]
    pub fn pending_codes(&self, now: DateTime<Utc>) -> Vec<PaymentCode> {
        let mut pending: Vec<PaymentCode> = self
            .codes
            .read()
            .expect("code store lock poisoned")
            .values()
            .filter(|c| c.effective_state(now) == PaymentCodeState::Pending)
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        pending
    }

    /// A buyer's codes, newest first, regardless of state.
    #[must_use]
    pub fn codes_for_buyer(&self, buyer: UserId) -> Vec<PaymentCode> {
        let mut codes: Vec<PaymentCode> = self
            .codes
            .read()
            .expect("code store lock poisoned")
            .values()
            .filter(|c| c.buyer == buyer)
            .cloned()
            .collect();
        codes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        codes
    }

    /// Persist the EXPIRED state onto every pending code whose TTL has
    /// elapsed at `now`. Returns the number of codes swept.
    pub fn expire_overdue(&self, now: DateTime<Utc>) -> usize {
        let mut codes = self.codes.write().expect("code store lock poisoned");
        let mut swept = 0;
        for code in codes.values_mut() {
            if code.state == PaymentCodeState::Pending
                && code.is_expired_at(now)
                && code.mark_expired().is_ok()
            {
                swept += 1;
            }
        }
        swept
    }

    /// Number of codes tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.read().expect("code store lock poisoned").len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PaymentCodeStore {
    fn default() -> Self {
        Self::new()
    }
}
