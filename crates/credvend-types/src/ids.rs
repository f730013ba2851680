//! Globally unique identifiers used throughout Credvend.
//!
//! Entity IDs use UUIDv7 for time-ordered lexicographic sorting. The
//! buyer-facing order reference is a separate human-readable
//! [`OrderNumber`] string, kept distinct from the internal [`OrderId`].

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants;

// ---------------------------------------------------------------------------
// ListingId
// ---------------------------------------------------------------------------

/// Globally unique identifier for a sellable listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ListingId(pub Uuid);

impl ListingId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for ListingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// UserId
// ---------------------------------------------------------------------------

/// Unique identifier for a user account (buyer, seller, or administrator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// OrderId
// ---------------------------------------------------------------------------

/// Globally unique internal order identifier. Uses UUIDv7 so orders sort
/// in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OrderId(pub Uuid);

impl OrderId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Extract the embedded timestamp (milliseconds since UNIX epoch) from UUIDv7.
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        let bytes = self.0.as_bytes();
        u64::from_be_bytes([
            0, 0, bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5],
        ])
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// OrderNumber
// ---------------------------------------------------------------------------

/// Human-readable order reference shown to buyers (`ORD-<millis>-<RAND6>`).
///
/// This is the permanent receipt reference; the internal [`OrderId`] never
/// leaves the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OrderNumber(pub String);

impl OrderNumber {
    /// Generate a fresh order number from the current wall clock plus a
    /// random suffix.
    #[must_use]
    pub fn generate() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        Self(format!(
            "{}-{}-{}",
            constants::ORDER_NUMBER_PREFIX,
            millis,
            random_suffix(constants::ORDER_NUMBER_SUFFIX_LEN)
        ))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Uppercase alphanumeric suffix used by order numbers and payment codes.
#[must_use]
pub(crate) fn random_suffix(len: usize) -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| {
            let idx = rng.gen_range(0..constants::CODE_ALPHABET.len());
            constants::CODE_ALPHABET[idx] as char
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_id_uniqueness() {
        let a = ListingId::new();
        let b = ListingId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn order_id_ordering() {
        let a = OrderId::new();
        let b = OrderId::new();
        assert!(a < b);
    }

    #[test]
    #[allow(clippy::cast_possible_truncation)]
    fn order_id_timestamp_extraction() {
        let before = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let id = OrderId::new();
        let after = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let ts = id.timestamp_ms();
        assert!(
            ts >= before && ts <= after,
            "ts={ts}, before={before}, after={after}"
        );
    }

    #[test]
    fn order_number_format() {
        let n = OrderNumber::generate();
        assert!(n.as_str().starts_with("ORD-"), "Got: {n}");
        let parts: Vec<&str> = n.as_str().split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2].len(), 6);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn order_numbers_differ() {
        let a = OrderNumber::generate();
        let b = OrderNumber::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn random_suffix_alphabet() {
        let s = random_suffix(32);
        assert_eq!(s.len(), 32);
        assert!(s.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn serde_roundtrips() {
        let lid = ListingId::new();
        let json = serde_json::to_string(&lid).unwrap();
        let back: ListingId = serde_json::from_str(&json).unwrap();
        assert_eq!(lid, back);

        let n = OrderNumber::generate();
        let json = serde_json::to_string(&n).unwrap();
        let back: OrderNumber = serde_json::from_str(&json).unwrap();
        assert_eq!(n, back);
    }
}
