//! Error types for the Credvend fulfillment engine.
//!
//! All errors use the `CV_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Listing / inventory errors
//! - 2xx: Wallet errors
//! - 3xx: Payment-code errors
//! - 4xx: Order / checkout errors
//! - 5xx: Configuration errors
//! - 9xx: General / internal errors
//!
//! Everything in the 1xx–5xx range is a recoverable, caller-facing outcome
//! (a buyer raced another buyer, a cart went stale, a rail is switched off).
//! Only the 9xx range signals a defect or unreachable infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{ListingId, PaymentCodeState, UserId};

/// Central error enum for all Credvend operations.
#[derive(Debug, Error)]
pub enum CredvendError {
    // =================================================================
    // Listing / Inventory Errors (1xx)
    // =================================================================
    /// The requested listing does not exist in the store.
    #[error("CV_ERR_100: Listing not found: {0}")]
    ListingNotFound(ListingId),

    /// The listing's pool holds fewer available blocks than requested.
    #[error(
        "CV_ERR_101: Insufficient inventory for listing {listing}: available {available}, requested {requested}"
    )]
    InsufficientInventory {
        listing: ListingId,
        available: usize,
        requested: usize,
    },

    /// A pool commit raced another writer and the retry budget ran out.
    #[error("CV_ERR_102: Allocation contention on listing {0}: commit retries exhausted")]
    AllocationContention(ListingId),

    /// Optimistic-concurrency conflict: the pool changed under the writer.
    /// Retryable; the allocation engine reloads and tries again.
    #[error("CV_ERR_103: Stale pool version for listing {0}")]
    StalePoolVersion(ListingId),

    /// Requested quantity was zero.
    #[error("CV_ERR_104: Allocation quantity must be at least 1")]
    InvalidQuantity,

    // =================================================================
    // Wallet Errors (2xx)
    // =================================================================
    /// Not enough stored balance to cover the debit.
    #[error("CV_ERR_200: Insufficient balance: have {balance}, need {required}")]
    InsufficientBalance { balance: Decimal, required: Decimal },

    /// Top-up amount outside the configured policy bounds.
    #[error("CV_ERR_201: Invalid amount {amount}: must be between {min} and {max}")]
    InvalidAmount {
        amount: Decimal,
        min: Decimal,
        max: Decimal,
    },

    /// The buyer account does not exist.
    #[error("CV_ERR_202: Buyer not found: {0}")]
    BuyerNotFound(UserId),

    // =================================================================
    // Payment-Code Errors (3xx)
    // =================================================================
    /// No payment code with that value (or not visible to the requester).
    #[error("CV_ERR_300: Payment code not found: {0}")]
    CodeNotFound(String),

    /// The code already left the PENDING state; it cannot be verified again.
    #[error("CV_ERR_301: Payment code is already {state}")]
    CodeAlreadyResolved { state: PaymentCodeState },

    /// The code's TTL elapsed before verification.
    #[error("CV_ERR_302: Payment code has expired: {0}")]
    CodeExpired(String),

    /// Every generation attempt collided with an existing code.
    #[error("CV_ERR_303: Failed to generate a unique payment code")]
    CodeGenerationExhausted,

    /// A state-machine transition that the lifecycle does not permit.
    #[error("CV_ERR_304: Cannot transition payment code from {from} to {to}")]
    InvalidCodeTransition {
        from: PaymentCodeState,
        to: PaymentCodeState,
    },

    /// A code with this value already exists in the store.
    #[error("CV_ERR_305: Duplicate payment code: {0}")]
    DuplicateCode(String),

    // =================================================================
    // Order / Checkout Errors (4xx)
    // =================================================================
    /// One or more cart lines reference listings that no longer exist.
    /// Expected between browsing and checkout; not a server fault.
    #[error("CV_ERR_400: Stale cart items: {invalid_ids:?}")]
    StaleCartItems { invalid_ids: Vec<ListingId> },

    /// Checkout was called with no cart lines.
    #[error("CV_ERR_401: Cart is empty")]
    EmptyCart,

    /// The external payment oracle did not confirm the payment.
    #[error("CV_ERR_402: Payment rejected for reference {reference}: {reason}")]
    PaymentRejected { reference: String, reason: String },

    // =================================================================
    // Configuration Errors (5xx)
    // =================================================================
    /// The bank-transfer rail is administratively disabled.
    #[error("CV_ERR_500: Bank-transfer payments are currently disabled")]
    RailDisabled,

    /// The bank-transfer rail is enabled but missing its account details.
    #[error("CV_ERR_501: Bank-transfer payments are not fully configured")]
    RailNotConfigured,

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// A promised postcondition did not hold (e.g. allocation returned
    /// fewer blocks than requested). Fatal for the operation.
    #[error("CV_ERR_900: Invariant violation: {0}")]
    InvariantViolation(String),

    /// Unrecoverable internal error.
    #[error("CV_ERR_901: Internal error: {0}")]
    Internal(String),

    /// I/O error (disk, network).
    #[error("CV_ERR_902: I/O error: {0}")]
    Io(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, CredvendError>;

// Conversion from std::io::Error
impl From<std::io::Error> for CredvendError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
