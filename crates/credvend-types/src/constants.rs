//! System-wide constants for the Credvend fulfillment engine.

use rust_decimal::Decimal;

/// How long a payment code stays redeemable after generation (hours).
pub const PAYMENT_CODE_TTL_HOURS: i64 = 24;

/// Maximum attempts at generating a collision-free payment code.
pub const MAX_CODE_GENERATION_ATTEMPTS: usize = 10;

/// Maximum compare-and-set retries for a single pool commit before the
/// allocation is abandoned as contended.
pub const MAX_POOL_COMMIT_RETRIES: usize = 8;

/// Minimum wallet top-up amount (currency units).
pub const MIN_TOPUP: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Maximum wallet top-up amount (currency units).
pub const MAX_TOPUP: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Prefix for buyer-facing order references.
pub const ORDER_NUMBER_PREFIX: &str = "ORD";

/// Random suffix length on order references.
pub const ORDER_NUMBER_SUFFIX_LEN: usize = 6;

/// Prefix for bank-transfer payment codes.
pub const PAYMENT_CODE_PREFIX: &str = "BT";

/// Random suffix length on payment codes.
pub const PAYMENT_CODE_SUFFIX_LEN: usize = 4;

/// Alphabet for generated references and codes (unambiguous uppercase).
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Credvend";
