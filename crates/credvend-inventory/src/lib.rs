//! # credvend-inventory
//!
//! **Inventory Plane**: credential pool normalization, atomic allocation,
//! the versioned listing store, and the one-time legacy-shape migration.
//!
//! ## Architecture
//!
//! 1. **normalizer**: pure read — resolves whichever legacy shape a
//!    listing carries into one canonical available/consumed view
//! 2. **ListingStore**: shared in-memory store with compare-and-set pool
//!    commits, the concurrency guard that makes allocation linearizable
//! 3. **AllocationEngine**: reserves `k` blocks FIFO, marks them
//!    consumed, and commits the new pool state as one logical write
//! 4. **migrate**: converts the oldest single-record shape into
//!    inventory entries, off the hot path
//!
//! ## Allocation Flow
//!
//! ```text
//! load listing (clone + version) → normalize → take k blocks
//!     → recompute derived flags → commit_pool(CAS) → blocks to the order
//! ```
//!
//! A failed CAS reloads and retries; two racing allocations against the
//! same pool can never both consume the same block.

pub mod allocation;
pub mod migrate;
pub mod normalizer;
pub mod store;

pub use allocation::AllocationEngine;
pub use migrate::migrate_legacy_records;
pub use normalizer::{NormalizedPool, normalize};
pub use store::ListingStore;
