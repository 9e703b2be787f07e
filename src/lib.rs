//! chained-table: a fixed-capacity hash table that resolves collisions by
//! separate chaining.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: associate keys with values under a bucket array whose size is
//!   chosen once, without ever losing an entry to a collision.
//! - Layers:
//!   - Capacity: validated non-zero bucket count; integers convert with
//!     `TryFrom`, and `0` or negatives become `InvalidCapacity`.
//!   - Chain: one bucket, an ordered `Vec` of `(key, value, hash)` entries
//!     with pairwise distinct keys.
//!   - Table<K, V, S>: `capacity` chains, a running length and the
//!     `BuildHasher` that produces digests. An entry lives in chain
//!     `digest(key) % capacity`.
//!
//! Constraints
//! - Capacity is fixed for the table's lifetime. Nothing resizes, so `len`
//!   may exceed `capacity` and chains simply grow.
//! - O(1) average `insert`/`get`/`remove`/`contains_key` for a reasonable
//!   key spread; O(n) when every key lands in one chain.
//! - Single-threaded: the table is `Send` but not `Sync`. Share it across
//!   threads behind an external lock.
//! - Reentrancy: `K: Hash`/`K: Eq` must not reach back into the table that
//!   is probing. Debug builds panic on it; release builds do not check.
//!
//! Hashing contract
//! - Each entry stores its digest and chains compare digests before
//!   calling `Eq`. The table never validates that `Hash` agrees with `Eq`;
//!   breaking that agreement is a caller error.
//!
//! Snapshots
//! - `keys_view`, `values_view` and `pairs_view` return fresh owned
//!   collections. Later mutation of the table never shows through them.
//!
//! Equality
//! - Two tables are equal when they hold the same pairs. Capacity, digest
//!   and chain layout are not observable through `==`.

mod capacity;
mod chain;
mod error;
mod reentrancy;
pub mod table;
mod table_proptest;

// Public surface
pub use capacity::Capacity;
pub use error::{InvalidCapacity, KeyNotFound};
pub use table::{Iter, Table, DEFAULT_BUCKETS_PER_ENTRY};
