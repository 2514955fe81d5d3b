//! # StripedMap
//!
//! A lock-striped concurrent hash map with value semantics.
//!
//! StripedMap splits the key space across a fixed number of shards, each a
//! plain hash table behind its own reader-writer lock. Operations on
//! different shards never block each other, and reads on the same shard run
//! concurrently. Values are stored by value: lookups hand back clones, and
//! in-place access happens only through callbacks that run while the shard
//! lock is held.
//!
//! ## Features
//!
//! - **Striped Locking**: one `RwLock` per shard, cache-line padded
//! - **Atomic Compound Operations**: `merge`, `compute_if_absent`,
//!   `get_or_insert_with`, `try_insert` each run in a single critical section
//! - **Callback Access**: `inspect`, `inspect_map`, `inspect_and_then`, `update`
//! - **Well-Distributed Routing**: key hashes pass a splitmix64 finalizer
//!   before shard selection
//! - **Statistics**: per-shard load and (with `metrics`) operation counters
//!
//! ## Example
//!
//! ```rust
//! use stripedmap::StripedMap;
//!
//! let map = StripedMap::new();
//!
//! // Upsert
//! assert_eq!(map.insert("apples", 3), None);
//! assert_eq!(map.insert("apples", 5), Some(3));
//!
//! // Insert only if absent
//! assert!(!map.try_insert("apples", 7));
//!
//! // Combine with the stored value, or delete it
//! map.merge("apples", 2, |current, extra| Some(current + extra));
//! assert_eq!(map.get(&"apples"), Some(7));
//!
//! // Whole-map scans walk the shards one lock at a time
//! map.insert("pears", 0);
//! assert_eq!(map.remove_if(|_, count| *count == 0), 1);
//! assert_eq!(map.len(), 1);
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use stripedmap::{HashFunction, StripedMapBuilder};
//!
//! let map = StripedMapBuilder::new()
//!     .shard_count(8)?
//!     .capacity_per_shard(64)
//!     .hash_function(HashFunction::AHash)
//!     .build::<String, i32>()?;
//! assert_eq!(map.shard_count(), 8);
//! # Ok::<(), stripedmap::Error>(())
//! ```
//!
//! ## Consistency
//!
//! Single-key operations are linearizable per key. Whole-map operations
//! (`len`, `clear`, `for_each`, `remove_if`, `update_if`, `find`, iteration)
//! visit shards in index order and hold at most one shard lock at a time, so
//! they observe a lock-by-lock walk, not an atomic snapshot.

#![deny(missing_docs)]
#![warn(clippy::all)]

/// Configuration and builder types.
pub mod config;
/// Error types.
pub mod error;
/// Key hashing and the routing finalizer.
pub mod hash;
/// Iterator implementations.
pub mod iter;
/// Internal shard implementation.
mod shard;
/// Statistics and diagnostics.
pub mod stats;
/// Main StripedMap implementation.
pub mod stripedmap;

// Re-export main types
pub use config::{Config, HashFunction, RoutingConfig, ShardRouter, StripedMapBuilder};
pub use error::Error;
pub use stats::{Diagnostics, ShardOps, Stats};
pub use stripedmap::{MapKey, StripedMap};
