//! Lock-striped concurrent map and set for fixed-width integer keys.
//!
//! `shardlock` splits its key space over a fixed array of shards. Each shard
//! is an ordinary hash collection behind its own mutex, padded out to a full
//! cache line so that neighbouring shards never false-share. A key is routed
//! to its shard by hashing its high half, and every operation locks exactly
//! one shard.
//!
//! # Features
//!
//! - **Striped locking**: contention only between keys owned by the same shard
//! - **Over-provisioned shards**: `workers * blow_up_factor` shards, optionally
//!   rounded to a power of two so routing is a mask
//! - **Locality-sorted batches**: `insert_batch` groups keys by shard before
//!   fanning out, so each worker walks adjacent shards
//! - **Parallel reduction**: `sum` folds every shard on the rayon pool and
//!   merges per-worker partials
//! - **No resizing**: the shard count is fixed at construction
//!
//! # Example
//!
//! ```rust
//! use shardlock::ShardedSet;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let set = Arc::new(ShardedSet::<u64>::new(4));
//!
//! let handles: Vec<_> = (0..4u64)
//!     .map(|t| {
//!         let set = Arc::clone(&set);
//!         thread::spawn(move || {
//!             for i in 0..100u64 {
//!                 set.insert((t << 32) | i);
//!             }
//!         })
//!     })
//!     .collect();
//! for h in handles {
//!     h.join().unwrap();
//! }
//!
//! assert_eq!(set.len(), 400);
//! assert!(set.contains(&((3 << 32) | 99)));
//! ```

#![warn(missing_docs)]

pub mod batch;
pub mod config;
mod error;
mod map;
pub mod pool;
pub mod reduce;
pub mod router;
mod set;
mod shard;
mod table;
pub mod utils;

pub use crate::config::{Config, DEFAULT_BLOW_UP_FACTOR, ShardPolicy};
pub use crate::error::{Error, Result};
pub use crate::map::ShardedMap;
pub use crate::reduce::{Reducer, SumReducer};
pub use crate::router::{Router, RoutingKey};
pub use crate::set::ShardedSet;
