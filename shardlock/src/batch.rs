//! Locality-sorted batch insertion.
//!
//! A batch goes through two independent stages:
//!
//! 1. [`sort_by_shard`] reorders the caller's buffer in place so that keys
//!    owned by the same shard sit next to each other, shards in descending
//!    index order.
//! 2. [`dispatch`] hands the sorted slice to the pool. Rayon splits it into
//!    contiguous sub-ranges, so each worker walks a narrow run of adjacent
//!    shards and mostly re-acquires a lock whose cache line it already owns,
//!    instead of bouncing across the whole table.
//!
//! The stages are kept apart so the ordering can be checked without any
//! container or pool involved.

use core::cmp::Reverse;
use rayon::slice::ParallelSliceMut;
use tracing::trace;

use crate::pool;
use crate::router::{Router, RoutingKey};

/// Below this many items the sort stays on the calling thread.
const PARALLEL_SORT_THRESHOLD: usize = 1 << 14;

/// Sorts `items` by descending shard index of `key(item)`.
///
/// The relative order of items that route to the same shard is unspecified.
pub fn sort_by_shard_with<T, K, F>(router: &Router, items: &mut [T], key: F)
where
    T: Send,
    K: RoutingKey,
    F: Fn(&T) -> K + Sync,
{
    if items.len() < 2 {
        return;
    }
    let by_shard = |item: &T| Reverse(router.route(&key(item)));
    if items.len() < PARALLEL_SORT_THRESHOLD {
        items.sort_unstable_by_key(by_shard);
    } else {
        items.par_sort_unstable_by_key(by_shard);
    }
}

/// Sorts a key batch by descending shard index.
pub fn sort_by_shard<K: RoutingKey>(router: &Router, keys: &mut [K]) {
    sort_by_shard_with(router, keys, |k| *k);
}

/// Runs `insert` for every item on the current pool.
pub fn dispatch<T, F>(items: &[T], insert: F)
where
    T: Sync,
    F: Fn(&T) + Send + Sync,
{
    if items.is_empty() {
        return;
    }
    trace!(len = items.len(), "dispatching sorted batch");
    pool::parallel_for_each(items, insert);
}

/// Whether `items` is ordered by descending shard index, with every shard's
/// items forming one contiguous run.
pub fn is_shard_sorted<T, K, F>(router: &Router, items: &[T], key: F) -> bool
where
    K: RoutingKey,
    F: Fn(&T) -> K,
{
    items
        .windows(2)
        .all(|w| router.route(&key(&w[0])) >= router.route(&key(&w[1])))
}
