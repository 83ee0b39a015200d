use foldhash::fast::FixedState;
use std::collections::HashSet;

use crate::batch;
use crate::config::{Config, ShardPolicy};
use crate::error::Result;
use crate::reduce::SumReducer;
use crate::router::RoutingKey;
use crate::table::ShardTable;

/// Lock-striped concurrent set of fixed-width unsigned keys.
///
/// Keys are routed to one of a fixed number of cache-line isolated shards,
/// each guarded by its own mutex. Operations on keys owned by different
/// shards never contend; operations on the same shard serialize on its lock.
///
/// # Examples
///
/// ```
/// use shardlock::ShardedSet;
///
/// let set = ShardedSet::new(4);
/// set.insert(3u64);
/// set.insert(11);
///
/// let mut batch = vec![19u64, 27];
/// set.insert_batch(&mut batch);
///
/// assert!(set.contains(&19));
/// assert_eq!(set.sum(), 60);
/// ```
pub struct ShardedSet<K> {
    table: ShardTable<HashSet<K, FixedState>>,
}

impl<K: RoutingKey> ShardedSet<K> {
    /// Creates a set sized for `workers` with the default blow-up factor,
    /// rounded up to a power-of-two shard count.
    pub fn new(workers: usize) -> Self {
        Self::with_config(Config::new(workers))
    }

    /// Creates a set with `workers * blow_up_factor` shards, rounded up to a
    /// power of two.
    pub fn with_blow_up(workers: usize, blow_up_factor: usize) -> Self {
        Self::with_config(Config::new(workers).with_blow_up_factor(blow_up_factor))
    }

    /// Creates a set with exactly `workers * blow_up_factor` shards.
    pub fn with_exact_shards(workers: usize, blow_up_factor: usize) -> Self {
        Self::with_config(
            Config::new(workers)
                .with_blow_up_factor(blow_up_factor)
                .with_policy(ShardPolicy::Exact),
        )
    }

    /// Creates an empty container laid out as `config` describes.
    ///
    /// Zero workers or a zero blow-up factor yield a single shard.
    ///
    /// # Panics
    ///
    /// Panics if the shard count overflows `usize`. The other infallible
    /// constructors share this behavior; use
    /// [`try_with_config`](Self::try_with_config) for untrusted sizes.
    pub fn with_config(config: Config) -> Self {
        Self {
            table: ShardTable::new(config),
        }
    }

    /// Validates `config` before allocating any shard.
    pub fn try_with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    /// Number of shards, fixed for the container's lifetime.
    pub fn shard_count(&self) -> usize {
        self.table.shard_count()
    }

    /// The configuration this container was built from.
    pub fn config(&self) -> &Config {
        self.table.config()
    }

    /// Adds `key`. Returns `false` if it was already present.
    #[inline]
    pub fn insert(&self, key: K) -> bool {
        self.table.shard_for(&key).insert(key)
    }

    /// Removes `key`. Removing an absent key is a no-op returning `false`.
    #[inline]
    pub fn remove(&self, key: &K) -> bool {
        self.table.shard_for(key).remove(key)
    }

    /// Whether `key` is present.
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.table.shard_for(key).contains(key)
    }

    /// Inserts every key of `keys` in parallel.
    ///
    /// The buffer is first sorted in place by owning shard, so its original
    /// order is lost; keys therefore reach their shard locks in an order
    /// unrelated to the one they were passed in.
    pub fn insert_batch(&self, keys: &mut [K]) {
        if keys.is_empty() {
            return;
        }
        batch::sort_by_shard(self.table.router(), keys);
        batch::dispatch(keys, |k| {
            self.insert(*k);
        });
    }

    /// Wrapping sum of every element, locking each shard once.
    ///
    /// Each shard's contribution is consistent with its state at the moment
    /// it was locked. Concurrent inserts into other shards are not ordered
    /// against the result, so this is not a global snapshot.
    pub fn sum(&self) -> K {
        self.table.reduce_locked_with(SumReducer::<K>::sum(), sum_shard)
    }

    /// Wrapping sum of every element without taking any shard lock.
    ///
    /// Requires exclusive access, which is what makes skipping the locks
    /// sound: no writer can be active while this runs. Use it to measure a
    /// quiescent set.
    pub fn sum_no_lock(&mut self) -> K {
        self.table.reduce_exclusive_with(SumReducer::<K>::sum(), sum_shard)
    }

    /// Number of elements, counted shard by shard.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether no shard holds any entry.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empties every shard, one lock at a time.
    pub fn clear(&self) {
        self.table.clear()
    }

    #[cfg(test)]
    pub(crate) fn shard_lens(&self) -> Vec<usize> {
        self.table.shard_lens()
    }
}

fn sum_shard<K: RoutingKey>(set: &HashSet<K, FixedState>) -> K {
    set.iter().fold(K::ZERO, |acc, k| acc.wrapping_add(*k))
}

impl<K: RoutingKey> Default for ShardedSet<K> {
    /// Sized for the current rayon pool.
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

impl<K: RoutingKey> core::fmt::Debug for ShardedSet<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ShardedSet")
            .field("shards", &self.shard_count())
            .field("policy", &self.config().policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_insert_contains_remove() {
        let set = ShardedSet::new(2);
        assert!(!set.contains(&5u64));
        assert!(set.insert(5));
        assert!(set.contains(&5));
        assert!(set.remove(&5));
        assert!(!set.contains(&5));
        assert!(!set.remove(&5));
    }

    #[test]
    fn test_duplicate_insert_is_noop() {
        let set = ShardedSet::new(2);
        assert!(set.insert(9u32));
        assert!(!set.insert(9));
        assert!(set.contains(&9));
        assert_eq!(set.len(), 1);
        assert_eq!(set.sum(), 9);
    }

    #[test]
    fn test_shard_counts_per_policy() {
        assert_eq!(ShardedSet::<u64>::with_blow_up(2, 10).shard_count(), 32);
        assert_eq!(ShardedSet::<u64>::with_exact_shards(2, 10).shard_count(), 20);
        assert_eq!(ShardedSet::<u64>::new(1).shard_count(), 16);
    }

    #[test]
    fn test_batch_example_sums_to_sixty() {
        let set = ShardedSet::with_exact_shards(1, 4);
        let mut batch = vec![27u64, 3, 19, 11];
        set.insert_batch(&mut batch);
        assert_eq!(set.sum(), 60);
        for k in [3u64, 11, 19, 27] {
            assert!(set.contains(&k));
        }
    }

    #[test]
    fn test_insert_batch_sorts_caller_buffer() {
        let set = ShardedSet::with_blow_up(4, 4);
        let mut batch: Vec<u64> = (0..500u64).map(|i| i << 32).collect();
        set.insert_batch(&mut batch);
        assert!(batch::is_shard_sorted(set.table.router(), &batch, |k| *k));
        assert_eq!(set.len(), 500);
    }

    #[test]
    fn test_empty_batch() {
        let set: ShardedSet<u64> = ShardedSet::new(2);
        set.insert_batch(&mut []);
        assert!(set.is_empty());
        assert_eq!(set.sum(), 0);
    }

    #[test]
    fn test_sum_no_lock_matches_sum() {
        let mut set = ShardedSet::new(4);
        for k in 0..10_000u64 {
            set.insert(k.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        }
        let locked = set.sum();
        assert_eq!(set.sum_no_lock(), locked);
    }

    #[test]
    fn test_sum_wraps() {
        let set = ShardedSet::new(1);
        set.insert(u64::MAX);
        set.insert(2);
        assert_eq!(set.sum(), 1);
    }

    #[test]
    fn test_entries_land_in_routed_shard() {
        let set = ShardedSet::with_exact_shards(3, 1);
        let router = *set.table.router();
        let keys: Vec<u64> = (0..300u64).map(|i| i << 33).collect();
        let mut expected = vec![0usize; 3];
        for k in &keys {
            set.insert(*k);
            expected[router.route(k)] += 1;
        }
        assert_eq!(set.shard_lens(), expected);
    }

    #[test]
    fn test_try_with_config_rejects_overflow() {
        let config = Config::new(usize::MAX).with_blow_up_factor(2);
        assert!(matches!(
            ShardedSet::<u64>::try_with_config(config),
            Err(Error::ShardCountOverflow { .. })
        ));
        assert!(matches!(
            ShardedSet::<u64>::try_with_config(Config::new(0)),
            Err(Error::ZeroWorkers)
        ));

        let set = ShardedSet::<u64>::try_with_config(Config::new(2)).unwrap();
        assert_eq!(set.shard_count(), 32);
    }

    #[test]
    #[should_panic(expected = "overflows")]
    fn test_with_config_panics_on_overflow() {
        ShardedSet::<u64>::with_config(Config::new(usize::MAX).with_blow_up_factor(2));
    }

    #[test]
    fn test_clear() {
        let set = ShardedSet::new(2);
        for k in 0..100u16 {
            set.insert(k);
        }
        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn test_concurrent_disjoint_inserts() {
        let set = Arc::new(ShardedSet::new(8));
        let mut handles = vec![];

        for t in 0..8u64 {
            let s = Arc::clone(&set);
            handles.push(thread::spawn(move || {
                for i in 0..1_000u64 {
                    s.insert((t << 40) | (i << 20) | i);
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(set.len(), 8_000);
        let expected = (0..8u64)
            .flat_map(|t| (0..1_000u64).map(move |i| (t << 40) | (i << 20) | i))
            .fold(0u64, u64::wrapping_add);
        assert_eq!(set.sum(), expected);
    }
}
