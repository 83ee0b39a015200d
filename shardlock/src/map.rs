use foldhash::fast::FixedState;
use std::collections::HashMap;

use crate::batch;
use crate::config::{Config, ShardPolicy};
use crate::error::Result;
use crate::reduce::SumReducer;
use crate::router::RoutingKey;
use crate::table::ShardTable;

/// Lock-striped concurrent map from fixed-width unsigned keys to `V`.
///
/// Same layout as [`ShardedSet`](crate::ShardedSet): a fixed array of
/// cache-line isolated shards, one mutex each. `insert` never overwrites;
/// the first value stored for a key wins until that key is removed.
///
/// # Examples
///
/// ```
/// use shardlock::ShardedMap;
///
/// let map = ShardedMap::new(2);
/// assert_eq!(map.shard_count(), 32);
///
/// map.insert(7u64, "seven");
/// assert!(map.contains(&7));
/// assert_eq!(map.value(&7, "missing"), "seven");
/// assert_eq!(map.value(&8, "missing"), "missing");
/// ```
pub struct ShardedMap<K, V> {
    table: ShardTable<HashMap<K, V, FixedState>>,
}

impl<K, V> ShardedMap<K, V>
where
    K: RoutingKey,
    V: Send + Sync,
{
    /// Creates a map sized for `workers` with the default blow-up factor,
    /// rounded up to a power-of-two shard count.
    pub fn new(workers: usize) -> Self {
        Self::with_config(Config::new(workers))
    }

    /// Creates a map with `workers * blow_up_factor` shards, rounded up to a
    /// power of two.
    pub fn with_blow_up(workers: usize, blow_up_factor: usize) -> Self {
        Self::with_config(Config::new(workers).with_blow_up_factor(blow_up_factor))
    }

    /// Creates a map with exactly `workers * blow_up_factor` shards.
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

    /// Stores `value` under `key` unless the key is already present.
    /// Returns `true` if the entry was added.
    #[inline]
    pub fn insert(&self, key: K, value: V) -> bool {
        self.table.shard_for(&key).insert(key, value)
    }

    /// Removes `key`, returning its value if it was present.
    #[inline]
    pub fn remove(&self, key: &K) -> Option<V> {
        self.table.shard_for(key).remove(key)
    }

    /// Whether `key` is present.
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.table.shard_for(key).contains(key)
    }

    /// Copy of the value stored under `key`, or `fallback` if absent.
    #[inline]
    pub fn value(&self, key: &K, fallback: V) -> V
    where
        V: Clone,
    {
        self.table.shard_for(key).value(key, fallback)
    }

    /// Inserts every pair in parallel after sorting the buffer in place by
    /// the shard owning each key.
    pub fn insert_batch(&self, entries: &mut [(K, V)])
    where
        V: Clone,
    {
        if entries.is_empty() {
            return;
        }
        batch::sort_by_shard_with(self.table.router(), entries, |(k, _)| *k);
        batch::dispatch(entries, |(k, v)| {
            self.insert(*k, v.clone());
        });
    }

    /// Parallel reduction over all entries.
    ///
    /// `fold` turns one entry into a contribution to the running partial;
    /// `combine` must be associative and commutative since partials are
    /// merged in no particular order. Each shard is locked once.
    pub fn fold<T, G, F>(&self, identity: T, fold: G, combine: F) -> T
    where
        T: Clone + Send + Sync,
        G: Fn(T, &K, &V) -> T + Sync,
        F: Fn(T, T) -> T + Sync,
    {
        let start = identity.clone();
        self.table.reduce_locked(
            identity,
            |shard| shard.iter().fold(start.clone(), |acc, (k, v)| fold(acc, k, v)),
            combine,
        )
    }

    /// Number of entries, counted shard by shard.
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
}

impl<K, V> ShardedMap<K, V>
where
    K: RoutingKey,
    V: RoutingKey,
{
    /// Wrapping sum of every stored value, locking each shard once.
    pub fn sum_values(&self) -> V {
        self.table.reduce_locked_with(SumReducer::<V>::sum(), sum_shard_values)
    }

    /// Wrapping sum of every stored value without locking; `&mut self`
    /// guarantees no concurrent writer.
    pub fn sum_values_no_lock(&mut self) -> V {
        self.table.reduce_exclusive_with(SumReducer::<V>::sum(), sum_shard_values)
    }
}

fn sum_shard_values<K, V: RoutingKey>(map: &HashMap<K, V, FixedState>) -> V {
    map.values().fold(V::ZERO, |acc, v| acc.wrapping_add(*v))
}

impl<K, V> Default for ShardedMap<K, V>
where
    K: RoutingKey,
    V: Send + Sync,
{
    /// Sized for the current rayon pool.
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

impl<K: RoutingKey, V: Send + Sync> core::fmt::Debug for ShardedMap<K, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ShardedMap")
            .field("shards", &self.shard_count())
            .field("policy", &self.config().policy)
            .finish()
    }
}
