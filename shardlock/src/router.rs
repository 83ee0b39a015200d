//! Key-to-shard routing.
//!
//! The router folds the low half of a key away before hashing, so runs of
//! keys that only differ in their low bits (sequential ids, counters packed
//! into the low word) still spread across shards by their high bits, and
//! the shard index stays decorrelated from any structure generators leave
//! in the low bits.

use core::hash::{BuildHasher, Hash};
use foldhash::fast::FixedState;

use crate::config::Config;

/// Fixed-width unsigned integers that can be routed and summed.
pub trait RoutingKey: Copy + Eq + Hash + Send + Sync + 'static {
    /// Additive identity.
    const ZERO: Self;

    /// Drops the low half of the bits: `self >> (BITS / 2)`.
    fn fold(self) -> Self;

    /// Modular addition, matching fixed-width overflow.
    fn wrapping_add(self, rhs: Self) -> Self;
}

macro_rules! impl_routing_key {
    ($($t:ty),* $(,)?) => {
        $(
            impl RoutingKey for $t {
                const ZERO: Self = 0;

                #[inline(always)]
                fn fold(self) -> Self {
                    self >> (<$t>::BITS / 2)
                }

                #[inline(always)]
                fn wrapping_add(self, rhs: Self) -> Self {
                    <$t>::wrapping_add(self, rhs)
                }
            }
        )*
    };
}

impl_routing_key!(u8, u16, u32, u64, u128, usize);

/// How a 64-bit bucket hash is reduced into `[0, shard_count)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// `hash & mask`, valid only for power-of-two shard counts
    Mask(usize),
    /// `hash % shard_count`
    Modulo(usize),
}

/// Stateless mapping from a key to the index of its owning shard.
#[derive(Debug, Clone, Copy)]
pub struct Router {
    shard_count: usize,
    reduction: Reduction,
    hasher: FixedState,
}

impl Router {
    /// Creates a router over `shard_count` shards.
    ///
    /// Power-of-two counts reduce with a mask, everything else with `%`.
    /// A zero count is treated as one shard.
    pub fn new(shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        let reduction = if shard_count.is_power_of_two() {
            Reduction::Mask(shard_count - 1)
        } else {
            Reduction::Modulo(shard_count)
        };
        Self {
            shard_count,
            reduction,
            hasher: FixedState::default(),
        }
    }

    /// Router for the shard count `config` describes.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.shard_count())
    }

    /// Number of shards routed over.
    #[inline]
    pub fn shard_count(&self) -> usize {
        self.shard_count
    }

    /// How hashes are reduced to shard indices.
    #[inline]
    pub fn reduction(&self) -> Reduction {
        self.reduction
    }

    /// Hash of the folded key, before reduction to a shard index.
    #[inline(always)]
    pub fn bucket_hash<K: RoutingKey>(&self, key: &K) -> u64 {
        self.hasher.hash_one(key.fold())
    }

    /// Index of the shard owning `key`, always in `[0, shard_count)`.
    #[inline(always)]
    pub fn route<K: RoutingKey>(&self, key: &K) -> usize {
        let hash = self.bucket_hash(key) as usize;
        match self.reduction {
            Reduction::Mask(mask) => hash & mask,
            Reduction::Modulo(n) => hash % n,
        }
    }
}
