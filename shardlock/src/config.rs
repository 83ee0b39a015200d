//! Shard-count configuration.
//!
//! A container's shard count is derived once, at construction, from the
//! number of workers that will hammer it and a blow-up factor that
//! over-provisions shards so two concurrently active workers rarely land on
//! the same lock. It never changes afterwards.

use crate::error::{Error, Result};
use crate::pool;

/// Default multiplier applied to the worker count.
pub const DEFAULT_BLOW_UP_FACTOR: usize = 10;

/// How `workers * blow_up_factor` is turned into a shard count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShardPolicy {
    /// Round up to the next power of two; routing reduces with a bit mask.
    #[default]
    PowerOfTwo,
    /// Use the product as-is; routing reduces with `%`.
    Exact,
}

impl ShardPolicy {
    /// Short lowercase name, used in logs and CSV output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShardPolicy::PowerOfTwo => "pow2",
            ShardPolicy::Exact => "exact",
        }
    }
}

impl core::str::FromStr for ShardPolicy {
    type Err = String;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s {
            "pow2" | "power-of-two" => Ok(ShardPolicy::PowerOfTwo),
            "exact" => Ok(ShardPolicy::Exact),
            other => Err(format!("unknown shard policy '{}'", other)),
        }
    }
}

/// Construction parameters shared by [`ShardedSet`](crate::ShardedSet) and
/// [`ShardedMap`](crate::ShardedMap).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Number of workers expected to operate on the container concurrently
    pub workers: usize,
    /// Shards provisioned per worker
    pub blow_up_factor: usize,
    /// Rounding applied to `workers * blow_up_factor`
    pub policy: ShardPolicy,
}

impl Default for Config {
    /// Sized for the current rayon pool with the default blow-up factor.
    fn default() -> Self {
        Self::new(pool::worker_count())
    }
}

impl Config {
    /// Configuration for `workers` with the default blow-up factor and
    /// power-of-two rounding.
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            blow_up_factor: DEFAULT_BLOW_UP_FACTOR,
            policy: ShardPolicy::PowerOfTwo,
        }
    }

    /// Sets the blow-up factor.
    pub fn with_blow_up_factor(mut self, blow_up_factor: usize) -> Self {
        self.blow_up_factor = blow_up_factor;
        self
    }

    /// Sets the rounding policy.
    pub fn with_policy(mut self, policy: ShardPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Checks that the configuration describes at least one shard and that
    /// the shard count is representable.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::ZeroWorkers);
        }
        if self.blow_up_factor == 0 {
            return Err(Error::ZeroBlowUp);
        }
        self.try_shard_count().map(|_| ())
    }

    /// Number of shards this configuration produces, or
    /// [`Error::ShardCountOverflow`] if it does not fit in a `usize`.
    ///
    /// A zero product is clamped to one shard.
    pub fn try_shard_count(&self) -> Result<usize> {
        let overflow = || Error::ShardCountOverflow {
            workers: self.workers,
            blow_up_factor: self.blow_up_factor,
        };
        let product = self
            .workers
            .checked_mul(self.blow_up_factor)
            .ok_or_else(overflow)?
            .max(1);
        match self.policy {
            ShardPolicy::PowerOfTwo => product.checked_next_power_of_two().ok_or_else(overflow),
            ShardPolicy::Exact => Ok(product),
        }
    }

    /// Number of shards this configuration produces.
    ///
    /// A zero product is clamped to one shard.
    ///
    /// # Panics
    ///
    /// Panics if the shard count overflows `usize`. Use
    /// [`try_shard_count`](Self::try_shard_count) or
    /// [`validate`](Self::validate) to check untrusted input first.
    pub fn shard_count(&self) -> usize {
        match self.try_shard_count() {
            Ok(n) => n,
            Err(e) => panic!("{}", e),
        }
    }
}
