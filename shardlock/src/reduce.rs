//! Fan-out/fan-in reduction.
//!
//! Each worker folds its contributions into its own cache-aligned slot, so
//! concurrent `add`s from different workers never touch the same line. The
//! slots are combined once, when the reducer is consumed.

use parking_lot::Mutex;

use crate::pool;
use crate::router::RoutingKey;
use crate::utils::CacheAligned;

/// Per-worker accumulator combined with an associative, commutative `op`.
pub struct Reducer<T, F> {
    slots: Box<[CacheAligned<Mutex<T>>]>,
    identity: T,
    op: F,
}

impl<T, F> Reducer<T, F>
where
    T: Clone + Send,
    F: Fn(T, T) -> T + Sync,
{
    /// Creates a reducer with one slot per worker, plus one shared slot for
    /// callers that are not pool threads.
    pub fn new(workers: usize, identity: T, op: F) -> Self {
        let slots = (0..=workers)
            .map(|_| CacheAligned::new(Mutex::new(identity.clone())))
            .collect();
        Self {
            slots,
            identity,
            op,
        }
    }

    #[inline]
    fn slot(&self) -> &Mutex<T> {
        let last = self.slots.len() - 1;
        let idx = pool::worker_index().map_or(last, |i| i.min(last));
        &self.slots[idx]
    }

    /// Folds `value` into the calling worker's slot.
    pub fn add(&self, value: T) {
        let mut slot = self.slot().lock();
        let acc = core::mem::replace(&mut *slot, self.identity.clone());
        *slot = (self.op)(acc, value);
    }

    /// Combines every slot into the final result.
    pub fn get(self) -> T {
        let Self {
            slots,
            identity,
            op,
        } = self;
        slots
            .into_vec()
            .into_iter()
            .map(|slot| slot.into_inner().into_inner())
            .fold(identity, |acc, v| op(acc, v))
    }
}

/// Wrapping-sum reducer over fixed-width keys.
pub type SumReducer<K> = Reducer<K, fn(K, K) -> K>;

impl<K: RoutingKey> SumReducer<K> {
    /// Reducer sized for the current pool.
    pub fn sum() -> Self {
        let op: fn(K, K) -> K = <K as RoutingKey>::wrapping_add;
        Reducer::new(pool::worker_count(), K::ZERO, op)
    }
}
