//! A single lock stripe: one mutex, one unordered collection, one cache line
//! (at least) to itself.

use std::collections::{HashMap, HashSet};

use foldhash::fast::FixedState;
use parking_lot::{Mutex, MutexGuard};

use crate::utils::CacheAligned;

pub(crate) type SetShard<K> = Shard<HashSet<K, FixedState>>;
pub(crate) type MapShard<K, V> = Shard<HashMap<K, V, FixedState>>;

/// Collections a shard can hold.
pub(crate) trait Collection: Default + Send {
    fn len(&self) -> usize;
    fn clear(&mut self);
}

impl<K: Send> Collection for HashSet<K, FixedState> {
    #[inline]
    fn len(&self) -> usize {
        HashSet::len(self)
    }

    #[inline]
    fn clear(&mut self) {
        HashSet::clear(self)
    }
}

impl<K: Send, V: Send> Collection for HashMap<K, V, FixedState> {
    #[inline]
    fn len(&self) -> usize {
        HashMap::len(self)
    }

    #[inline]
    fn clear(&mut self) {
        HashMap::clear(self)
    }
}

/// Monitor over one collection. Every access goes through a scoped guard,
/// so the lock is released on all exit paths, unwinding included.
pub(crate) struct Shard<C> {
    inner: CacheAligned<Mutex<C>>,
}

impl<C: Collection> Shard<C> {
    pub(crate) fn new() -> Self {
        Self {
            inner: CacheAligned::new(Mutex::new(C::default())),
        }
    }

    #[inline]
    pub(crate) fn lock(&self) -> MutexGuard<'_, C> {
        self.inner.lock()
    }

    /// Runs `f` with the lock held.
    #[inline]
    pub(crate) fn with_locked<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        f(&mut self.lock())
    }

    /// Lock-free access, proven exclusive by `&mut self`.
    #[inline]
    pub(crate) fn get_mut(&mut self) -> &mut C {
        self.inner.get_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    pub(crate) fn clear(&self) {
        self.lock().clear()
    }
}

impl<K> SetShard<K>
where
    K: Eq + core::hash::Hash + Send,
{
    /// Returns `true` if `key` was not present. A duplicate insert is a no-op.
    #[inline]
    pub(crate) fn insert(&self, key: K) -> bool {
        self.lock().insert(key)
    }

    #[inline]
    pub(crate) fn remove(&self, key: &K) -> bool {
        self.lock().remove(key)
    }

    #[inline]
    pub(crate) fn contains(&self, key: &K) -> bool {
        self.lock().contains(key)
    }
}

impl<K, V> MapShard<K, V>
where
    K: Eq + core::hash::Hash + Send,
    V: Send,
{
    /// Insert-if-absent. An existing entry keeps its value and `false` is
    /// returned.
    #[inline]
    pub(crate) fn insert(&self, key: K, value: V) -> bool {
        use std::collections::hash_map::Entry;

        match self.lock().entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    #[inline]
    pub(crate) fn remove(&self, key: &K) -> Option<V> {
        self.lock().remove(key)
    }

    #[inline]
    pub(crate) fn contains(&self, key: &K) -> bool {
        self.lock().contains_key(key)
    }

    #[inline]
    pub(crate) fn value(&self, key: &K, fallback: V) -> V
    where
        V: Clone,
    {
        self.lock().get(key).cloned().unwrap_or(fallback)
    }
}
