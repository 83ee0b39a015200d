//! Shard array plus router, shared by the set and the map.

use tracing::debug;

use crate::config::Config;
use crate::pool;
use crate::reduce::Reducer;
use crate::router::{Router, RoutingKey};
use crate::shard::{Collection, Shard};

pub(crate) struct ShardTable<C> {
    shards: Box<[Shard<C>]>,
    router: Router,
    config: Config,
}

impl<C: Collection> ShardTable<C> {
    pub(crate) fn new(config: Config) -> Self {
        let router = Router::from_config(&config);
        let shards = (0..router.shard_count()).map(|_| Shard::new()).collect();
        debug!(
            workers = config.workers,
            blow_up_factor = config.blow_up_factor,
            policy = config.policy.as_str(),
            shards = router.shard_count(),
            "allocated shard table"
        );
        Self {
            shards,
            router,
            config,
        }
    }

    #[inline]
    pub(crate) fn router(&self) -> &Router {
        &self.router
    }

    #[inline]
    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub(crate) fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// The shard that owns `key`.
    #[inline(always)]
    pub(crate) fn shard_for<K: RoutingKey>(&self, key: &K) -> &Shard<C> {
        &self.shards[self.router.route(key)]
    }

    /// Folds every shard into a partial under that shard's lock, then
    /// combines the partials through a per-worker [`Reducer`].
    ///
    /// Each shard is locked exactly once and released before its partial is
    /// merged; no two locks are ever held together.
    pub(crate) fn reduce_locked<T, P, F>(&self, identity: T, partial: P, combine: F) -> T
    where
        T: Clone + Send + Sync,
        P: Fn(&C) -> T + Sync,
        F: Fn(T, T) -> T + Sync,
    {
        self.reduce_locked_with(Reducer::new(pool::worker_count(), identity, combine), partial)
    }

    /// [`reduce_locked`](Self::reduce_locked) into a caller-built reducer.
    pub(crate) fn reduce_locked_with<T, P, F>(&self, reducer: Reducer<T, F>, partial: P) -> T
    where
        T: Clone + Send + Sync,
        P: Fn(&C) -> T + Sync,
        F: Fn(T, T) -> T + Sync,
    {
        pool::parallel_for(0..self.shards.len(), |i| {
            let local = self.shards[i].with_locked(|c| partial(c));
            reducer.add(local);
        });
        reducer.get()
    }

    /// Same traversal as [`reduce_locked_with`](Self::reduce_locked_with)
    /// without touching any lock. `&mut self` rules out concurrent writers.
    pub(crate) fn reduce_exclusive_with<T, P, F>(
        &mut self,
        reducer: Reducer<T, F>,
        partial: P,
    ) -> T
    where
        T: Clone + Send + Sync,
        P: Fn(&C) -> T + Sync,
        F: Fn(T, T) -> T + Sync,
    {
        pool::parallel_for_each_mut(&mut self.shards, |shard| {
            reducer.add(partial(shard.get_mut()));
        });
        reducer.get()
    }

    /// Entry count, summed shard by shard. Not a snapshot under concurrent
    /// writers.
    pub(crate) fn len(&self) -> usize {
        self.reduce_locked(0usize, |c| c.len(), |a, b| a + b)
    }

    pub(crate) fn clear(&self) {
        pool::parallel_for(0..self.shards.len(), |i| self.shards[i].clear());
    }

    #[cfg(test)]
    pub(crate) fn shard_lens(&self) -> Vec<usize> {
        self.shards.iter().map(Shard::len).collect()
    }
}
