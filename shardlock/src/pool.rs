//! Thin layer over rayon providing the fork-join primitives the containers
//! are written against.
//!
//! Everything here runs on whichever rayon pool is current: the global pool
//! by default, or a dedicated one when called inside
//! [`ThreadPool::install`](rayon::ThreadPool::install).

use core::ops::Range;
use rayon::prelude::*;

use crate::error::{Error, Result};

/// Number of workers the parallel loops below will spread across.
#[inline]
pub fn worker_count() -> usize {
    rayon::current_num_threads()
}

/// Index of the calling worker in the current pool, if it is a pool thread.
#[inline]
pub fn worker_index() -> Option<usize> {
    rayon::current_thread_index()
}

/// Runs `body` for every index in `range`, returning once all have finished.
pub fn parallel_for<F>(range: Range<usize>, body: F)
where
    F: Fn(usize) + Send + Sync,
{
    range.into_par_iter().for_each(body);
}

/// Runs `body` for every element of `items`.
///
/// Rayon splits the slice into contiguous halves recursively, so each worker
/// ends up with a contiguous sub-range of the input.
pub fn parallel_for_each<T, F>(items: &[T], body: F)
where
    T: Sync,
    F: Fn(&T) + Send + Sync,
{
    items.par_iter().for_each(body);
}

/// Runs `body` for every element of `items` with exclusive access to it.
pub fn parallel_for_each_mut<T, F>(items: &mut [T], body: F)
where
    T: Send,
    F: Fn(&mut T) + Send + Sync,
{
    items.par_iter_mut().for_each(body);
}

/// Builds a dedicated pool with `threads` workers.
pub fn build_pool(threads: usize) -> Result<rayon::ThreadPool> {
    if threads == 0 {
        return Err(Error::ZeroWorkers);
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("shardlock-worker-{}", i))
        .build()
        .map_err(|e| Error::ThreadPool(e.to_string()))
}
