//! Pseudo-random key sets.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

/// `n` keys drawn uniformly from the full `u64` range. The same `seed`
/// always yields the same keys.
pub fn random_keys(n: usize, seed: u64) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.random::<u64>()).collect()
}

/// Wrapping sum of the distinct values in `keys`, i.e. what a set holding
/// exactly these keys must report.
pub fn expected_sum(keys: &[u64]) -> u64 {
    keys.iter()
        .copied()
        .collect::<HashSet<u64>>()
        .into_iter()
        .fold(0u64, u64::wrapping_add)
}

/// Powers of ten from `start` up to and including `max`.
pub fn decades(start: u64, max: u64) -> impl Iterator<Item = u64> {
    core::iter::successors((start > 0).then_some(start), |n| n.checked_mul(10))
        .take_while(move |n| *n <= max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_generation_is_stable() {
        assert_eq!(random_keys(100, 42), random_keys(100, 42));
        assert_ne!(random_keys(100, 42), random_keys(100, 43));
        assert!(random_keys(0, 1).is_empty());
    }

    #[test]
    fn test_expected_sum_ignores_duplicates() {
        assert_eq!(expected_sum(&[1, 2, 2, 3, 3, 3]), 6);
        assert_eq!(expected_sum(&[u64::MAX, 2]), 1);
        assert_eq!(expected_sum(&[]), 0);
    }

    #[test]
    fn test_decades() {
        assert_eq!(decades(1000, 100_000).collect::<Vec<_>>(), vec![1000, 10_000, 100_000]);
        assert_eq!(decades(1000, 999).count(), 0);
        assert_eq!(decades(0, 100).count(), 0);
        assert_eq!(decades(10, u64::MAX).last(), Some(10_000_000_000_000_000_000));
    }
}
