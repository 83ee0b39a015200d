//! One benchmark case: fill a set in batches, then reduce it.

use rayon::prelude::*;
use shardlock::{Config, ShardPolicy, ShardedSet, pool};
use tracing::{debug, error};

use crate::timer::Timer;

/// Parameters of a single measured run.
#[derive(Debug, Clone, Copy)]
pub struct Case {
    pub batch_size: usize,
    pub blow_up_factor: usize,
    pub policy: ShardPolicy,
    /// Sort each batch by shard before inserting.
    pub batched: bool,
    /// Reduce through the lock-free path instead of locking every shard.
    pub no_lock_sum: bool,
}

/// Outcome of a [`Case`], one CSV row.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub num_elements: usize,
    pub batch_size: usize,
    pub blow_up_factor: usize,
    pub shards: usize,
    pub insert_throughput: f64,
    pub sum_throughput: f64,
    pub threads: usize,
    pub batched: bool,
    pub sum: u64,
    pub correct: bool,
}

impl Report {
    pub fn csv_header() -> &'static str {
        "num_elements,batch_size,blow_up_factor,shards,insert_throughput,sum_throughput,threads,batched,sum"
    }

    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{}",
            self.num_elements,
            self.batch_size,
            self.blow_up_factor,
            self.shards,
            self.insert_throughput,
            self.sum_throughput,
            self.threads,
            self.batched as u8,
            self.sum
        )
    }
}

/// Runs `case` over `keys` on the current rayon pool.
///
/// `keys` is copied, so the caller's data survives the in-place batch sort.
/// A batch size of zero or one larger than the input is clamped to the
/// input length.
pub fn run_case(keys: &[u64], expected: u64, case: Case) -> Report {
    let threads = pool::worker_count();
    let batch_size = match case.batch_size {
        0 => keys.len(),
        n => n.min(keys.len()),
    };
    let mut data = keys.to_vec();

    let mut set = ShardedSet::with_config(
        Config::new(threads)
            .with_blow_up_factor(case.blow_up_factor)
            .with_policy(case.policy),
    );

    let mut insert_timer = Timer::new("insert");
    insert_timer.time(|| {
        if batch_size == 0 {
            return;
        }
        for chunk in data.chunks_mut(batch_size) {
            if case.batched {
                set.insert_batch(chunk);
            } else {
                chunk.par_iter().for_each(|k| {
                    set.insert(*k);
                });
            }
        }
    });

    let mut sum_timer = Timer::new(if case.no_lock_sum {
        "sum_no_lock"
    } else {
        "sum_with_locks"
    });
    let sum = if case.no_lock_sum {
        sum_timer.time(|| set.sum_no_lock())
    } else {
        sum_timer.time(|| set.sum())
    };
    insert_timer.report();
    sum_timer.report();

    let correct = sum == expected;
    if !correct {
        error!(sum, expected, "got wrong sum");
    }
    debug!(
        num_elements = keys.len(),
        batch_size,
        shards = set.shard_count(),
        "case finished"
    );

    Report {
        num_elements: keys.len(),
        batch_size,
        blow_up_factor: case.blow_up_factor,
        shards: set.shard_count(),
        insert_throughput: insert_timer.throughput(keys.len()),
        sum_throughput: sum_timer.throughput(keys.len()),
        threads,
        batched: case.batched,
        sum,
        correct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload::{expected_sum, random_keys};

    fn case(batch_size: usize, batched: bool) -> Case {
        Case {
            batch_size,
            blow_up_factor: 10,
            policy: ShardPolicy::PowerOfTwo,
            batched,
            no_lock_sum: false,
        }
    }

    #[test]
    fn test_batched_case_is_correct() {
        let keys = random_keys(5_000, 9);
        let report = run_case(&keys, expected_sum(&keys), case(100, true));
        assert!(report.correct);
        assert_eq!(report.num_elements, 5_000);
        assert_eq!(report.batch_size, 100);
    }

    #[test]
    fn test_unbatched_and_no_lock() {
        let keys = random_keys(3_000, 10);
        let mut c = case(1_000, false);
        c.no_lock_sum = true;
        let report = run_case(&keys, expected_sum(&keys), c);
        assert!(report.correct);
        assert!(!report.batched);
    }

    #[test]
    fn test_batch_size_is_clamped() {
        let keys = random_keys(50, 11);
        let report = run_case(&keys, expected_sum(&keys), case(1_000, true));
        assert_eq!(report.batch_size, 50);
        assert!(report.correct);

        let report = run_case(&keys, expected_sum(&keys), case(0, true));
        assert_eq!(report.batch_size, 50);
    }

    #[test]
    fn test_wrong_expectation_is_flagged() {
        let keys = vec![1u64, 2, 3];
        let report = run_case(&keys, 7, case(2, true));
        assert_eq!(report.sum, 6);
        assert!(!report.correct);
    }

    #[test]
    fn test_empty_input() {
        let report = run_case(&[], 0, case(10, true));
        assert_eq!(report.sum, 0);
        assert_eq!(report.batch_size, 0);
        assert!(report.correct);
    }

    #[test]
    fn test_csv_row_matches_header() {
        let keys = random_keys(100, 12);
        let report = run_case(&keys, expected_sum(&keys), case(10, true));
        let header_cols = Report::csv_header().split(',').count();
        let row = report.to_csv_row();
        assert_eq!(row.split(',').count(), header_cols);
        assert!(row.starts_with("100,10,10,"));
        assert!(row.ends_with(&format!(",1,{}", report.sum)));
    }
}
