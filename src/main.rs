//! Sweeps input sizes and batch sizes, printing one CSV row per run.
//!
//! ```bash
//! RUST_LOG=debug shardlock-bench 1000000 100 10 --threads 8
//! ```

use anyhow::{Context, Result, bail};
use clap::Parser;
use shardlock::{Config, ShardPolicy, pool};
use shardlock_bench::workload::{decades, expected_sum, random_keys};
use shardlock_bench::{Case, Report, run_case};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "shardlock-bench")]
#[command(about = "Insert and reduction throughput of the lock-striped set")]
struct Args {
    /// Largest input size; sizes run 1000, 10000, ... up to this
    max_num_elements: u64,

    /// Smallest batch size; batches run min, min*10, ... below the input size
    min_batch_size: u64,

    /// Shards provisioned per worker
    blow_up_factor: usize,

    /// Worker threads (defaults to rayon's choice)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Seed for the key generator
    #[arg(short, long, default_value = "0")]
    seed: u64,

    /// Shard count rounding: pow2 or exact
    #[arg(short, long, default_value = "pow2")]
    policy: ShardPolicy,

    /// Insert each batch with unsorted per-key parallel inserts
    #[arg(long)]
    unbatched: bool,

    /// Reduce with the lock-free exclusive path
    #[arg(long)]
    no_lock_sum: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    if args.min_batch_size == 0 {
        bail!("min_batch_size must be at least 1");
    }

    let pool = match args.threads {
        Some(n) => pool::build_pool(n),
        None => pool::build_pool(rayon::current_num_threads()),
    }
    .context("building worker pool")?;
    let threads = pool.current_num_threads();

    Config::new(threads)
        .with_blow_up_factor(args.blow_up_factor)
        .with_policy(args.policy)
        .validate()
        .context("invalid shard configuration")?;

    info!(
        threads,
        blow_up_factor = args.blow_up_factor,
        policy = args.policy.as_str(),
        "starting sweep"
    );

    println!("{}", Report::csv_header());
    let mut failures = 0usize;

    for size in decades(1000, args.max_num_elements) {
        let keys = random_keys(size as usize, args.seed.wrapping_add(size));
        let expected = expected_sum(&keys);

        let mut batch = args.min_batch_size;
        while batch < size {
            let case = Case {
                batch_size: batch as usize,
                blow_up_factor: args.blow_up_factor,
                policy: args.policy,
                batched: !args.unbatched,
                no_lock_sum: args.no_lock_sum,
            };
            let report = pool.install(|| run_case(&keys, expected, case));
            println!("{}", report.to_csv_row());
            if !report.correct {
                failures += 1;
            }
            batch = match batch.checked_mul(10) {
                Some(next) => next,
                None => break,
            };
        }
    }

    if failures > 0 {
        bail!("{} run(s) reported a wrong sum", failures);
    }
    Ok(())
}
