//! Throughput driver for `shardlock`.
//!
//! Generates seeded random key sets, inserts them into a
//! [`ShardedSet`](shardlock::ShardedSet) in batches of increasing size, and
//! measures insert and reduction throughput. Every run is checked against the
//! sum of the distinct keys.

pub mod run;
pub mod timer;
pub mod workload;

pub use crate::run::{Case, Report, run_case};
pub use crate::timer::Timer;
