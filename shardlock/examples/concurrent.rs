//! Example demonstrating concurrent operations on the lock-striped set
//!
//! Several threads insert, probe and remove at once, then the whole set is
//! reduced in parallel. Operations only contend when their keys share a shard.

use shardlock::{ShardedMap, ShardedSet};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

fn main() {
    println!("=== Lock-Striped Concurrent Set Demo ===\n");

    let set = Arc::new(ShardedSet::<u64>::with_blow_up(8, 10));
    println!("Set has {} shards\n", set.shard_count());

    println!("Concurrent per-key inserts...");
    let start = Instant::now();
    let handles: Vec<_> = (0..8u64)
        .map(|thread_id| {
            let set = Arc::clone(&set);
            thread::spawn(move || {
                for i in 0..10_000u64 {
                    set.insert((thread_id << 40) | (i << 16));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    let duration = start.elapsed();
    println!(
        "Inserted 80,000 keys from 8 threads in {:?} ({:.2} ops/sec)",
        duration,
        80_000.0 / duration.as_secs_f64()
    );

    println!("\nLocality-sorted batch insert...");
    let mut batch: Vec<u64> = (0..80_000u64).map(|i| (9 << 40) | (i << 16)).collect();
    let start = Instant::now();
    set.insert_batch(&mut batch);
    let duration = start.elapsed();
    println!(
        "Inserted 80,000 keys as one batch in {:?} ({:.2} ops/sec)",
        duration,
        80_000.0 / duration.as_secs_f64()
    );

    println!("\nMixed readers and removers...");
    let start = Instant::now();
    let mut handles = Vec::new();
    for _ in 0..4 {
        let set = Arc::clone(&set);
        handles.push(thread::spawn(move || {
            (0..10_000u64)
                .filter(|i| set.contains(&(i << 16)))
                .count()
        }));
    }
    for thread_id in 0..4u64 {
        let set = Arc::clone(&set);
        handles.push(thread::spawn(move || {
            (0..5_000u64)
                .filter(|i| set.remove(&((thread_id << 40) | (i << 16))))
                .count()
        }));
    }
    let touched: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    println!("Mixed operations touched {} keys in {:?}", touched, start.elapsed());

    let start = Instant::now();
    let sum = set.sum();
    println!(
        "\nSet holds {} keys, sum {} (reduced in {:?})",
        set.len(),
        sum,
        start.elapsed()
    );

    let map = ShardedMap::<u64, u64>::new(4);
    for i in 0..1_000u64 {
        map.insert(i << 32, i);
    }
    println!("Map value sum: {}", map.sum_values());

    println!("\n=== Demo Complete ===");
}
