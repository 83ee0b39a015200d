//! Start/stop wall-clock accumulator.

use std::time::{Duration, Instant};
use tracing::info;

/// Accumulates time across any number of `start`/`stop` pairs.
#[derive(Debug)]
pub struct Timer {
    name: &'static str,
    started: Option<Instant>,
    elapsed: Duration,
}

impl Timer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            started: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Adds the time since the matching `start`. A `stop` without a `start`
    /// is ignored.
    pub fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            self.elapsed += started.elapsed();
        }
    }

    /// Times `f`, adding its duration to the total.
    pub fn time<R>(&mut self, f: impl FnOnce() -> R) -> R {
        self.start();
        let out = f();
        self.stop();
        out
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_micros(&self) -> u64 {
        self.elapsed.as_micros().min(u64::MAX as u128) as u64
    }

    /// Elements per microsecond for `n` elements over the accumulated time.
    pub fn throughput(&self, n: usize) -> f64 {
        let micros = self.elapsed.as_secs_f64() * 1e6;
        if micros == 0.0 {
            f64::INFINITY
        } else {
            n as f64 / micros
        }
    }

    pub fn report(&self) {
        info!(timer = self.name, micros = self.elapsed_micros(), "timer");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_accumulates_across_intervals() {
        let mut t = Timer::new("t");
        t.time(|| thread::sleep(Duration::from_millis(2)));
        let first = t.elapsed();
        t.time(|| thread::sleep(Duration::from_millis(2)));
        assert!(t.elapsed() > first);
        assert!(t.elapsed_micros() >= 4_000);
    }

    #[test]
    fn test_stop_without_start() {
        let mut t = Timer::new("idle");
        t.stop();
        assert_eq!(t.elapsed(), Duration::ZERO);
        assert!(t.throughput(10).is_infinite());
    }
}
