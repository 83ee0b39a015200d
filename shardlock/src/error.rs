use std::fmt;

/// Errors raised while configuring a container or its worker pool.
///
/// Container operations themselves are infallible; these only surface from
/// [`Config::validate`](crate::Config::validate), the `try_with_config`
/// constructors and [`build_pool`](crate::pool::build_pool).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The worker count was zero
    ZeroWorkers,
    /// The blow-up factor was zero
    ZeroBlowUp,
    /// `workers * blow_up_factor` (or its power-of-two rounding) does not fit in `usize`
    ShardCountOverflow {
        /// Requested worker count
        workers: usize,
        /// Requested blow-up factor
        blow_up_factor: usize,
    },
    /// The rayon thread pool could not be built
    ThreadPool(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ZeroWorkers => write!(f, "worker count must be at least 1"),
            Error::ZeroBlowUp => write!(f, "blow-up factor must be at least 1"),
            Error::ShardCountOverflow {
                workers,
                blow_up_factor,
            } => {
                write!(
                    f,
                    "shard count overflows for {} workers with blow-up factor {}",
                    workers, blow_up_factor
                )
            }
            Error::ThreadPool(msg) => write!(f, "Thread pool error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Convenience alias used across the crate.
pub type Result<T> = core::result::Result<T, Error>;
