//! Pool statistics for monitoring and health checks.
//!
//! This module provides [`PoolStats`], a snapshot of the worker pool's
//! counters. Use it for monitoring, logging, and readiness probes.
//!
//! # Example
//!
//! ```rust,ignore
//! let pool = WorkerPool::new(4)?;
//!
//! let stats = pool.stats();
//! println!("Queued: {}, In flight: {}", stats.queued, stats.in_flight);
//! ```

/// Snapshot of pool statistics at a point in time.
///
/// # Fields
///
/// | Field | Description |
/// |-------|-------------|
/// | `workers` | Worker threads the pool was built with |
/// | `queued` | Tasks submitted but not yet picked up |
/// | `in_flight` | Tasks a worker is rendering right now |
/// | `completed` | Tasks that produced a PDF |
/// | `failed` | Tasks that ended with an error |
/// | `accepting` | Whether `submit` still accepts work |
///
/// # Example
///
/// ```rust
/// use html2pdf_pool::PoolStats;
///
/// let stats = PoolStats {
///     workers: 4,
///     queued: 2,
///     in_flight: 4,
///     completed: 10,
///     failed: 1,
///     accepting: true,
/// };
///
/// assert_eq!(stats.pending(), 6);
/// assert!(stats.is_saturated());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of worker threads.
    pub workers: usize,

    /// Tasks accepted but not yet picked up by a worker.
    ///
    /// Includes submitters still waiting for queue space, so this can exceed
    /// the queue capacity under heavy load.
    pub queued: usize,

    /// Tasks currently being rendered.
    ///
    /// Never exceeds `workers`.
    pub in_flight: usize,

    /// Tasks that finished with PDF bytes.
    pub completed: u64,

    /// Tasks that finished with an error.
    pub failed: u64,

    /// Whether the pool is still accepting submissions.
    pub accepting: bool,
}

impl PoolStats {
    /// Tasks accepted but not yet answered (`queued + in_flight`).
    #[inline]
    pub fn pending(&self) -> usize {
        self.queued + self.in_flight
    }

    /// Whether every worker is busy.
    ///
    /// A saturated pool makes the next submitter wait for queue space once
    /// the queue fills up too.
    #[inline]
    pub fn is_saturated(&self) -> bool {
        self.in_flight >= self.workers
    }

    /// Whether nothing is queued or running.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }
}
