//! Fixed-size worker pool that renders HTML to PDF.
//!
//! This module provides [`WorkerPool`], the main entry point of the crate.
//!
//! # Overview
//!
//! ```text
//!  submit(html) ──→ bounded queue (capacity N) ──→ N worker threads
//!      ▲                                               │
//!      │                                               ▼
//!      └──────── oneshot reply ◄──── RendererHandle::render(html)
//! ```
//!
//! - A pool owns exactly one [`RendererHandle`], shared by all workers.
//! - The queue holds at most N tasks. Once it is full, submitters wait.
//! - At most N renders execute at once.
//! - Each submitter gets exactly the result of its own task.
//!
//! # Shutdown
//!
//! ```text
//! shutdown()
//!   1. stop accepting (later submits get PoolClosed)
//!   2. close the queue, workers drain what was already accepted
//!   3. join every worker
//!   4. close the renderer session
//!   5. wake await_termination() callers
//! ```
//!
//! A second `shutdown()` returns [`RenderPoolError::AlreadyClosed`]
//! immediately without waiting. Use [`WorkerPool::await_termination`] to
//! wait for the first one.
//!
//! # Example
//!
//! ```rust,ignore
//! use html2pdf_pool::WorkerPool;
//!
//! let pool = WorkerPool::new(4)?;
//!
//! let pdf = pool.submit("<h1>Invoice #42</h1>")?;
//! std::fs::write("invoice.pdf", pdf)?;
//!
//! pool.shutdown()?;
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};

use crate::SharedWorkerPool;
use crate::config::WorkerPoolConfig;
use crate::error::{RenderPoolError, Result};
use crate::factory::{ChromeRendererFactory, RendererFactory};
use crate::handle::RendererHandle;
use crate::stats::PoolStats;
use crate::traits::Healthcheck;
use crate::worker::{Task, Worker};

/// Error returned to a submitter whose task was dropped unanswered.
const DROPPED_TASK: &str = "task dropped before completion";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// WorkerPoolInner
// ============================================================================

/// State shared between the pool facade and its workers.
pub(crate) struct WorkerPoolInner {
    config: WorkerPoolConfig,

    /// The single renderer session of this pool.
    handle: RendererHandle,

    /// Sending end of the queue, `None` once shutdown began.
    sender: Mutex<Option<mpsc::Sender<Task>>>,

    /// Worker threads, drained by shutdown.
    workers: Mutex<Vec<Worker>>,

    shutting_down: AtomicBool,

    /// Set once teardown finished.
    terminated: (Mutex<bool>, Condvar),

    next_task_id: AtomicU64,
    queued: AtomicUsize,
    in_flight: AtomicUsize,
    completed: AtomicU64,
    failed: AtomicU64,
}

impl WorkerPoolInner {
    pub(crate) fn handle(&self) -> &RendererHandle {
        &self.handle
    }

    /// A worker took a task off the queue.
    pub(crate) fn task_started(&self) {
        self.queued.fetch_sub(1, Ordering::SeqCst);
        self.in_flight.fetch_add(1, Ordering::SeqCst);
    }

    /// A worker finished a task.
    pub(crate) fn task_finished(&self, success: bool) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if success {
            self.completed.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Validate `html` and build a task plus a sender to enqueue it with.
    fn prepare(
        &self,
        html: String,
    ) -> Result<(mpsc::Sender<Task>, Task, oneshot::Receiver<Result<Vec<u8>>>)> {
        if html.trim().is_empty() {
            log::debug!("Rejecting submission of empty HTML");
            return Err(RenderPoolError::InvalidInput);
        }

        if self.is_shutting_down() {
            return Err(RenderPoolError::PoolClosed);
        }

        let sender = lock(&self.sender)
            .as_ref()
            .cloned()
            .ok_or(RenderPoolError::PoolClosed)?;

        let (reply, receiver) = oneshot::channel();
        let task = Task {
            id: self.next_task_id.fetch_add(1, Ordering::SeqCst),
            html,
            reply,
            enqueued_at: Instant::now(),
        };

        log::trace!("Submitting task {}", task.id);
        self.queued.fetch_add(1, Ordering::SeqCst);

        Ok((sender, task, receiver))
    }

    /// Undo the queue accounting of a task that never made it in.
    fn rejected(&self, id: u64) -> RenderPoolError {
        self.queued.fetch_sub(1, Ordering::SeqCst);
        log::debug!("Task {} rejected, queue closed", id);
        RenderPoolError::PoolClosed
    }

    fn shutdown(&self) -> Result<()> {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            log::debug!("Shutdown already requested");
            return Err(RenderPoolError::AlreadyClosed);
        }

        log::info!("Shutting down worker pool...");

        // Workers see the queue close once every in-flight submit drops its clone
        drop(lock(&self.sender).take());
        log::debug!("Queue closed to new tasks, draining");

        let workers = std::mem::take(&mut *lock(&self.workers));
        log::debug!("Joining {} workers...", workers.len());
        for worker in workers {
            worker.join();
        }

        self.handle.shutdown();

        let (done, cvar) = &self.terminated;
        *lock(done) = true;
        cvar.notify_all();

        log::info!(
            "✅ Worker pool shut down - completed: {}, failed: {}",
            self.completed.load(Ordering::SeqCst),
            self.failed.load(Ordering::SeqCst)
        );

        Ok(())
    }

    fn await_termination(&self) {
        let (done, cvar) = &self.terminated;
        let mut finished = lock(done);
        while !*finished {
            finished = cvar.wait(finished).unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn is_terminated(&self) -> bool {
        *lock(&self.terminated.0)
    }

    fn stats(&self) -> PoolStats {
        PoolStats {
            workers: self.config.pool_size,
            queued: self.queued.load(Ordering::SeqCst),
            in_flight: self.in_flight.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            accepting: !self.is_shutting_down(),
        }
    }
}

// ============================================================================
// WorkerPool
// ============================================================================

/// Fixed-size pool of worker threads rendering HTML to PDF through one
/// shared renderer session.
///
/// # Thread Safety
///
/// `WorkerPool` is `Send + Sync`. Share it with [`into_shared`](Self::into_shared)
/// and call [`submit`](Self::submit) from any number of threads.
///
/// # Example
///
/// ```rust,ignore
/// use html2pdf_pool::{ChromeRendererFactory, WorkerPool, WorkerPoolConfigBuilder};
///
/// let pool = WorkerPool::builder()
///     .config(WorkerPoolConfigBuilder::new().pool_size(8).build()?)
///     .factory(Box::new(ChromeRendererFactory::with_defaults()))
///     .build()?;
///
/// let pdf = pool.submit("<p>Hello</p>")?;
/// ```
pub struct WorkerPool {
    inner: Arc<WorkerPoolInner>,
}

impl WorkerPool {
    /// Create a pool of `size` workers backed by headless Chrome.
    ///
    /// # Errors
    ///
    /// - [`RenderPoolError::Configuration`] if `size` is 0.
    /// - [`RenderPoolError::InitFailed`] if Chrome cannot be launched.
    pub fn new(size: usize) -> Result<Self> {
        let config = crate::config::WorkerPoolConfigBuilder::new()
            .pool_size(size)
            .build()?;
        let factory = ChromeRendererFactory::from_config(&config, None);

        Self::builder()
            .config(config)
            .factory(Box::new(factory))
            .build()
    }

    /// Create a new builder.
    pub fn builder() -> WorkerPoolBuilder {
        WorkerPoolBuilder::new()
    }

    /// Convert into a shareable `Arc`.
    pub fn into_shared(self) -> SharedWorkerPool {
        log::debug!("Converting WorkerPool into shared Arc");
        Arc::new(self)
    }

    /// Render `html`, blocking until its PDF is ready.
    ///
    /// Waits for queue space when the queue is full, then for the result.
    ///
    /// HTML that is empty or contains only whitespace is rejected before
    /// it is queued.
    ///
    /// # Errors
    ///
    /// - [`RenderPoolError::InvalidInput`] for empty or whitespace-only HTML.
    ///   Nothing is queued.
    /// - [`RenderPoolError::PoolClosed`] once shutdown has begun.
    /// - Any error of [`RendererHandle::render`] for this task.
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context.
    /// Use [`submit_async`](Self::submit_async) there.
    pub fn submit(&self, html: impl Into<String>) -> Result<Vec<u8>> {
        let (sender, task, receiver) = self.inner.prepare(html.into())?;
        let id = task.id;

        let sent = sender.blocking_send(task);
        drop(sender);
        if sent.is_err() {
            return Err(self.inner.rejected(id));
        }

        receiver
            .blocking_recv()
            .unwrap_or_else(|_| Err(RenderPoolError::RenderFailed(DROPPED_TASK.to_string())))
    }

    /// Async variant of [`submit`](Self::submit).
    ///
    /// Same contract, including rejection of whitespace-only HTML.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let pdf = pool.submit_async("<p>Hello</p>").await?;
    /// ```
    pub async fn submit_async(&self, html: impl Into<String>) -> Result<Vec<u8>> {
        let (sender, task, receiver) = self.inner.prepare(html.into())?;
        let id = task.id;

        let sent = sender.send(task).await;
        drop(sender);
        if sent.is_err() {
            return Err(self.inner.rejected(id));
        }

        receiver
            .await
            .unwrap_or_else(|_| Err(RenderPoolError::RenderFailed(DROPPED_TASK.to_string())))
    }

    /// Stop accepting work, drain the queue, join the workers, then close
    /// the renderer session.
    ///
    /// Blocks until teardown is complete. Teardown failures are logged.
    ///
    /// # Errors
    ///
    /// Returns [`RenderPoolError::AlreadyClosed`] without waiting if
    /// shutdown was already requested.
    pub fn shutdown(&self) -> Result<()> {
        self.inner.shutdown()
    }

    /// Async variant of [`shutdown`](Self::shutdown).
    ///
    /// Runs the blocking teardown on the blocking thread pool.
    pub async fn shutdown_async(&self) -> Result<()> {
        let inner = Arc::clone(&self.inner);

        tokio::task::spawn_blocking(move || inner.shutdown())
            .await
            .unwrap_or_else(|e| {
                log::error!("❌ Shutdown task failed: {}", e);
                Err(RenderPoolError::ShutdownFailed(e.to_string()))
            })
    }

    /// Block until a shutdown has completed.
    pub fn await_termination(&self) {
        self.inner.await_termination();
    }

    /// Whether the pool still accepts submissions.
    pub fn is_accepting(&self) -> bool {
        !self.inner.is_shutting_down()
    }

    /// Whether teardown has completed.
    pub fn is_terminated(&self) -> bool {
        self.inner.is_terminated()
    }

    /// Number of workers.
    pub fn size(&self) -> usize {
        self.inner.config.pool_size
    }

    /// The configuration the pool was built with.
    pub fn config(&self) -> &WorkerPoolConfig {
        &self.inner.config
    }

    /// Snapshot of the pool's counters.
    pub fn stats(&self) -> PoolStats {
        let stats = self.inner.stats();
        log::trace!(
            "Pool stats: queued={}, in_flight={}",
            stats.queued,
            stats.in_flight
        );
        stats
    }

    /// Probe the renderer session.
    ///
    /// # Errors
    ///
    /// [`RenderPoolError::NotReady`] once the session is closed, or the
    /// session's own probe error.
    pub fn ping(&self) -> Result<()> {
        self.inner.handle.ping()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.inner.is_shutting_down() {
            log::warn!("⚠️ WorkerPool dropped without explicit shutdown - cleaning up");
            let _ = self.inner.shutdown();
        } else {
            log::debug!("Pool already shut down, Drop is no-op");
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("config", &self.inner.config)
            .field("stats", &self.inner.stats())
            .finish()
    }
}

// ============================================================================
// WorkerPoolBuilder
// ============================================================================

/// Builder for constructing a [`WorkerPool`].
///
/// # Example
///
/// ```rust,ignore
/// use html2pdf_pool::{ChromeRendererFactory, WorkerPool, WorkerPoolConfigBuilder};
///
/// let pool = WorkerPool::builder()
///     .config(WorkerPoolConfigBuilder::new().pool_size(10).build()?)
///     .factory(Box::new(ChromeRendererFactory::with_defaults()))
///     .build()?;
/// ```
pub struct WorkerPoolBuilder {
    /// Optional configuration (uses default if not provided).
    config: Option<WorkerPoolConfig>,

    /// Renderer factory (required).
    factory: Option<Box<dyn RendererFactory>>,
}

impl WorkerPoolBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            config: None,
            factory: None,
        }
    }

    /// Set custom configuration.
    ///
    /// If not called, uses [`WorkerPoolConfig::default()`].
    pub fn config(mut self, config: WorkerPoolConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the renderer factory (required).
    ///
    /// It is used once, to establish the pool's single session.
    pub fn factory(mut self, factory: Box<dyn RendererFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Establish the renderer session and start the workers.
    ///
    /// # Errors
    ///
    /// - [`RenderPoolError::Configuration`] if no factory was provided or
    ///   the pool size is 0.
    /// - [`RenderPoolError::InitFailed`] if the session cannot be
    ///   established or a worker thread cannot be spawned. Anything already
    ///   started is torn down again.
    pub fn build(self) -> Result<WorkerPool> {
        let config = self.config.unwrap_or_default();
        let factory = self.factory.ok_or_else(|| {
            RenderPoolError::Configuration("No renderer factory provided".to_string())
        })?;

        if config.pool_size == 0 {
            return Err(RenderPoolError::Configuration(
                "pool_size must be greater than 0".to_string(),
            ));
        }

        log::info!("Building worker pool with config: {:?}", config);

        let handle = RendererHandle::new(factory.as_ref())?;
        let (sender, receiver) = mpsc::channel(config.pool_size);
        let size = config.pool_size;

        let inner = Arc::new(WorkerPoolInner {
            config,
            handle,
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(Vec::with_capacity(size)),
            shutting_down: AtomicBool::new(false),
            terminated: (Mutex::new(false), Condvar::new()),
            next_task_id: AtomicU64::new(0),
            queued: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        });

        let queue = Arc::new(Mutex::new(receiver));
        for id in 0..size {
            match Worker::spawn(id, Arc::clone(&queue), Arc::clone(&inner)) {
                Ok(worker) => lock(&inner.workers).push(worker),
                Err(e) => {
                    log::error!("❌ Failed to spawn worker {}: {}", id, e);
                    let _ = inner.shutdown();
                    return Err(RenderPoolError::InitFailed(format!(
                        "failed to spawn worker {}: {}",
                        id, e
                    )));
                }
            }
        }

        log::info!("✅ Worker pool started with {} workers", size);

        Ok(WorkerPool { inner })
    }
}

impl Default for WorkerPoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Environment Initialization (feature-gated)
// ============================================================================

/// Initialize a shared worker pool from environment variables.
///
/// # Feature Flag
///
/// This function is only available when the `env-config` feature is enabled.
///
/// # Environment Variables
///
/// - `RENDER_POOL_SIZE`: Worker count (default: 5)
/// - `RENDER_PRINT_BACKGROUND`: Print CSS backgrounds (default: true)
/// - `RENDER_LANDSCAPE`: Landscape orientation (default: false)
/// - `CHROME_PATH`: Custom Chrome binary path (optional)
///
/// # Errors
///
/// - Returns error if configuration is invalid.
/// - Returns error if Chrome cannot be launched.
///
/// # Example
///
/// ```rust,ignore
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     env_logger::init();
///
///     let pool = init_worker_pool()?;
///     let pdf = pool.submit("<h1>Hello</h1>")?;
///
///     Ok(())
/// }
/// ```
#[cfg(feature = "env-config")]
pub fn init_worker_pool() -> Result<SharedWorkerPool> {
    use crate::config::env::{chrome_path_from_env, from_env};

    log::info!("Initializing worker pool from environment...");

    let config = from_env()?;
    let chrome_path = chrome_path_from_env();

    log::info!(
        "   - Chrome path: {}",
        chrome_path.as_deref().unwrap_or("auto-detect")
    );

    let factory = ChromeRendererFactory::from_config(&config, chrome_path);

    let pool = WorkerPool::builder()
        .config(config)
        .factory(Box::new(factory))
        .build()
        .map_err(|e| {
            log::error!("❌ Failed to create worker pool: {}", e);
            e
        })?;

    log::info!("✅ Worker pool ready with {} workers", pool.size());

    Ok(pool.into_shared())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkerPoolConfigBuilder;
    use crate::factory::mock::{MockRendererFactory, mock_pdf_bytes};

    fn mock_pool(size: usize, factory: MockRendererFactory) -> WorkerPool {
        WorkerPool::builder()
            .config(WorkerPoolConfigBuilder::new().pool_size(size).build().unwrap())
            .factory(Box::new(factory))
            .build()
            .unwrap()
    }

    /// Verifies that the builder rejects a missing factory.
    #[test]
    fn test_pool_builder_missing_factory() {
        let config = WorkerPoolConfigBuilder::new().pool_size(3).build().unwrap();

        let result = WorkerPool::builder()
            .config(config)
            // Intentionally missing factory
            .build();

        match result {
            Err(RenderPoolError::Configuration(msg)) => {
                assert!(
                    msg.contains("No renderer factory provided"),
                    "Expected factory error, got: {}",
                    msg
                );
            }
            _ => panic!("Expected Configuration error for missing factory"),
        }
    }

    /// Verifies that a zero-sized config is rejected even if built by hand.
    #[test]
    fn test_pool_builder_zero_size() {
        let config = WorkerPoolConfig {
            pool_size: 0,
            ..WorkerPoolConfig::default()
        };

        let result = WorkerPool::builder()
            .config(config)
            .factory(Box::new(MockRendererFactory::new()))
            .build();

        assert!(matches!(result, Err(RenderPoolError::Configuration(_))));
    }

    /// Verifies that a failing factory means no pool.
    #[test]
    fn test_pool_builder_init_failure() {
        let result = WorkerPool::builder()
            .factory(Box::new(MockRendererFactory::always_fails("no chrome")))
            .build();

        assert!(matches!(result, Err(RenderPoolError::InitFailed(_))));
    }

    /// Verifies that WorkerPoolBuilder implements Default.
    #[test]
    fn test_builder_default() {
        let builder: WorkerPoolBuilder = Default::default();
        assert!(builder.config.is_none());
        assert!(builder.factory.is_none());
    }

    /// Verifies a round trip through the queue and the stats it leaves.
    #[test]
    fn test_pool_submit_and_stats() {
        let pool = mock_pool(2, MockRendererFactory::new().fail_on("bad"));

        assert_eq!(pool.submit("<p>ok</p>").unwrap(), mock_pdf_bytes("<p>ok</p>"));
        assert!(pool.submit("<p>bad</p>").is_err());

        let stats = pool.stats();
        assert_eq!(stats.workers, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.failed, 1);
        assert!(stats.is_idle());
        assert!(stats.accepting);

        pool.shutdown().unwrap();
        assert!(!pool.stats().accepting);
    }

    /// Verifies the lifecycle flags across shutdown.
    #[test]
    fn test_pool_lifecycle_flags() {
        let pool = mock_pool(1, MockRendererFactory::new());
        assert!(pool.is_accepting());
        assert!(!pool.is_terminated());
        assert!(pool.ping().is_ok());

        pool.shutdown().unwrap();

        assert!(!pool.is_accepting());
        assert!(pool.is_terminated());
        assert!(matches!(pool.ping(), Err(RenderPoolError::NotReady)));
        assert!(matches!(pool.shutdown(), Err(RenderPoolError::AlreadyClosed)));

        // Returns immediately once terminated
        pool.await_termination();
    }

    /// Verifies that dropping a live pool tears it down.
    #[test]
    fn test_pool_drop_shuts_down() {
        let factory = MockRendererFactory::new();
        let stats = factory.stats();

        let pool = mock_pool(2, factory);
        pool.submit("<p>x</p>").unwrap();
        drop(pool);

        assert_eq!(stats.sessions_closed(), 1);
    }
}
