//! Signal-triggered shutdown of a worker pool.
//!
//! This module provides [`ShutdownCoordinator`], which ties a pool's
//! teardown to process termination (Ctrl+C / SIGTERM) so that accepted
//! tasks finish and the renderer session is closed before the process
//! exits.
//!
//! # Example
//!
//! ```rust,ignore
//! use html2pdf_pool::{ShutdownCoordinator, init_worker_pool};
//!
//! let pool = init_worker_pool()?;
//!
//! // Runs on its own thread, exits the process after cleanup
//! ShutdownCoordinator::new(pool.clone()).install()?;
//!
//! loop {
//!     let pdf = pool.submit(next_document())?;
//!     // ...
//! }
//! ```
//!
//! Inside an existing tokio application, run it as a task instead:
//!
//! ```rust,ignore
//! tokio::spawn(ShutdownCoordinator::new(pool.clone()).run());
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crate::SharedWorkerPool;
use crate::error::{RenderPoolError, Result};

/// What a termination callback did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// This callback shut the pool down.
    Performed,

    /// Someone else had already started shutdown; the callback waited for
    /// it to finish.
    AlreadyShutDown,

    /// The callback had already run once.
    AlreadyHandled,

    /// Shutdown could not be run.
    Failed(String),
}

/// Shuts a pool down once when the process is asked to terminate.
pub struct ShutdownCoordinator {
    pool: SharedWorkerPool,
    exit_process: bool,
    fired: AtomicBool,
}

impl ShutdownCoordinator {
    /// Create a coordinator for `pool`.
    ///
    /// By default the process exits with status 0 after cleanup.
    pub fn new(pool: SharedWorkerPool) -> Self {
        Self {
            pool,
            exit_process: true,
            fired: AtomicBool::new(false),
        }
    }

    /// Whether to exit the process after cleanup (default `true`).
    pub fn exit_process(mut self, exit: bool) -> Self {
        self.exit_process = exit;
        self
    }

    /// The termination callback.
    ///
    /// Runs the pool's shutdown at most once. If shutdown was already
    /// started elsewhere, blocks until that teardown completes so the
    /// process never exits in the middle of it. Failures are logged.
    pub fn on_termination_requested(&self) -> ShutdownOutcome {
        if self.fired.swap(true, Ordering::SeqCst) {
            log::debug!("Termination already handled");
            return ShutdownOutcome::AlreadyHandled;
        }

        match self.pool.shutdown() {
            Ok(()) => {
                log::info!("✅ Worker pool shut down on termination request");
                ShutdownOutcome::Performed
            }
            Err(RenderPoolError::AlreadyClosed) => {
                log::info!("Worker pool already shutting down, waiting for it to finish...");
                self.pool.await_termination();
                ShutdownOutcome::AlreadyShutDown
            }
            Err(e) => {
                log::error!("❌ Failed to shut down worker pool: {}", e);
                ShutdownOutcome::Failed(e.to_string())
            }
        }
    }

    /// Wait for `trigger`, run the callback, then exit if configured to.
    ///
    /// The callback blocks, so it runs on the blocking thread pool.
    pub async fn run_until<F>(self, trigger: F) -> ShutdownOutcome
    where
        F: Future<Output = ()>,
    {
        trigger.await;
        log::info!("Termination requested, cleaning up...");

        let exit = self.exit_process;
        let outcome = tokio::task::spawn_blocking(move || self.on_termination_requested())
            .await
            .unwrap_or_else(|e| {
                log::error!("❌ Termination callback failed: {}", e);
                ShutdownOutcome::Failed(e.to_string())
            });

        if exit {
            log::info!("Cleanup complete, exiting");
            std::process::exit(0);
        }

        log::info!("Cleanup complete");
        outcome
    }

    /// Wait for Ctrl+C or SIGTERM, then shut the pool down.
    pub async fn run(self) -> ShutdownOutcome {
        self.run_until(termination_requested()).await
    }

    /// Run the coordinator on a dedicated thread with its own runtime.
    ///
    /// For programs that are not otherwise async.
    ///
    /// # Errors
    ///
    /// Returns [`RenderPoolError::Signal`] if the runtime or the thread
    /// cannot be created.
    pub fn install(self) -> Result<JoinHandle<ShutdownOutcome>> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| RenderPoolError::Signal(e.to_string()))?;

        // Listeners exist before this returns, so an early signal is not lost
        let signals = {
            let _context = runtime.enter();
            TerminationSignals::listen()
        };

        let handle = thread::Builder::new()
            .name("shutdown-coordinator".to_string())
            .spawn(move || runtime.block_on(self.run_until(signals.recv())))
            .map_err(|e| RenderPoolError::Signal(e.to_string()))?;

        log::info!("Shutdown coordinator installed");
        Ok(handle)
    }
}

/// Registered Ctrl+C / SIGTERM listeners.
///
/// Signals delivered after [`listen`](Self::listen) returns are buffered
/// until [`recv`](Self::recv) is polled.
pub struct TerminationSignals {
    #[cfg(unix)]
    interrupt: Option<tokio::signal::unix::Signal>,
    #[cfg(unix)]
    terminate: Option<tokio::signal::unix::Signal>,
}

impl TerminationSignals {
    /// Register the listeners now.
    ///
    /// A listener that cannot be installed is logged and never fires.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime context.
    pub fn listen() -> Self {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let register = |kind: SignalKind, name: &str| match signal(kind) {
                Ok(stream) => Some(stream),
                Err(e) => {
                    log::error!("❌ Failed to listen for {}: {}", name, e);
                    None
                }
            };

            Self {
                interrupt: register(SignalKind::interrupt(), "Ctrl+C"),
                terminate: register(SignalKind::terminate(), "SIGTERM"),
            }
        }

        #[cfg(not(unix))]
        {
            Self {}
        }
    }

    /// Whether every listener was installed.
    pub fn is_listening(&self) -> bool {
        #[cfg(unix)]
        {
            self.interrupt.is_some() && self.terminate.is_some()
        }

        #[cfg(not(unix))]
        {
            true
        }
    }

    /// Resolve on the first termination signal.
    #[cfg(unix)]
    pub async fn recv(self) {
        async fn next(stream: Option<tokio::signal::unix::Signal>) {
            match stream {
                Some(mut stream) => {
                    stream.recv().await;
                }
                None => std::future::pending::<()>().await,
            }
        }

        tokio::select! {
            _ = next(self.interrupt) => log::info!("Received Ctrl+C"),
            _ = next(self.terminate) => log::info!("Received SIGTERM"),
        }
    }

    /// Resolve on the first termination signal.
    #[cfg(not(unix))]
    pub async fn recv(self) {
        match tokio::signal::ctrl_c().await {
            Ok(()) => log::info!("Received Ctrl+C"),
            Err(e) => {
                log::error!("❌ Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Resolves when the process receives Ctrl+C or (on Unix) SIGTERM.
///
/// A listener that cannot be installed is logged and never fires.
pub async fn termination_requested() {
    TerminationSignals::listen().recv().await
}
