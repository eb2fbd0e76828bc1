//! # html2pdf-pool
//!
//! Bounded worker pool that renders HTML documents to PDF through a single
//! shared headless Chrome session.
//!
//! Many callers can submit HTML concurrently. A fixed number of worker
//! threads render the documents, each on its own browser tab, and every
//! caller receives exactly the PDF bytes of its own document.
//!
//! ## Features
//!
//! - **Bounded Concurrency**: At most N renders at once, at most N tasks queued
//! - **Backpressure**: Submitters wait once the queue is full
//! - **Single Session**: One browser per pool, one tab per render
//! - **Failure Isolation**: A broken document only fails its own caller
//! - **Graceful Shutdown**: Accepted work drains before the browser closes
//! - **Signal Handling**: Optional Ctrl+C / SIGTERM teardown before exit
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │     Callers (threads or async tasks)        │
//! └─────────────────┬───────────────────────────┘
//!                   │ submit(html)
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │              WorkerPool                     │
//! │ ┌─────────────────────────────────────────┐ │
//! │ │   Bounded Queue (capacity N)            │ │
//! │ └─────────────────────────────────────────┘ │
//! │ ┌─────────────────────────────────────────┐ │
//! │ │   Worker Threads                        │ │
//! │ │   [render-worker-0] ... [render-worker-N-1] │
//! │ └─────────────────────────────────────────┘ │
//! │ ┌─────────────────────────────────────────┐ │
//! │ │   RendererHandle (one shared session)   │ │
//! │ └─────────────────────────────────────────┘ │
//! └─────────────────┬───────────────────────────┘
//!                   │ one tab per render
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │        Headless Chrome Browser              │
//! │     (managed by headless_chrome crate)      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use html2pdf_pool::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = WorkerPool::builder()
//!         .config(WorkerPoolConfigBuilder::new().pool_size(4).build()?)
//!         .factory(Box::new(ChromeRendererFactory::with_defaults()))
//!         .build()?
//!         .into_shared();
//!
//!     ShutdownCoordinator::new(pool.clone()).install()?;
//!
//!     let pdf = pool.submit("<h1>Hello, PDF!</h1>")?;
//!     std::fs::write("hello.pdf", pdf)?;
//!
//!     pool.shutdown()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description | Default |
//! |---------|-------------|---------|
//! | `env-config` | Load configuration from environment variables and `app.env` | ✅ |
//! | `test-utils` | Enable [`MockRendererFactory`](factory::mock::MockRendererFactory) for testing | ❌ |
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, RenderPoolError>`](Result):
//!
//! ```rust,ignore
//! use html2pdf_pool::{RenderPoolError, WorkerPool};
//!
//! match pool.submit(html) {
//!     Ok(pdf) => { /* use pdf */ }
//!     Err(RenderPoolError::RenderFailed(msg)) => {
//!         // Only this document failed
//!         eprintln!("Render failed: {}", msg);
//!     }
//!     Err(e) if e.is_session_fatal() => {
//!         // The browser is gone, rebuild the pool
//!     }
//!     Err(e) => eprintln!("Pool error: {}", e),
//! }
//! ```
//!
//! ## Testing
//!
//! For testing without Chrome, enable the `test-utils` feature and use
//! [`MockRendererFactory`](factory::mock::MockRendererFactory):
//!
//! ```rust,ignore
//! use html2pdf_pool::factory::mock::MockRendererFactory;
//!
//! let factory = MockRendererFactory::new().fail_on("<broken>");
//! let pool = WorkerPool::builder()
//!     .factory(Box::new(factory))
//!     .build()?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// Modules
// ============================================================================

pub mod config;
pub mod error;
pub mod factory;
pub mod handle;
pub mod pool;
pub mod prelude;
pub mod shutdown;
pub mod stats;
pub mod traits;

// Internal modules (not publicly exposed)
pub(crate) mod worker;

// ============================================================================
// Re-exports (Public API)
// ============================================================================

// Core types
pub use config::{WorkerPoolConfig, WorkerPoolConfigBuilder};
pub use error::{RenderPoolError, Result};
pub use factory::{
    ChromeRendererFactory, RenderPage, RenderSession, RendererFactory, create_chrome_options,
};
pub use handle::RendererHandle;
pub use pool::{WorkerPool, WorkerPoolBuilder};
pub use shutdown::{
    ShutdownCoordinator, ShutdownOutcome, TerminationSignals, termination_requested,
};
pub use stats::PoolStats;
pub use traits::Healthcheck;

// Feature-gated re-exports
#[cfg(feature = "env-config")]
pub use config::env::{chrome_path_from_env, from_env};

#[cfg(feature = "env-config")]
pub use pool::init_worker_pool;

// ============================================================================
// Convenience type aliases
// ============================================================================

/// Shared worker pool type.
///
/// The pool synchronizes internally, so sharing needs no extra lock.
///
/// # Example
///
/// ```rust,ignore
/// use html2pdf_pool::SharedWorkerPool;
///
/// let pool: SharedWorkerPool = worker_pool.into_shared();
/// let for_thread = pool.clone();
/// std::thread::spawn(move || for_thread.submit("<p>hi</p>"));
/// ```
pub type SharedWorkerPool = std::sync::Arc<WorkerPool>;
