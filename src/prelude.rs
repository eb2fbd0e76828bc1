//! Convenient imports for common usage patterns.
//!
//! ```rust,ignore
//! use html2pdf_pool::prelude::*;
//!
//! let pool = WorkerPool::builder()
//!     .config(WorkerPoolConfigBuilder::new().pool_size(4).build()?)
//!     .factory(Box::new(ChromeRendererFactory::with_defaults()))
//!     .build()?
//!     .into_shared();
//!
//! let pdf = pool.submit("<h1>Report</h1>")?;
//! ```

// Core types
pub use crate::SharedWorkerPool;
pub use crate::config::{WorkerPoolConfig, WorkerPoolConfigBuilder};
pub use crate::error::{RenderPoolError, Result};
pub use crate::factory::{ChromeRendererFactory, RendererFactory};
pub use crate::pool::{WorkerPool, WorkerPoolBuilder};
pub use crate::shutdown::{ShutdownCoordinator, ShutdownOutcome};
pub use crate::stats::PoolStats;
pub use crate::traits::Healthcheck;

// Feature-gated exports
#[cfg(feature = "env-config")]
pub use crate::config::env::{chrome_path_from_env, from_env};

#[cfg(feature = "env-config")]
pub use crate::pool::init_worker_pool;
