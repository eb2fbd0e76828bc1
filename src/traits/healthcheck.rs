//! Health check trait for renderer sessions.
//!
//! This module provides the [`Healthcheck`] trait, which defines how a
//! renderer session (and the [`RendererHandle`](crate::RendererHandle) that
//! owns it) verifies it is still responsive.
//!
//! # Implementors
//!
//! - Every [`RenderSession`](crate::RenderSession) (it is a supertrait)
//! - [`RendererHandle`](crate::RendererHandle), which delegates to its
//!   session and marks the session dead if the probe reports it lost
//!
//! The pool itself never pings on a timer; callers use
//! [`WorkerPool::ping`](crate::WorkerPool::ping) for readiness checks.

use crate::error::Result;

/// Trait for renderer objects that support health checking.
///
/// # Thread Safety
///
/// This trait requires `Send + Sync` because probes may run on any thread
/// while workers are rendering on others.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use html2pdf_pool::{Healthcheck, Result, RenderPoolError};
///
/// struct MySession {
///     inner: SomeConnection,
/// }
///
/// impl Healthcheck for MySession {
///     fn ping(&self) -> Result<()> {
///         self.inner
///             .version()
///             .map(|_| ())
///             .map_err(|e| RenderPoolError::SessionLost(e.to_string()))
///     }
/// }
/// ```
pub trait Healthcheck: Send + Sync {
    /// Perform a lightweight liveness probe.
    ///
    /// # Implementation Guidelines
    ///
    /// - **Keep it fast**: avoid opening pages or rendering
    /// - **Don't hold locks**: release any locks before performing I/O
    /// - **Be idempotent**: multiple calls should be safe
    ///
    /// # Errors
    ///
    /// - [`RenderPoolError::SessionLost`](crate::RenderPoolError::SessionLost)
    ///   if the underlying connection is gone
    /// - [`RenderPoolError::HealthCheckFailed`](crate::RenderPoolError::HealthCheckFailed)
    ///   for a failed probe that does not imply the session is dead
    /// - [`RenderPoolError::NotReady`](crate::RenderPoolError::NotReady)
    ///   if there is no session to probe
    fn ping(&self) -> Result<()>;
}
