//! Shared handle to the single renderer session.
//!
//! This module provides [`RendererHandle`], which owns the one live
//! [`RenderSession`] of a pool and turns HTML into PDF bytes on behalf of
//! every worker.
//!
//! # Overview
//!
//! ```text
//! RendererHandle
//!   ├─ state: Mutex<Option<Arc<dyn RenderSession>>>   liveness only
//!   └─ render_gate: Option<Mutex<()>>                 when pages can't overlap
//!
//! render(html)
//!   1. reject blank html                    → InvalidInput
//!   2. clone the session Arc under the lock → NotReady if absent
//!   3. new_page → set_content → print_to_pdf → close   (lock released)
//!   4. SessionLost → detach the session, later calls get NotReady
//! ```
//!
//! The state lock is held only long enough to check the session and clone
//! its `Arc`. Renders themselves run outside the lock, so up to N workers
//! render concurrently, each on its own page.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{RenderPoolError, Result};
use crate::factory::{RenderSession, RendererFactory};
use crate::traits::Healthcheck;

/// Thread-safe owner of the shared renderer session.
///
/// Created once per pool and shared by all workers through an `Arc`.
///
/// # Lifecycle
///
/// ```text
/// Ready ──shutdown()──→ Closed
///   │
///   └──SessionLost──→ Closed
/// ```
///
/// There is no automatic reconnect. Once closed, every render returns
/// [`RenderPoolError::NotReady`].
///
/// # Example
///
/// ```rust,ignore
/// use html2pdf_pool::{ChromeRendererFactory, RendererHandle};
///
/// let handle = RendererHandle::new(&ChromeRendererFactory::with_defaults())?;
/// let pdf = handle.render("<h1>Hello</h1>")?;
/// assert!(pdf.starts_with(b"%PDF"));
/// handle.shutdown();
/// ```
pub struct RendererHandle {
    /// The live session, `None` once closed.
    state: Mutex<Option<Arc<dyn RenderSession>>>,

    /// Serializes renders when the session cannot overlap pages.
    render_gate: Option<Mutex<()>>,
}

impl RendererHandle {
    /// Establish a session through `factory`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderPoolError::InitFailed`] if the session cannot be
    /// established. No handle exists afterwards.
    pub fn new(factory: &dyn RendererFactory) -> Result<Self> {
        log::info!("Establishing renderer session...");

        let session = factory.establish().map_err(|e| {
            log::error!("❌ Failed to establish renderer session: {}", e);
            match e {
                RenderPoolError::InitFailed(msg) => RenderPoolError::InitFailed(msg),
                other => RenderPoolError::InitFailed(other.to_string()),
            }
        })?;

        let render_gate = if session.supports_concurrent_pages() {
            None
        } else {
            log::info!("Renderer cannot overlap pages, renders will be serialized");
            Some(Mutex::new(()))
        };

        log::info!("✅ Renderer session established");

        Ok(Self {
            state: Mutex::new(Some(session)),
            render_gate,
        })
    }

    /// Render `html` to PDF bytes.
    ///
    /// Safe to call from many threads at once. Each call gets its own page.
    ///
    /// # Errors
    ///
    /// - [`RenderPoolError::InvalidInput`] if `html` is empty or whitespace.
    ///   Nothing reaches the renderer.
    /// - [`RenderPoolError::NotReady`] if the session is closed.
    /// - [`RenderPoolError::RenderFailed`] if the renderer failed for this
    ///   page only.
    /// - [`RenderPoolError::SessionLost`] if the session died during this
    ///   render. The handle closes itself.
    pub fn render(&self, html: &str) -> Result<Vec<u8>> {
        if html.trim().is_empty() {
            log::debug!("Rejecting render of empty HTML");
            return Err(RenderPoolError::InvalidInput);
        }

        let _gate = self
            .render_gate
            .as_ref()
            .map(|gate| gate.lock().unwrap_or_else(PoisonError::into_inner));

        let session = self.session()?;

        let result = render_page(session.as_ref(), html);

        if let Err(RenderPoolError::SessionLost(reason)) = &result {
            log::error!("❌ Renderer session lost during render: {}", reason);
            self.detach(&session);
        }

        result
    }

    /// Close the session.
    ///
    /// Returns `true` if this call closed it, `false` if it was already
    /// closed. Close failures are logged, not returned.
    pub fn shutdown(&self) -> bool {
        let taken = self.lock_state().take();

        match taken {
            Some(session) => {
                log::info!("Closing renderer session...");
                close_session(session.as_ref());
                true
            }
            None => {
                log::debug!("Renderer session already closed");
                false
            }
        }
    }

    /// Whether a session is currently held.
    pub fn is_ready(&self) -> bool {
        self.lock_state().is_some()
    }

    /// Upper bound on overlapping renders imposed by the session.
    ///
    /// `Some(1)` when the session cannot overlap pages, `None` when the
    /// only bound is the caller's own concurrency.
    pub fn concurrency_limit(&self) -> Option<usize> {
        self.render_gate.as_ref().map(|_| 1)
    }

    fn lock_state(&self) -> MutexGuard<'_, Option<Arc<dyn RenderSession>>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn session(&self) -> Result<Arc<dyn RenderSession>> {
        self.lock_state()
            .as_ref()
            .map(Arc::clone)
            .ok_or(RenderPoolError::NotReady)
    }

    /// Drop `lost` if it is still the held session, then close it.
    fn detach(&self, lost: &Arc<dyn RenderSession>) {
        let taken = {
            let mut state = self.lock_state();
            match state.as_ref() {
                Some(current) if Arc::ptr_eq(current, lost) => state.take(),
                _ => None,
            }
        };

        if let Some(session) = taken {
            log::warn!("⚠️ Marking renderer session as closed, later renders will fail");
            close_session(session.as_ref());
        }
    }
}

fn render_page(session: &dyn RenderSession, html: &str) -> Result<Vec<u8>> {
    let page = session.new_page()?;

    let outcome = page.set_content(html).and_then(|_| page.print_to_pdf());

    if let Err(e) = page.close() {
        log::warn!("⚠️ Failed to close page: {}", e);
    }

    if let Ok(pdf) = &outcome {
        log::debug!("Rendered {} bytes of PDF", pdf.len());
    }

    outcome
}

fn close_session(session: &dyn RenderSession) {
    match session.close() {
        Ok(()) => log::info!("✅ Renderer session closed"),
        Err(e) => log::error!("❌ Failed to close renderer session: {}", e),
    }
}

impl Healthcheck for RendererHandle {
    /// Probe the held session.
    ///
    /// A [`RenderPoolError::SessionLost`] result closes the handle. A
    /// [`RenderPoolError::HealthCheckFailed`] result leaves it open.
    fn ping(&self) -> Result<()> {
        let session = self.session()?;

        let result = session.ping();
        if let Err(RenderPoolError::SessionLost(reason)) = &result {
            log::error!("❌ Renderer health check found a dead session: {}", reason);
            self.detach(&session);
        }
        result
    }
}

impl std::fmt::Debug for RendererHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererHandle")
            .field("ready", &self.is_ready())
            .field("concurrency_limit", &self.concurrency_limit())
            .finish()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
