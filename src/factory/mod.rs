//! Renderer collaborator traits and implementations.
//!
//! This module provides the traits the pool uses to talk to the external
//! rendering engine, plus the Chrome implementation.
//!
//! # Overview
//!
//! ```text
//! RendererFactory::establish()  ──→  RenderSession  (one per RendererHandle)
//!                                         │
//!                                         └─ new_page() ──→ RenderPage (one per render)
//!                                                               ├─ set_content(html)
//!                                                               ├─ print_to_pdf()
//!                                                               └─ close()
//! ```
//!
//! A page is a short-lived sub-context: a failure inside one page must not
//! affect other pages of the same session. A failure of the session itself
//! is reported as [`RenderPoolError::SessionLost`](crate::RenderPoolError::SessionLost).
//!
//! # Available Factories
//!
//! | Factory | Description |
//! |---------|-------------|
//! | [`ChromeRendererFactory`] | Launches headless Chrome/Chromium |
//! | [`mock::MockRendererFactory`] | Instrumented stub for testing (feature-gated) |
//!
//! # Custom Factory
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use html2pdf_pool::{RendererFactory, RenderSession, Result};
//!
//! struct MyRendererFactory;
//!
//! impl RendererFactory for MyRendererFactory {
//!     fn establish(&self) -> Result<Arc<dyn RenderSession>> {
//!         // Connect to your rendering engine
//!         todo!()
//!     }
//! }
//! ```

mod chrome;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use chrome::{ChromeRendererFactory, create_chrome_options};

use std::sync::Arc;

use crate::error::Result;
use crate::traits::Healthcheck;

/// Trait for establishing renderer sessions.
///
/// # Thread Safety
///
/// Requires `Send + Sync` so a factory can be handed to the pool builder
/// from any thread.
pub trait RendererFactory: Send + Sync {
    /// Establish a new renderer session.
    ///
    /// Called once per [`RendererHandle`](crate::RendererHandle). This may be
    /// slow (launching a browser takes seconds).
    ///
    /// # Errors
    ///
    /// Any error is surfaced as
    /// [`RenderPoolError::InitFailed`](crate::RenderPoolError::InitFailed)
    /// by the handle.
    fn establish(&self) -> Result<Arc<dyn RenderSession>>;
}

/// One live connection to the rendering engine.
///
/// Shared by all workers of a pool through the
/// [`RendererHandle`](crate::RendererHandle).
pub trait RenderSession: Healthcheck {
    /// Open a fresh page (sub-context) for a single render.
    ///
    /// # Errors
    ///
    /// Return [`RenderPoolError::SessionLost`](crate::RenderPoolError::SessionLost)
    /// when the failure means the session itself is unusable.
    fn new_page(&self) -> Result<Box<dyn RenderPage>>;

    /// Release the session.
    ///
    /// Called at most once by the handle. Pages opened earlier may still be
    /// in use and must fail cleanly afterwards.
    fn close(&self) -> Result<()>;

    /// Whether pages of this session may render concurrently.
    ///
    /// When `false`, the handle serializes renders behind a capacity-1 gate
    /// and the pool's effective concurrency becomes 1.
    fn supports_concurrent_pages(&self) -> bool {
        true
    }
}

/// A short-lived render context (one browser tab).
///
/// Used by a single worker for a single task, then closed.
pub trait RenderPage {
    /// Load the HTML document into the page.
    fn set_content(&self, html: &str) -> Result<()>;

    /// Print the loaded document to PDF bytes.
    fn print_to_pdf(&self) -> Result<Vec<u8>>;

    /// Close the page. Failures are logged by the handle, not propagated.
    fn close(&self) -> Result<()>;
}
