//! Mock renderer factory for testing.
//!
//! This module provides an instrumented implementation of
//! [`RendererFactory`] that needs no browser. It echoes deterministic bytes
//! per input and can be configured to be slow, to fail, to lose its session,
//! or to refuse overlapping pages.
//!
//! # Feature Flag
//!
//! This module is only available when:
//! - The `test-utils` feature is enabled, OR
//! - During testing (`#[cfg(test)]`)
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use html2pdf_pool::factory::mock::MockRendererFactory;
//!
//! let factory = MockRendererFactory::new()
//!     .with_delay(Duration::from_millis(50))
//!     .fail_on("<broken>");
//! let stats = factory.stats();
//!
//! // ... build a pool with the factory, submit work ...
//!
//! assert!(stats.max_concurrent_renders() <= 4);
//! ```

use std::cell::RefCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use super::{RenderPage, RenderSession, RendererFactory};
use crate::error::{RenderPoolError, Result};
use crate::traits::Healthcheck;

/// Prefix of every mock "PDF".
pub const MOCK_PDF_HEADER: &[u8] = b"%PDF-1.4\n%mock\n";

/// Bytes the mock renders for `html`.
///
/// Useful for asserting that each caller got exactly its own result.
pub fn mock_pdf_bytes(html: &str) -> Vec<u8> {
    let mut bytes = MOCK_PDF_HEADER.to_vec();
    bytes.extend_from_slice(html.as_bytes());
    bytes
}

/// Counters shared between a [`MockRendererFactory`], its sessions and pages.
///
/// Obtain with [`MockRendererFactory::stats`] before moving the factory
/// into a pool.
#[derive(Debug, Default)]
pub struct MockRendererStats {
    establish_attempts: AtomicUsize,
    sessions_closed: AtomicUsize,
    pages_opened: AtomicUsize,
    pages_closed: AtomicUsize,
    renders_completed: AtomicUsize,
    current_renders: AtomicUsize,
    max_concurrent_renders: AtomicUsize,
}

impl MockRendererStats {
    /// Number of `establish()` calls, successful or not.
    pub fn establish_attempts(&self) -> usize {
        self.establish_attempts.load(Ordering::SeqCst)
    }

    /// Number of `close()` calls on sessions.
    pub fn sessions_closed(&self) -> usize {
        self.sessions_closed.load(Ordering::SeqCst)
    }

    /// Number of pages opened, i.e. renders that reached the collaborator.
    pub fn pages_opened(&self) -> usize {
        self.pages_opened.load(Ordering::SeqCst)
    }

    /// Number of pages closed.
    pub fn pages_closed(&self) -> usize {
        self.pages_closed.load(Ordering::SeqCst)
    }

    /// Number of successful prints.
    pub fn renders_completed(&self) -> usize {
        self.renders_completed.load(Ordering::SeqCst)
    }

    /// Pages currently open.
    pub fn current_renders(&self) -> usize {
        self.current_renders.load(Ordering::SeqCst)
    }

    /// Highest number of pages ever open at the same time.
    pub fn max_concurrent_renders(&self) -> usize {
        self.max_concurrent_renders.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.current_renders.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent_renders.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current_renders.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Behavior shared by every session of one factory.
#[derive(Debug, Clone)]
struct MockBehavior {
    delay: Duration,
    fail_marker: Option<String>,
    fatal_marker: Option<String>,
    panic_marker: Option<String>,
    concurrent_pages: bool,
    degraded: bool,
}

/// Mock renderer factory for testing without Chrome.
///
/// # Thread Safety
///
/// This factory is `Send + Sync` and tracks state using atomic operations.
pub struct MockRendererFactory {
    /// Fail `establish()` with this message.
    establish_error: Option<String>,

    behavior: MockBehavior,

    stats: Arc<MockRendererStats>,
}

impl MockRendererFactory {
    /// Create a mock factory whose sessions render instantly and never fail.
    pub fn new() -> Self {
        Self {
            establish_error: None,
            behavior: MockBehavior {
                delay: Duration::ZERO,
                fail_marker: None,
                fatal_marker: None,
                panic_marker: None,
                concurrent_pages: true,
                degraded: false,
            },
            stats: Arc::new(MockRendererStats::default()),
        }
    }

    /// Create a mock factory whose `establish()` always fails.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let factory = MockRendererFactory::always_fails("Chrome not installed");
    /// assert!(factory.establish().is_err());
    /// ```
    pub fn always_fails<S: Into<String>>(message: S) -> Self {
        Self {
            establish_error: Some(message.into()),
            ..Self::new()
        }
    }

    /// Sleep this long inside every `print_to_pdf`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.behavior.delay = delay;
        self
    }

    /// Fail the print (per-task failure) when the HTML contains `marker`.
    pub fn fail_on<S: Into<String>>(mut self, marker: S) -> Self {
        self.behavior.fail_marker = Some(marker.into());
        self
    }

    /// Lose the whole session when the HTML contains `marker`.
    pub fn fatal_on<S: Into<String>>(mut self, marker: S) -> Self {
        self.behavior.fatal_marker = Some(marker.into());
        self
    }

    /// Panic inside `set_content` when the HTML contains `marker`.
    pub fn panic_on<S: Into<String>>(mut self, marker: S) -> Self {
        self.behavior.panic_marker = Some(marker.into());
        self
    }

    /// Declare that sessions cannot render pages concurrently.
    pub fn serial(mut self) -> Self {
        self.behavior.concurrent_pages = false;
        self
    }

    /// Answer health checks with a degraded (but not lost) result.
    pub fn degraded(mut self) -> Self {
        self.behavior.degraded = true;
        self
    }

    /// Get the shared counters.
    ///
    /// The counters remain readable after the factory has been moved into a
    /// pool.
    pub fn stats(&self) -> Arc<MockRendererStats> {
        Arc::clone(&self.stats)
    }
}

impl Default for MockRendererFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl RendererFactory for MockRendererFactory {
    /// Create a mock session or return the configured error.
    ///
    /// # Errors
    ///
    /// Returns [`RenderPoolError::InitFailed`] when configured to fail.
    fn establish(&self) -> Result<Arc<dyn RenderSession>> {
        let attempt = self.stats.establish_attempts.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(message) = &self.establish_error {
            log::debug!("MockRendererFactory: Returning configured failure");
            return Err(RenderPoolError::InitFailed(message.clone()));
        }

        log::debug!("MockRendererFactory: Establishing mock session #{}", attempt);
        Ok(Arc::new(MockSession {
            behavior: self.behavior.clone(),
            stats: Arc::clone(&self.stats),
            flags: Arc::new(SessionFlags::default()),
        }))
    }
}

impl std::fmt::Debug for MockRendererFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRendererFactory")
            .field("establish_error", &self.establish_error)
            .field("behavior", &self.behavior)
            .field("stats", &self.stats)
            .finish()
    }
}

#[derive(Debug, Default)]
struct SessionFlags {
    closed: AtomicBool,
    lost: AtomicBool,
}

impl SessionFlags {
    fn check(&self) -> Result<()> {
        if self.lost.load(Ordering::SeqCst) {
            return Err(RenderPoolError::SessionLost("mock session crashed".to_string()));
        }
        if self.closed.load(Ordering::SeqCst) {
            return Err(RenderPoolError::SessionLost("mock session closed".to_string()));
        }
        Ok(())
    }
}

struct MockSession {
    behavior: MockBehavior,
    stats: Arc<MockRendererStats>,
    flags: Arc<SessionFlags>,
}

impl Healthcheck for MockSession {
    fn ping(&self) -> Result<()> {
        self.flags.check()?;
        if self.behavior.degraded {
            return Err(RenderPoolError::HealthCheckFailed(
                "mock session is slow".to_string(),
            ));
        }
        Ok(())
    }
}

impl RenderSession for MockSession {
    fn new_page(&self) -> Result<Box<dyn RenderPage>> {
        self.flags.check()?;

        self.stats.pages_opened.fetch_add(1, Ordering::SeqCst);
        self.stats.enter();

        Ok(Box::new(MockPage {
            behavior: self.behavior.clone(),
            stats: Arc::clone(&self.stats),
            flags: Arc::clone(&self.flags),
            content: RefCell::new(None),
        }))
    }

    fn close(&self) -> Result<()> {
        self.flags.closed.store(true, Ordering::SeqCst);
        self.stats.sessions_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn supports_concurrent_pages(&self) -> bool {
        self.behavior.concurrent_pages
    }
}

struct MockPage {
    behavior: MockBehavior,
    stats: Arc<MockRendererStats>,
    flags: Arc<SessionFlags>,
    content: RefCell<Option<String>>,
}

fn contains_marker(html: &str, marker: &Option<String>) -> bool {
    marker.as_deref().is_some_and(|m| html.contains(m))
}

impl RenderPage for MockPage {
    fn set_content(&self, html: &str) -> Result<()> {
        self.flags.check()?;

        if contains_marker(html, &self.behavior.panic_marker) {
            panic!("mock renderer panicked on request");
        }
        if contains_marker(html, &self.behavior.fatal_marker) {
            self.flags.lost.store(true, Ordering::SeqCst);
            return Err(RenderPoolError::SessionLost("mock session crashed".to_string()));
        }

        *self.content.borrow_mut() = Some(html.to_string());
        Ok(())
    }

    fn print_to_pdf(&self) -> Result<Vec<u8>> {
        if !self.behavior.delay.is_zero() {
            std::thread::sleep(self.behavior.delay);
        }

        // The session may have been closed while this page was printing
        self.flags.check()?;

        let content = self.content.borrow();
        let html = content
            .as_deref()
            .ok_or_else(|| RenderPoolError::RenderFailed("no content loaded".to_string()))?;

        if contains_marker(html, &self.behavior.fail_marker) {
            return Err(RenderPoolError::RenderFailed("injected render failure".to_string()));
        }

        self.stats.renders_completed.fetch_add(1, Ordering::SeqCst);
        Ok(mock_pdf_bytes(html))
    }

    fn close(&self) -> Result<()> {
        self.stats.pages_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for MockPage {
    fn drop(&mut self) {
        self.stats.exit();
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn render(session: &Arc<dyn RenderSession>, html: &str) -> Result<Vec<u8>> {
        let page = session.new_page()?;
        page.set_content(html)?;
        let bytes = page.print_to_pdf()?;
        page.close()?;
        Ok(bytes)
    }

    /// Verifies that always_fails factory returns InitFailed.
    #[test]
    fn test_mock_factory_always_fails() {
        let factory = MockRendererFactory::always_fails("Test error");

        match factory.establish() {
            Err(RenderPoolError::InitFailed(msg)) => assert_eq!(msg, "Test error"),
            Err(e) => panic!("Expected InitFailed error, got {:?}", e),
            Ok(_) => panic!("Expected InitFailed error"),
        }
        assert_eq!(factory.stats().establish_attempts(), 1);
    }

    /// Verifies deterministic output per input.
    #[test]
    fn test_mock_renders_deterministic_bytes() {
        let factory = MockRendererFactory::new();
        let session = factory.establish().unwrap();

        let first = render(&session, "<p>A</p>").unwrap();
        let second = render(&session, "<p>A</p>").unwrap();
        let other = render(&session, "<p>B</p>").unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert!(first.starts_with(MOCK_PDF_HEADER));
        assert_eq!(first, mock_pdf_bytes("<p>A</p>"));

        let stats = factory.stats();
        assert_eq!(stats.pages_opened(), 3);
        assert_eq!(stats.pages_closed(), 3);
        assert_eq!(stats.renders_completed(), 3);
        assert_eq!(stats.current_renders(), 0);
    }

    /// Verifies that an injected failure only affects the matching page.
    #[test]
    fn test_mock_fail_marker() {
        let factory = MockRendererFactory::new().fail_on("boom");
        let session = factory.establish().unwrap();

        assert!(matches!(
            render(&session, "<p>boom</p>"),
            Err(RenderPoolError::RenderFailed(_))
        ));
        assert!(render(&session, "<p>fine</p>").is_ok());
        assert!(session.ping().is_ok());
    }

    /// Verifies that a fatal marker kills the session for everyone.
    #[test]
    fn test_mock_fatal_marker() {
        let factory = MockRendererFactory::new().fatal_on("crash");
        let session = factory.establish().unwrap();

        assert!(matches!(
            render(&session, "<p>crash</p>"),
            Err(RenderPoolError::SessionLost(_))
        ));
        assert!(matches!(
            render(&session, "<p>fine</p>"),
            Err(RenderPoolError::SessionLost(_))
        ));
        assert!(session.ping().is_err());
    }

    /// Verifies the concurrency gauge tracks open pages.
    #[test]
    fn test_mock_concurrency_gauge() {
        let factory = MockRendererFactory::new();
        let stats = factory.stats();
        let session = factory.establish().unwrap();

        let first = session.new_page().unwrap();
        let second = session.new_page().unwrap();
        assert_eq!(stats.current_renders(), 2);

        drop(first);
        drop(second);
        assert_eq!(stats.current_renders(), 0);
        assert_eq!(stats.max_concurrent_renders(), 2);
    }

    /// Verifies that a closed session refuses new pages.
    #[test]
    fn test_mock_session_close() {
        let factory = MockRendererFactory::new().serial();
        let session = factory.establish().unwrap();
        assert!(!session.supports_concurrent_pages());

        session.close().unwrap();
        assert_eq!(factory.stats().sessions_closed(), 1);
        assert!(session.new_page().is_err());
    }

    /// Verifies Debug implementation.
    #[test]
    fn test_mock_factory_debug() {
        let factory = MockRendererFactory::always_fails("Test");
        let debug_str = format!("{:?}", factory);

        assert!(debug_str.contains("MockRendererFactory"));
        assert!(debug_str.contains("establish_error"));
    }
}
