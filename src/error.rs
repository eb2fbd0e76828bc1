//! Error types for the render pool.
//!
//! This module provides [`RenderPoolError`], a unified error type for the
//! renderer handle, the worker pool and the shutdown coordinator, and a
//! convenient [`Result`] type alias.
//!
//! # Example
//!
//! ```rust
//! use html2pdf_pool::{RenderPoolError, Result};
//!
//! fn render_invoice() -> Result<Vec<u8>> {
//!     // Your logic here...
//!     Err(RenderPoolError::PoolClosed)
//! }
//!
//! match render_invoice() {
//!     Ok(pdf) => println!("Generated {} bytes", pdf.len()),
//!     Err(RenderPoolError::PoolClosed) => println!("Pool is shutting down"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

/// Errors that can occur while rendering through the pool.
///
/// Errors fall into three groups:
///
/// | Group | Variants | Scope |
/// |-------|----------|-------|
/// | Per task | [`InvalidInput`](Self::InvalidInput), [`RenderFailed`](Self::RenderFailed) | Only the task's own caller |
/// | Session | [`NotReady`](Self::NotReady), [`SessionLost`](Self::SessionLost) | Every later task until the pool is rebuilt |
/// | Lifecycle | [`InitFailed`](Self::InitFailed), [`PoolClosed`](Self::PoolClosed), [`AlreadyClosed`](Self::AlreadyClosed), [`ShutdownFailed`](Self::ShutdownFailed), [`Signal`](Self::Signal), [`Configuration`](Self::Configuration) | Construction and shutdown |
///
/// # Example
///
/// ```rust
/// use html2pdf_pool::RenderPoolError;
///
/// fn should_rebuild_pool(error: &RenderPoolError) -> bool {
///     error.is_session_fatal()
/// }
///
/// assert!(should_rebuild_pool(&RenderPoolError::NotReady));
/// assert!(!should_rebuild_pool(&RenderPoolError::InvalidInput));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum RenderPoolError {
    /// The HTML passed to a render was empty or whitespace only.
    ///
    /// Rejected before anything is queued or sent to the renderer.
    #[error("HTML content is required")]
    InvalidInput,

    /// The renderer session is absent.
    ///
    /// Returned when the session was never established, has been shut down,
    /// or was lost to an earlier session-fatal failure. There is no automatic
    /// reconnect: rebuild the pool to recover.
    #[error("Renderer session is not initialized or has been closed")]
    NotReady,

    /// The renderer session could not be established.
    ///
    /// # Common Causes
    ///
    /// - Chrome/Chromium binary not found or not installed
    /// - Invalid Chrome binary path specified
    /// - Insufficient permissions to execute Chrome
    /// - System resource limits exceeded (e.g., too many processes)
    ///
    /// # Example
    ///
    /// ```rust
    /// use html2pdf_pool::RenderPoolError;
    ///
    /// let error = RenderPoolError::InitFailed("Chrome binary not found".to_string());
    /// assert_eq!(error.to_string(), "Failed to start renderer: Chrome binary not found");
    /// ```
    #[error("Failed to start renderer: {0}")]
    InitFailed(String),

    /// A task was submitted after shutdown began.
    #[error("Worker pool is closed")]
    PoolClosed,

    /// Shutdown was requested more than once.
    ///
    /// The second request returns immediately; use
    /// [`WorkerPool::await_termination`](crate::WorkerPool::await_termination)
    /// to wait for the teardown started by the first.
    #[error("Worker pool is already shut down")]
    AlreadyClosed,

    /// The renderer failed for one task.
    ///
    /// Carries the collaborator's message verbatim. The session stays usable.
    #[error("Failed to render PDF: {0}")]
    RenderFailed(String),

    /// The renderer session died (e.g., the browser process crashed or the
    /// DevTools connection dropped).
    ///
    /// Returned to the task that observed it; every later render fails with
    /// [`NotReady`](Self::NotReady).
    #[error("Renderer session lost: {0}")]
    SessionLost(String),

    /// A liveness probe failed without the session being lost.
    #[error("Renderer health check failed: {0}")]
    HealthCheckFailed(String),

    /// The teardown task itself could not be run to completion.
    #[error("Worker pool shutdown failed: {0}")]
    ShutdownFailed(String),

    /// Signal handling for shutdown could not be set up.
    #[error("Failed to install signal handler: {0}")]
    Signal(String),

    /// Invalid configuration provided.
    ///
    /// # Common Causes
    ///
    /// - `pool_size` is set to 0
    /// - No renderer factory was given to the pool builder
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl RenderPoolError {
    /// Whether this error means the shared session is gone.
    ///
    /// Once a session-fatal error is observed, every subsequent task fails
    /// with [`NotReady`](Self::NotReady) until the pool is rebuilt.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, Self::NotReady | Self::SessionLost(_))
    }
}

/// Convenience conversion from [`String`] to [`RenderPoolError::Configuration`].
///
/// # Example
///
/// ```rust
/// use html2pdf_pool::RenderPoolError;
///
/// let error: RenderPoolError = "invalid configuration".to_string().into();
/// assert!(matches!(error, RenderPoolError::Configuration(_)));
/// ```
impl From<String> for RenderPoolError {
    fn from(msg: String) -> Self {
        RenderPoolError::Configuration(msg)
    }
}

/// Convenience conversion from `&str` to [`RenderPoolError::Configuration`].
impl From<&str> for RenderPoolError {
    fn from(msg: &str) -> Self {
        RenderPoolError::Configuration(msg.to_string())
    }
}

/// Result type alias using [`RenderPoolError`].
pub type Result<T> = std::result::Result<T, RenderPoolError>;

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Verifies error type conversions from String and &str.
    #[test]
    fn test_error_conversion() {
        let error: RenderPoolError = "test error".into();
        match error {
            RenderPoolError::Configuration(msg) => {
                assert_eq!(msg, "test error", "Error message should be preserved");
            }
            _ => panic!("Expected Configuration error variant"),
        }

        let error: RenderPoolError = "another error".to_string().into();
        match error {
            RenderPoolError::Configuration(msg) => {
                assert_eq!(msg, "another error", "Error message should be preserved");
            }
            _ => panic!("Expected Configuration error variant"),
        }
    }

    /// Verifies that error Display formatting works correctly.
    #[test]
    fn test_error_display() {
        assert_eq!(
            RenderPoolError::InvalidInput.to_string(),
            "HTML content is required"
        );
        assert_eq!(
            RenderPoolError::NotReady.to_string(),
            "Renderer session is not initialized or has been closed"
        );
        assert_eq!(
            RenderPoolError::InitFailed("chrome not found".to_string()).to_string(),
            "Failed to start renderer: chrome not found"
        );
        assert_eq!(RenderPoolError::PoolClosed.to_string(), "Worker pool is closed");
        assert_eq!(
            RenderPoolError::AlreadyClosed.to_string(),
            "Worker pool is already shut down"
        );
        assert_eq!(
            RenderPoolError::RenderFailed("print failed".to_string()).to_string(),
            "Failed to render PDF: print failed"
        );
        assert_eq!(
            RenderPoolError::SessionLost("connection closed".to_string()).to_string(),
            "Renderer session lost: connection closed"
        );
        assert_eq!(
            RenderPoolError::ShutdownFailed("join error".to_string()).to_string(),
            "Worker pool shutdown failed: join error"
        );
        assert_eq!(
            RenderPoolError::Configuration("bad config".to_string()).to_string(),
            "Configuration error: bad config"
        );
    }

    /// Verifies which errors are classified as session-fatal.
    #[test]
    fn test_session_fatal_classification() {
        assert!(RenderPoolError::NotReady.is_session_fatal());
        assert!(RenderPoolError::SessionLost("gone".to_string()).is_session_fatal());

        assert!(!RenderPoolError::InvalidInput.is_session_fatal());
        assert!(!RenderPoolError::RenderFailed("bad page".to_string()).is_session_fatal());
        assert!(!RenderPoolError::PoolClosed.is_session_fatal());
        assert!(!RenderPoolError::HealthCheckFailed("slow".to_string()).is_session_fatal());
    }

    /// Verifies that RenderPoolError implements std::error::Error.
    #[test]
    fn test_error_is_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<RenderPoolError>();
    }

    /// Verifies that RenderPoolError is Send + Sync for thread safety.
    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RenderPoolError>();
    }
}
