//! Chrome/Chromium renderer implementation.
//!
//! This module provides [`ChromeRendererFactory`], which launches one headless
//! Chrome process per session and renders each task in its own tab.
//!
//! # Overview
//!
//! ```text
//! ChromeRendererFactory::establish()
//!   ├─ Launch Chrome (LaunchOptions)
//!   ├─ Validate (new_tab, navigate, close)
//!   └─ ChromeSession
//!        └─ new_page() ──→ ChromePage (one tab)
//!             ├─ set_content: navigate to data:text/html URL
//!             ├─ print_to_pdf: Page.printToPDF
//!             └─ close: close tab
//! ```
//!
//! # Concurrency
//!
//! Tabs of one browser render independently, so `ChromeSession` reports
//! `supports_concurrent_pages() == true`. Only tab creation is serialized,
//! by the lock that guards the browser's lifetime.
//!
//! # Example
//!
//! ```rust,ignore
//! use html2pdf_pool::ChromeRendererFactory;
//!
//! // Auto-detect Chrome installation
//! let factory = ChromeRendererFactory::with_defaults();
//!
//! // Or specify custom path and print options
//! let factory = ChromeRendererFactory::with_path("/usr/bin/google-chrome".to_string())
//!     .landscape(true);
//! ```

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions, Tab};

use super::{RenderPage, RenderSession, RendererFactory};
use crate::config::WorkerPoolConfig;
use crate::error::{RenderPoolError, Result};
use crate::traits::Healthcheck;

/// Factory for Chrome-backed renderer sessions.
///
/// # Thread Safety
///
/// This factory is `Send + Sync` and can be safely shared across threads.
pub struct ChromeRendererFactory {
    /// Function that generates launch options for each session.
    launch_options_fn: Box<dyn Fn() -> Result<LaunchOptions<'static>> + Send + Sync>,

    /// Print CSS backgrounds.
    print_background: bool,

    /// Landscape orientation.
    landscape: bool,
}

impl ChromeRendererFactory {
    /// Create factory with a custom launch options function.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use html2pdf_pool::{ChromeRendererFactory, create_chrome_options, RenderPoolError};
    ///
    /// let factory = ChromeRendererFactory::new(|| {
    ///     create_chrome_options(Some("/custom/path"))
    ///         .map_err(|e| RenderPoolError::Configuration(e.to_string()))
    /// });
    /// ```
    pub fn new<F>(launch_options_fn: F) -> Self
    where
        F: Fn() -> Result<LaunchOptions<'static>> + Send + Sync + 'static,
    {
        let defaults = WorkerPoolConfig::default();
        Self {
            launch_options_fn: Box::new(launch_options_fn),
            print_background: defaults.print_background,
            landscape: defaults.landscape,
        }
    }

    /// Create factory with auto-detected Chrome path.
    ///
    /// The `headless_chrome` crate searches the common installation paths on
    /// Linux, macOS and Windows (and downloads a Chromium build with the
    /// `fetch` feature if none is found).
    pub fn with_defaults() -> Self {
        log::debug!("Creating ChromeRendererFactory with auto-detect");
        Self::new(|| {
            create_chrome_options(None).map_err(|e| RenderPoolError::Configuration(e.to_string()))
        })
    }

    /// Create factory with custom Chrome binary path.
    pub fn with_path(chrome_path: String) -> Self {
        log::debug!(
            "Creating ChromeRendererFactory with custom path: {}",
            chrome_path
        );
        Self::new(move || {
            create_chrome_options(Some(&chrome_path))
                .map_err(|e| RenderPoolError::Configuration(e.to_string()))
        })
    }

    /// Create factory from pool configuration and an optional binary path.
    pub fn from_config(config: &WorkerPoolConfig, chrome_path: Option<String>) -> Self {
        let factory = match chrome_path {
            Some(path) => Self::with_path(path),
            None => Self::with_defaults(),
        };
        factory
            .print_background(config.print_background)
            .landscape(config.landscape)
    }

    /// Set whether CSS backgrounds are printed (default: true).
    pub fn print_background(mut self, enabled: bool) -> Self {
        self.print_background = enabled;
        self
    }

    /// Set landscape orientation (default: false).
    pub fn landscape(mut self, enabled: bool) -> Self {
        self.landscape = enabled;
        self
    }
}

impl RendererFactory for ChromeRendererFactory {
    /// Launch Chrome and validate it before handing it to the pool.
    ///
    /// # Errors
    ///
    /// * Returns [`RenderPoolError::Configuration`] if launch options generation fails.
    /// * Returns [`RenderPoolError::InitFailed`] if Chrome fails to launch or
    ///   fails the validation navigation.
    fn establish(&self) -> Result<Arc<dyn RenderSession>> {
        log::info!("Starting Chromium in the background for PDF generation");

        let options = (self.launch_options_fn)()?;

        let browser = Browser::new(options).map_err(|e| {
            log::error!("❌ Chrome launch failed: {}", e);
            RenderPoolError::InitFailed(e.to_string())
        })?;

        // A dead browser must never reach the pool
        let tab = browser.new_tab().map_err(|e| {
            log::error!("❌ Browser validation failed at new_tab(): {}", e);
            RenderPoolError::InitFailed(e.to_string())
        })?;
        tab.navigate_to("data:text/html,<html></html>").map_err(|e| {
            log::error!("❌ Browser validation failed at navigate_to(): {}", e);
            let _ = tab.close(true);
            RenderPoolError::InitFailed(e.to_string())
        })?;
        let _ = tab.close(true);

        log::info!("✅ Chromium session established");

        Ok(Arc::new(ChromeSession {
            browser: Mutex::new(Some(browser)),
            print_background: self.print_background,
            landscape: self.landscape,
        }))
    }
}

/// A running Chrome process.
///
/// `None` once closed; dropping the [`Browser`] terminates the process.
struct ChromeSession {
    browser: Mutex<Option<Browser>>,
    print_background: bool,
    landscape: bool,
}

impl ChromeSession {
    fn browser(&self) -> MutexGuard<'_, Option<Browser>> {
        self.browser
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Healthcheck for ChromeSession {
    fn ping(&self) -> Result<()> {
        let guard = self.browser();
        let browser = guard
            .as_ref()
            .ok_or_else(|| RenderPoolError::SessionLost("browser has been closed".to_string()))?;

        let started = Instant::now();
        let version = browser.get_version().map(|_| ()).map_err(|e| e.to_string());
        ping_outcome(version, started.elapsed())
    }
}

impl RenderSession for ChromeSession {
    fn new_page(&self) -> Result<Box<dyn RenderPage>> {
        let guard = self.browser();
        let browser = guard
            .as_ref()
            .ok_or_else(|| RenderPoolError::SessionLost("browser has been closed".to_string()))?;

        log::trace!("Creating new browser tab");
        let tab = browser.new_tab().map_err(|e| {
            log::error!("❌ Failed to create tab: {}", e);
            let version = browser.get_version().map(|_| ()).map_err(|e| e.to_string());
            classify_tab_failure(e.to_string(), version)
        })?;

        Ok(Box::new(ChromePage {
            tab,
            print_background: self.print_background,
            landscape: self.landscape,
        }))
    }

    fn close(&self) -> Result<()> {
        match self.browser().take() {
            Some(browser) => {
                drop(browser);
                log::info!("Chromium instance closed");
            }
            None => log::debug!("Chromium instance already closed"),
        }
        Ok(())
    }
}

/// One tab rendering one document.
struct ChromePage {
    tab: Arc<Tab>,
    print_background: bool,
    landscape: bool,
}

impl RenderPage for ChromePage {
    fn set_content(&self, html: &str) -> Result<()> {
        let data_url = format!(
            "data:text/html;charset=utf-8,{}",
            urlencoding::encode(html)
        );
        log::trace!("Data URL length: {} bytes", data_url.len());

        self.tab
            .navigate_to(&data_url)
            .map_err(|e| {
                log::error!("❌ Failed to load HTML content: {}", e);
                RenderPoolError::RenderFailed(e.to_string())
            })?
            .wait_until_navigated()
            .map_err(|e| {
                log::error!("❌ Navigation timeout: {}", e);
                RenderPoolError::RenderFailed(e.to_string())
            })?;

        Ok(())
    }

    fn print_to_pdf(&self) -> Result<Vec<u8>> {
        self.tab
            .print_to_pdf(build_print_options(self.landscape, self.print_background))
            .map_err(|e| {
                log::error!("❌ Failed to generate PDF: {}", e);
                RenderPoolError::RenderFailed(e.to_string())
            })
    }

    fn close(&self) -> Result<()> {
        self.tab
            .close(true)
            .map(|_| ())
            .map_err(|e| RenderPoolError::RenderFailed(e.to_string()))
    }
}

/// Version checks slower than this mark the browser as degraded.
const SLOW_PING_THRESHOLD: Duration = Duration::from_secs(5);

/// Decide whether a failed `new_tab` lost the whole browser.
///
/// Only a failing version check means the connection is gone; otherwise the
/// failure belongs to this render alone.
fn classify_tab_failure(
    tab_error: String,
    version: std::result::Result<(), String>,
) -> RenderPoolError {
    match version {
        Ok(()) => {
            log::warn!("⚠️ Browser still responsive, failing this render only");
            RenderPoolError::RenderFailed(format!("failed to create tab: {}", tab_error))
        }
        Err(version_error) => RenderPoolError::SessionLost(format!(
            "failed to create tab: {} (version check: {})",
            tab_error, version_error
        )),
    }
}

fn ping_outcome(version: std::result::Result<(), String>, elapsed: Duration) -> Result<()> {
    match version {
        Err(e) => Err(RenderPoolError::SessionLost(e)),
        Ok(()) if elapsed > SLOW_PING_THRESHOLD => {
            log::warn!("⚠️ Browser answered the health check after {:?}", elapsed);
            Err(RenderPoolError::HealthCheckFailed(format!(
                "browser answered after {:?}",
                elapsed
            )))
        }
        Ok(()) => Ok(()),
    }
}

/// Build PDF print options.
///
/// Zero margins, no header/footer, scale 1.0.
fn build_print_options(landscape: bool, print_background: bool) -> Option<PrintToPdfOptions> {
    Some(PrintToPdfOptions {
        landscape: Some(landscape),
        display_header_footer: Some(false),
        print_background: Some(print_background),
        margin_top: Some(0.0),
        margin_bottom: Some(0.0),
        margin_left: Some(0.0),
        margin_right: Some(0.0),
        ..Default::default()
    })
}

/// Create Chrome launch options with optional custom path.
///
/// Generates launch options for stable headless operation in containers:
/// no sandbox, no GPU, no extensions, no background throttling.
///
/// # Parameters
///
/// * `chrome_path` - Optional custom Chrome binary path. If None, auto-detects.
///
/// # Errors
///
/// Returns error if the options builder fails (rare).
///
/// # Example
///
/// ```rust,ignore
/// use html2pdf_pool::create_chrome_options;
///
/// let options = create_chrome_options(None)?;
/// let options = create_chrome_options(Some("/usr/bin/chromium"))?;
/// ```
pub fn create_chrome_options(
    chrome_path: Option<&str>,
) -> std::result::Result<LaunchOptions<'static>, Box<dyn std::error::Error + Send + Sync>> {
    let mut builder = LaunchOptions::default_builder();

    if let Some(path) = chrome_path {
        builder.path(Some(path.to_string().into()));
        log::trace!("Chrome path set to: {}", path);
    } else {
        log::trace!("Chrome path: auto-detect");
    }

    builder
        .headless(true)
        .sandbox(false) // required in containers
        .disable_default_args(true)
        .args(vec![
            // Memory
            "--disable-dev-shm-usage".as_ref(),
            "--disable-crash-reporter".as_ref(),
            "--max_old_space_size=1024".as_ref(),
            // GPU and rendering
            "--disable-gpu-compositing".as_ref(),
            "--disable-software-rasterizer".as_ref(),
            "--disable-accelerated-2d-canvas".as_ref(),
            "--disable-gl-drawing-for-tests".as_ref(),
            "--disable-webgl".as_ref(),
            "--disable-webgl2".as_ref(),
            // Features a print renderer never needs
            "--disable-extensions".as_ref(),
            "--disable-plugins".as_ref(),
            "--disable-sync".as_ref(),
            "--disable-default-apps".as_ref(),
            "--enable-automation".as_ref(),
            // Background tabs render at full speed
            "--disable-background-timer-throttling".as_ref(),
            "--disable-backgrounding-occluded-windows".as_ref(),
            "--disable-renderer-backgrounding".as_ref(),
            "--disable-hang-monitor".as_ref(),
            "--disable-ipc-flooding-protection".as_ref(),
        ])
        .build()
        .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> {
            let path_msg = chrome_path.unwrap_or("auto-detect");
            log::error!(
                "❌ Failed to build Chrome launch options (path: {}): {}",
                path_msg,
                e
            );
            e.into()
        })
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Verifies that ChromeRendererFactory can be instantiated without
    /// launching Chrome.
    #[test]
    fn test_chrome_factory_creation() {
        let _factory = ChromeRendererFactory::with_defaults();
        let _factory_with_path =
            ChromeRendererFactory::with_path("/custom/chrome/path".to_string());
    }

    /// Verifies that print options follow the configuration.
    #[test]
    fn test_chrome_factory_from_config() {
        let config = WorkerPoolConfig {
            pool_size: 2,
            print_background: false,
            landscape: true,
        };

        let factory = ChromeRendererFactory::from_config(&config, None);
        assert!(!factory.print_background);
        assert!(factory.landscape);

        let factory = ChromeRendererFactory::with_defaults();
        assert!(factory.print_background, "Backgrounds print by default");
        assert!(!factory.landscape);
    }

    /// Verifies that Chrome launch options can be built.
    #[test]
    fn test_create_chrome_options() {
        let result = create_chrome_options(None);
        assert!(
            result.is_ok(),
            "Auto-detect Chrome options should build successfully: {:?}",
            result.err()
        );

        let result = create_chrome_options(Some("/custom/chrome/path"));
        assert!(
            result.is_ok(),
            "Custom path Chrome options should build successfully: {:?}",
            result.err()
        );
    }

    #[test]
    fn test_build_print_options() {
        let options = build_print_options(true, false).unwrap();
        assert_eq!(options.landscape, Some(true));
        assert_eq!(options.print_background, Some(false));
        assert_eq!(options.display_header_footer, Some(false));
        assert_eq!(options.margin_top, Some(0.0));
        assert_eq!(options.margin_left, Some(0.0));
    }

    /// Verifies that a tab failure on a responsive browser stays local.
    #[test]
    fn test_tab_failure_with_live_browser_is_per_render() {
        let error = classify_tab_failure("Timeout".to_string(), Ok(()));

        assert!(matches!(error, RenderPoolError::RenderFailed(_)));
        assert!(!error.is_session_fatal());
        assert!(error.to_string().contains("Timeout"));
    }

    /// Verifies that a tab failure on a dead browser loses the session.
    #[test]
    fn test_tab_failure_with_dead_browser_loses_session() {
        let error = classify_tab_failure(
            "Timeout".to_string(),
            Err("connection closed".to_string()),
        );

        assert!(matches!(error, RenderPoolError::SessionLost(_)));
        assert!(error.is_session_fatal());
        assert!(error.to_string().contains("connection closed"));
    }

    /// Verifies the health check classification of version checks.
    #[test]
    fn test_ping_outcome() {
        assert!(ping_outcome(Ok(()), Duration::from_millis(20)).is_ok());

        assert!(matches!(
            ping_outcome(Ok(()), SLOW_PING_THRESHOLD + Duration::from_secs(1)),
            Err(RenderPoolError::HealthCheckFailed(_))
        ));

        assert!(matches!(
            ping_outcome(Err("gone".to_string()), Duration::from_millis(20)),
            Err(RenderPoolError::SessionLost(_))
        ));
    }
}
