//! Configuration for worker pool size and PDF print options.
//!
//! This module provides [`WorkerPoolConfig`] and [`WorkerPoolConfigBuilder`].
//!
//! # Example
//!
//! ```rust
//! use html2pdf_pool::WorkerPoolConfigBuilder;
//!
//! let config = WorkerPoolConfigBuilder::new()
//!     .pool_size(8)
//!     .landscape(true)
//!     .build()
//!     .expect("Invalid configuration");
//!
//! assert_eq!(config.pool_size, 8);
//! assert!(config.landscape);
//! ```
//!
//! # Environment Configuration
//!
//! When the `env-config` feature is enabled, you can load configuration
//! from environment variables and an optional `app.env` file:
//!
//! ```rust,ignore
//! use html2pdf_pool::config::env::from_env;
//!
//! let config = from_env()?;
//! ```
//!
//! See [`mod@env`] module for available environment variables.

/// Configuration for the worker pool.
///
/// # Fields Overview
///
/// | Field | Default | Description |
/// |-------|---------|-------------|
/// | `pool_size` | 5 | Worker threads and queue capacity |
/// | `print_background` | true | Print CSS backgrounds |
/// | `landscape` | false | Landscape page orientation |
///
/// # Example
///
/// ```rust
/// use html2pdf_pool::WorkerPoolConfig;
///
/// let config = WorkerPoolConfig::default();
/// assert_eq!(config.pool_size, 5);
/// ```
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// Number of worker threads, which is also the capacity of the task queue.
    ///
    /// This is a hard limit: no more than `pool_size` renders ever execute
    /// at once. Submitters block once `pool_size` tasks are waiting.
    ///
    /// # Considerations
    ///
    /// - Each concurrent render is one Chrome tab in the shared browser
    /// - If the renderer cannot overlap pages, effective concurrency is 1
    ///   regardless of this value
    pub pool_size: usize,

    /// Whether CSS backgrounds are printed.
    pub print_background: bool,

    /// Whether pages are laid out in landscape orientation.
    pub landscape: bool,
}

impl Default for WorkerPoolConfig {
    /// Default configuration: 5 workers, backgrounds printed, portrait.
    fn default() -> Self {
        Self {
            pool_size: 5,
            print_background: true,
            landscape: false,
        }
    }
}

/// Builder for [`WorkerPoolConfig`] with validation.
///
/// # Validation
///
/// The [`build()`](Self::build) method rejects a `pool_size` of 0.
pub struct WorkerPoolConfigBuilder {
    config: WorkerPoolConfig,
}

impl WorkerPoolConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            config: WorkerPoolConfig::default(),
        }
    }

    /// Set the number of workers (must be > 0).
    ///
    /// # Example
    ///
    /// ```rust
    /// use html2pdf_pool::WorkerPoolConfigBuilder;
    ///
    /// let config = WorkerPoolConfigBuilder::new()
    ///     .pool_size(10)
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(config.pool_size, 10);
    /// ```
    pub fn pool_size(mut self, size: usize) -> Self {
        self.config.pool_size = size;
        self
    }

    /// Set whether CSS backgrounds are printed.
    pub fn print_background(mut self, enabled: bool) -> Self {
        self.config.print_background = enabled;
        self
    }

    /// Set landscape orientation.
    pub fn landscape(mut self, enabled: bool) -> Self {
        self.config.landscape = enabled;
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns error if `pool_size` is 0.
    ///
    /// # Example
    ///
    /// ```rust
    /// use html2pdf_pool::WorkerPoolConfigBuilder;
    ///
    /// assert!(WorkerPoolConfigBuilder::new().pool_size(3).build().is_ok());
    /// assert!(WorkerPoolConfigBuilder::new().pool_size(0).build().is_err());
    /// ```
    pub fn build(self) -> std::result::Result<WorkerPoolConfig, String> {
        if self.config.pool_size == 0 {
            return Err("pool_size must be greater than 0".to_string());
        }

        Ok(self.config)
    }
}

impl Default for WorkerPoolConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Environment Configuration (feature-gated)
// ============================================================================

/// Environment-based configuration loading.
///
/// This module is only available when the `env-config` feature is enabled.
///
/// # Environment Variables
///
/// | Variable | Type | Default | Description |
/// |----------|------|---------|-------------|
/// | `RENDER_POOL_SIZE` | usize | 5 | Worker count and queue capacity |
/// | `RENDER_PRINT_BACKGROUND` | bool | true | Print CSS backgrounds |
/// | `RENDER_LANDSCAPE` | bool | false | Landscape orientation |
/// | `CHROME_PATH` | String | auto | Custom Chrome binary path |
///
/// # Example `app.env` File
///
/// ```text
/// RENDER_POOL_SIZE=5
/// RENDER_PRINT_BACKGROUND=true
/// RENDER_LANDSCAPE=false
///
/// # CHROME_PATH=/usr/bin/google-chrome
/// ```
#[cfg(feature = "env-config")]
pub mod env {
    use super::*;
    use crate::error::RenderPoolError;

    /// Default environment file name.
    pub const ENV_FILE_NAME: &str = "app.env";

    /// Load environment variables from the `app.env` file.
    ///
    /// Called automatically by [`from_env`].
    pub fn load_env_file() -> Result<std::path::PathBuf, dotenvy::Error> {
        dotenvy::from_filename(ENV_FILE_NAME)
    }

    /// Load configuration from environment variables.
    ///
    /// Loads `app.env` first if present. Unset or unparsable variables fall
    /// back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RenderPoolError::Configuration`] if the resulting
    /// configuration is invalid (e.g. `RENDER_POOL_SIZE=0`).
    pub fn from_env() -> Result<WorkerPoolConfig, RenderPoolError> {
        match load_env_file() {
            Ok(path) => {
                log::info!("Loaded configuration from: {:?}", path);
            }
            Err(e) => {
                log::debug!(
                    "No {} file found or failed to load: {} (using environment variables and defaults)",
                    ENV_FILE_NAME,
                    e
                );
            }
        }

        let defaults = WorkerPoolConfig::default();

        let pool_size = std::env::var("RENDER_POOL_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.pool_size);

        let print_background = std::env::var("RENDER_PRINT_BACKGROUND")
            .ok()
            .and_then(|s| parse_flag(&s))
            .unwrap_or(defaults.print_background);

        let landscape = std::env::var("RENDER_LANDSCAPE")
            .ok()
            .and_then(|s| parse_flag(&s))
            .unwrap_or(defaults.landscape);

        log::info!("Loading pool configuration from environment:");
        log::info!("   - Pool size: {}", pool_size);
        log::info!("   - Print background: {}", print_background);
        log::info!("   - Landscape: {}", landscape);

        WorkerPoolConfigBuilder::new()
            .pool_size(pool_size)
            .print_background(print_background)
            .landscape(landscape)
            .build()
            .map_err(RenderPoolError::Configuration)
    }

    /// Get the Chrome path from `CHROME_PATH`.
    ///
    /// Returns `None` when unset, which means auto-detection.
    pub fn chrome_path_from_env() -> Option<String> {
        std::env::var("CHROME_PATH").ok()
    }

    /// Parse a boolean flag leniently (`true/false`, `1/0`, `yes/no`, `on/off`).
    pub(crate) fn parse_flag(value: &str) -> Option<bool> {
        match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        }
    }

}

// ============================================================================
// Unit Tests
// ============================================================================
