//! Runner and browser configuration.

use crate::assertion::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default whole-case timeout (30 seconds)
pub const DEFAULT_CASE_TIMEOUT_MS: u64 = 30_000;

/// Default navigation timeout (30 seconds)
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;

/// Execution policy for a suite run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Concurrent cases (0 = available CPUs)
    pub workers: usize,
    /// Bound on opening the session plus running the case body; teardown
    /// is bounded separately
    pub case_timeout: Duration,
    /// Wait policy for locators and expectations
    pub wait: RetryConfig,
    /// Bound on a single navigation
    pub navigation_timeout: Duration,
    /// Run cases whose expected behavior is not confirmed against the site
    pub include_unverified: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            case_timeout: Duration::from_millis(DEFAULT_CASE_TIMEOUT_MS),
            wait: RetryConfig::default(),
            navigation_timeout: Duration::from_millis(DEFAULT_NAVIGATION_TIMEOUT_MS),
            include_unverified: false,
        }
    }
}

impl RunnerConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set concurrent cases
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the whole-case timeout
    #[must_use]
    pub const fn with_case_timeout(mut self, timeout: Duration) -> Self {
        self.case_timeout = timeout;
        self
    }

    /// Set the locator/expectation wait policy
    #[must_use]
    pub const fn with_wait(mut self, wait: RetryConfig) -> Self {
        self.wait = wait;
        self
    }

    /// Set the navigation timeout
    #[must_use]
    pub const fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    /// Include unverified cases
    #[must_use]
    pub const fn with_unverified(mut self, include: bool) -> Self {
        self.include_unverified = include;
        self
    }

    /// Worker count with `0` resolved to the available parallelism
    #[must_use]
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
    }
}

/// Chromium launch options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserOptions {
    /// Run without a visible window
    pub headless: bool,
    /// Chromium executable; autodetected when `None`
    pub chromium_path: Option<String>,
    /// Keep the Chromium sandbox enabled
    pub sandbox: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            chromium_path: None,
            sandbox: true,
            viewport_width: 1280,
            viewport_height: 720,
        }
    }
}

impl BrowserOptions {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set the Chromium executable
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable the sandbox (containers, CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Set the viewport size
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }
}
