//! Retry with Polling
//!
//! Poll-until-true evaluation shared by element waits and expectations.
//! A check either passes, fails with a message (and is retried), or
//! errors (and aborts the wait immediately).

use crate::result::ShopResult;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::future::Future;
use std::time::{Duration, Instant};

/// Default wait window for element resolution and expectations (5 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Result of a single check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssertionCheckResult {
    /// Predicate holds
    Pass,
    /// Predicate does not hold yet; message describes the observed state
    Fail(String),
}

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total timeout duration
    pub timeout: Duration,
    /// Interval between attempts
    pub poll_interval: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with timeout
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// Set the poll interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Short timeout with fast polling
    #[must_use]
    pub const fn fast() -> Self {
        Self {
            timeout: Duration::from_millis(500),
            poll_interval: Duration::from_millis(10),
        }
    }

    /// Timeout in whole milliseconds
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

/// A polling wait that retries a check until success or timeout
///
/// ```ignore
/// let outcome = RetryAssertion::new(RetryConfig::default())
///     .with_description("#Email visible")
///     .verify(|| probe(session))
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct RetryAssertion {
    config: RetryConfig,
    description: Option<String>,
}

impl RetryAssertion {
    /// Create a new retry assertion
    #[must_use]
    pub const fn new(config: RetryConfig) -> Self {
        Self {
            config,
            description: None,
        }
    }

    /// Set a description for the assertion
    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Run `check` until it passes, the timeout elapses, or it errors.
    ///
    /// The outer result carries backend errors raised by the check; the
    /// inner one distinguishes success from timeout.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `check`.
    pub async fn verify<F, Fut>(&self, mut check: F) -> ShopResult<Result<RetryResult, RetryError>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ShopResult<AssertionCheckResult>>,
    {
        let start = Instant::now();
        let mut attempts = 0;

        loop {
            attempts += 1;

            let message = match check().await? {
                AssertionCheckResult::Pass => {
                    return Ok(Ok(RetryResult {
                        attempts,
                        duration: start.elapsed(),
                    }));
                }
                AssertionCheckResult::Fail(msg) => msg,
            };

            let elapsed = start.elapsed();
            if elapsed >= self.config.timeout {
                tracing::debug!(
                    attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    description = self.description.as_deref().unwrap_or(""),
                    "retry exhausted"
                );
                return Ok(Err(RetryError {
                    message,
                    attempts,
                    duration: elapsed,
                    description: self.description.clone(),
                }));
            }

            let remaining = self.config.timeout.saturating_sub(elapsed);
            tokio::time::sleep(self.config.poll_interval.min(remaining)).await;
        }
    }
}

/// Result of a successful retry
#[derive(Debug, Clone, Copy)]
pub struct RetryResult {
    /// Number of attempts before success
    pub attempts: usize,
    /// Total duration of all attempts
    pub duration: Duration,
}

/// Error when a retry times out
#[derive(Debug, Clone)]
pub struct RetryError {
    /// Last failure message
    pub message: String,
    /// Number of attempts made
    pub attempts: usize,
    /// Total duration of all attempts
    pub duration: Duration,
    /// Description of the assertion
    pub description: Option<String>,
}

impl std::fmt::Display for RetryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref desc) = self.description {
            write!(f, "{desc}: ")?;
        }
        write!(
            f,
            "assertion failed after {} attempt(s) ({:.2}s): {}",
            self.attempts,
            self.duration.as_secs_f64(),
            self.message
        )
    }
}

impl std::error::Error for RetryError {}
