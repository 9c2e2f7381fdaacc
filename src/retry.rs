//! Backoff for provider calls.
//!
//! Providers wrap each HTTP request in [`with_retry_if`] with
//! [`ProviderError::is_retryable`](crate::error::ProviderError::is_retryable)
//! as the predicate, so rate limits and 5xx answers are retried while a bad
//! key or an unsupported language fails on the first attempt.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

/// How often and how patiently a provider call is repeated.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, the first one included. Zero behaves like one.
    pub max_attempts: u32,
    /// Pause before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound for any single pause.
    pub max_delay: Duration,
    /// Growth factor applied to the pause after every failed attempt.
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Three attempts, pausing 1s then 2s. A phrase deadline of 20s leaves
    /// room for the full sequence.
    pub fn provider_call() -> Self {
        Self::new(3, Duration::from_secs(1)).with_max_delay(Duration::from_secs(5))
    }

    /// One attempt. Used when the caller has its own retry story, e.g. tests
    /// and mocked servers.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Pause before `attempt` (0-based): nothing before the first, then
    /// `initial_delay * multiplier^(attempt - 1)`, capped at `max_delay`.
    fn pause_before(&self, attempt: u32) -> Duration {
        let Some(exponent) = attempt.checked_sub(1) else {
            return Duration::ZERO;
        };
        let scaled = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent as i32);
        Duration::from_secs_f64(scaled.max(0.0))
            .min(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::provider_call()
    }
}

/// Run `operation` until it succeeds, `should_retry` rejects its error, or
/// the attempts run out. The last error is returned unchanged.
pub async fn with_retry_if<T, E, F, Fut, P>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let attempts = config.attempts();
    let mut attempt = 0;

    loop {
        let pause = config.pause_before(attempt);
        if !pause.is_zero() {
            debug!("{}: waiting {:?} before attempt {}/{}", operation_name, pause, attempt + 1, attempts);
            sleep(pause).await;
        }

        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        attempt += 1;
        if !should_retry(&error) {
            debug!("{}: giving up, not retryable: {}", operation_name, error);
            return Err(error);
        }
        if attempt >= attempts {
            warn!("{}: failed after {} attempt(s): {}", operation_name, attempts, error);
            return Err(error);
        }
        warn!(
            "{}: attempt {}/{} failed: {}",
            operation_name, attempt, attempts, error
        );
    }
}
