//! Retry logic with exponential backoff
//!
//! `max_retries` is the total number of attempts, the first one included.
//! Attempt `n` (0-indexed) that fails transiently sleeps `initial_delay * 2^n`.

use std::time::Duration;
use tokio::time::sleep;
use toolgate_foundation::GatewayConnection;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts (>= 1)
    pub max_retries: u32,

    /// Delay after the first failed attempt
    pub initial_delay: Duration,

    /// Multiplier for exponential backoff
    pub backoff_multiplier: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
            backoff_multiplier: 2,
        }
    }
}

impl RetryConfig {
    pub fn from_connection(connection: &GatewayConnection) -> Self {
        Self {
            max_retries: connection.max_retries().max(1),
            initial_delay: connection.base_retry_delay(),
            ..Default::default()
        }
    }

    /// Calculate delay for a given attempt (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.saturating_pow(attempt);
        self.initial_delay.saturating_mul(factor)
    }
}

/// Error classification for retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClassification {
    /// Should retry (transient error)
    Retry,

    /// Should not retry (permanent error)
    NoRetry,
}

/// Trait for errors that can be classified for retry
pub trait RetryableError: Sized {
    fn classify(&self) -> RetryClassification;

    /// Wrap the last error once every attempt failed.
    fn exhausted(self, attempts: u32) -> Self;
}

/// Execute an async operation with retry logic
pub async fn with_retry<T, E, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    E: RetryableError + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let max_attempts = config.max_retries.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => match e.classify() {
                RetryClassification::NoRetry => {
                    debug!(
                        "{}: non-retryable error on attempt {}: {}",
                        operation_name,
                        attempt + 1,
                        e
                    );
                    return Err(e);
                }
                RetryClassification::Retry => {
                    if attempt + 1 >= max_attempts {
                        warn!(
                            "{}: giving up after {} attempt(s): {}",
                            operation_name, max_attempts, e
                        );
                        return Err(e.exhausted(max_attempts));
                    }

                    let delay = config.delay_for_attempt(attempt);
                    warn!(
                        "{}: attempt {} failed, retrying in {:?}: {}",
                        operation_name,
                        attempt + 1,
                        delay,
                        e
                    );

                    sleep(delay).await;
                    attempt += 1;
                }
            },
        }
    }
}
