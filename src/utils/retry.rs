//! Retry utilities with exponential backoff for resilient API calls.

use std::time::Duration;
use tokio::time::sleep;

use crate::sources::SourceError;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

/// Whether an error is transient and worth retrying.
///
/// Rate limits and network failures are transient; API and parse errors
/// are not, since repeating the same request will not change the answer.
fn is_transient(error: &SourceError) -> bool {
    matches!(error, SourceError::Network(_) | SourceError::RateLimit)
}

/// Delay before the given attempt, with exponential backoff. Rate limits
/// get a longer floor regardless of the attempt number.
fn backoff_delay(config: &RetryConfig, error: &SourceError, attempt: u32) -> Duration {
    let exp = config.initial_delay.as_secs_f64()
        * config.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
    let delay = Duration::from_secs_f64(exp.min(config.max_delay.as_secs_f64()));

    match error {
        SourceError::RateLimit => delay.max(Duration::from_secs(2)),
        _ => delay,
    }
}

/// Execute an async operation, retrying transient failures with
/// exponential backoff.
///
/// Returns the first success, the first permanent error, or the last
/// transient error once `max_attempts` is exhausted.
pub async fn with_retry<T, F, Fut>(config: RetryConfig, mut operation: F) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, SourceError>>,
{
    let mut attempts = 0;

    loop {
        attempts += 1;

        match operation().await {
            Ok(result) => {
                if attempts > 1 {
                    tracing::debug!("operation succeeded on attempt {}", attempts);
                }
                return Ok(result);
            }
            Err(error) => {
                if !is_transient(&error) || attempts >= config.max_attempts {
                    return Err(error);
                }

                let delay = backoff_delay(&config, &error, attempts);
                tracing::debug!(
                    "transient error on attempt {}: {}, retrying in {:?}",
                    attempts,
                    error,
                    delay
                );
                sleep(delay).await;
            }
        }
    }
}
