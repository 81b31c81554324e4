use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Distinguishes failures worth another attempt from final ones.
#[derive(Debug)]
pub enum RetryError<E> {
    /// Network issues and server errors
    Retryable(E),
    /// Client errors and rate limits; returned immediately
    NonRetryable(E),
}

#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Attempts after the first one.
    max_retries: u32,
    /// Base delay for exponential backoff.
    base_delay_ms: u64,
    /// Jitter as a fraction of the delay, e.g. 0.25 = ±25%.
    jitter_factor: f64,
}

impl RetryConfig {
    pub fn new(max_retries: u32, base_delay_ms: u64) -> Self {
        RetryConfig {
            max_retries,
            base_delay_ms,
            ..Default::default()
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_retries: 5,
            base_delay_ms: 1000,
            jitter_factor: 0.25,
        }
    }
}

/// Runs `func` until it succeeds, fails with a non-retryable error, or the retries
/// are used up. The last error is returned in the latter case.
pub async fn with_retry<F, Fut, T, E>(func: F, config: &RetryConfig) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, RetryError<E>>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    loop {
        match func().await {
            Ok(result) => return Ok(result),
            Err(RetryError::NonRetryable(err)) => return Err(err),
            Err(RetryError::Retryable(err)) if attempt >= config.max_retries => {
                log::error!("Request failed after {} retries: {}", config.max_retries, err);
                return Err(err);
            }
            Err(RetryError::Retryable(err)) => {
                let delay = backoff_with_jitter(attempt, config);
                log::warn!(
                    "{}; retry attempt {}/{} after {:?}",
                    err,
                    attempt + 1,
                    config.max_retries,
                    delay
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Exponential backoff `base_delay * 2^attempt` with ±`jitter_factor` random jitter.
fn backoff_with_jitter(attempt: u32, config: &RetryConfig) -> Duration {
    let base_delay = config.base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    let jitter_range = (base_delay as f64 * config.jitter_factor) as u64;
    let jitter = rand::rng().random_range(0..=jitter_range * 2) as i64 - jitter_range as i64;
    let delay_ms = (base_delay as i64 + jitter).max(0) as u64;
    Duration::from_millis(delay_ms)
}
