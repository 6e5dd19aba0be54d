//! Bounded retry for async operations
//!
//! The executor runs an operation up to `max_attempts` times. After each
//! failure a [`RetryPolicy`] classifies the error and a [`BackoffStrategy`]
//! supplies the pause before the next attempt. The error of the final
//! attempt is always handed back to the caller.

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Why a retried operation ultimately failed
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt failed; `source` is the last failure.
    #[error("All retry attempts exhausted after {attempts} tries: {source}")]
    AttemptsExhausted { attempts: u32, source: E },

    /// The policy classified the failure as permanent.
    #[error("Operation failed with non-retryable error: {source}")]
    NonRetryable { source: E },

    /// The total time budget ran out before another attempt could start.
    #[error("Retry timeout exceeded after {elapsed:?}: {source}")]
    TimeoutExceeded { elapsed: Duration, source: E },
}

impl<E> RetryError<E> {
    /// The operation error that ended the retry loop.
    pub fn into_source(self) -> E {
        match self {
            Self::AttemptsExhausted { source, .. }
            | Self::NonRetryable { source }
            | Self::TimeoutExceeded { source, .. } => source,
        }
    }
}

pub type RetryResult<T, E> = Result<T, RetryError<E>>;

/// Classifies operation errors as transient or permanent
pub trait RetryPolicy<E> {
    /// Decide what to do after `error` occurred on the zero-based `attempt`.
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    Stop,
}

/// Pause between attempts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackoffStrategy {
    Fixed(Duration),
    /// `initial_delay + attempt * increment`
    Linear { initial_delay: Duration, increment: Duration },
}

impl BackoffStrategy {
    /// Delay to wait after the zero-based `attempt` failed.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(delay) => *delay,
            Self::Linear { initial_delay, increment } => {
                initial_delay.saturating_add(increment.saturating_mul(attempt))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one. Zero is
    /// treated as one.
    pub max_attempts: u32,
    pub backoff: BackoffStrategy,
    /// Stop retrying once the next pause would cross this budget
    pub max_total_time: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffStrategy::Fixed(Duration::from_millis(100)),
            max_total_time: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryExecutor<P> {
    config: RetryConfig,
    policy: P,
}

impl<P> RetryExecutor<P> {
    pub fn new(config: RetryConfig, policy: P) -> Self {
        Self { config, policy }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` until it succeeds, the policy gives up or the
    /// attempts run out.
    #[instrument(skip(self, operation), fields(max_attempts = self.config.max_attempts))]
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> RetryResult<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Debug,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let started = Instant::now();
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt: u32 = 0;

        loop {
            let attempt_number = attempt + 1;

            let error = match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(retries = attempt, "retry.succeeded_after_retries");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if self.policy.should_retry(&error, attempt) == RetryDecision::Stop {
                debug!(error = ?error, "retry.non_retryable");
                return Err(RetryError::NonRetryable { source: error });
            }

            if attempt_number >= max_attempts {
                warn!(attempts = attempt_number, error = ?error, "retry.exhausted");
                return Err(RetryError::AttemptsExhausted { attempts: attempt_number, source: error });
            }

            let delay = self.config.backoff.calculate_delay(attempt);
            if let Some(budget) = self.config.max_total_time {
                let elapsed = started.elapsed();
                if elapsed.saturating_add(delay) >= budget {
                    warn!(elapsed_ms = elapsed.as_millis() as u64, "retry.timeout_exceeded");
                    return Err(RetryError::TimeoutExceeded { elapsed, source: error });
                }
            }

            debug!(attempt = attempt_number, delay_ms = delay.as_millis() as u64, "retry.scheduled");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    struct RetryLocked;

    impl RetryPolicy<&'static str> for RetryLocked {
        fn should_retry(&self, error: &&'static str, _attempt: u32) -> RetryDecision {
            if *error == "locked" {
                RetryDecision::Retry
            } else {
                RetryDecision::Stop
            }
        }
    }

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            backoff: BackoffStrategy::Fixed(Duration::from_millis(1)),
            max_total_time: None,
        }
    }

    #[test]
    fn test_linear_backoff_grows_by_step() {
        let strategy = BackoffStrategy::Linear {
            initial_delay: Duration::from_millis(250),
            increment: Duration::from_millis(250),
        };

        assert_eq!(strategy.calculate_delay(0), Duration::from_millis(250));
        assert_eq!(strategy.calculate_delay(1), Duration::from_millis(500));
        assert_eq!(strategy.calculate_delay(3), Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let executor = RetryExecutor::new(fast_config(5), RetryLocked);

        let counter = Arc::clone(&calls);
        let result = executor
            .execute(|| {
                let counter = Arc::clone(&counter);
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 {
                        Err("locked")
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.expect("third attempt succeeds"), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let executor = RetryExecutor::new(fast_config(4), RetryLocked);

        let counter = Arc::clone(&calls);
        let result: RetryResult<(), &str> = executor
            .execute(|| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err("locked") }
            })
            .await;

        assert!(matches!(result, Err(RetryError::AttemptsExhausted { attempts: 4, source: "locked" })));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_permanent_error_stops_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let executor = RetryExecutor::new(fast_config(5), RetryLocked);

        let counter = Arc::clone(&calls);
        let result: RetryResult<(), &str> = executor
            .execute(|| {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err("locked")
                    } else {
                        Err("corrupt")
                    }
                }
            })
            .await;

        assert_eq!(result.expect_err("second error is fatal").into_source(), "corrupt");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_time_budget_stops_retrying() {
        let config = RetryConfig {
            max_attempts: 10,
            backoff: BackoffStrategy::Fixed(Duration::from_secs(5)),
            max_total_time: Some(Duration::from_secs(1)),
        };
        let executor = RetryExecutor::new(config, RetryLocked);

        let result: RetryResult<(), &str> = executor.execute(|| async { Err("locked") }).await;

        assert!(matches!(result, Err(RetryError::TimeoutExceeded { source: "locked", .. })));
    }
}
