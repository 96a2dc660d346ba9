//! Opt-in retries with exponential backoff
//!
//! Nothing in the request path retries on its own. Callers that want retries
//! wrap an operation in [`retry_with_backoff`], which re-invokes it while
//! [`Error::is_retryable`] holds and attempts remain.

use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};

use crate::error::{Error, Result};

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Randomize delays to avoid synchronized retries
    pub jitter: bool,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            jitter: true,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Create an exponential backoff instance
    pub fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.base_delay)
            .with_max_interval(self.max_delay)
            .with_multiplier(self.multiplier)
            .with_randomization_factor(if self.jitter { 0.5 } else { 0.0 })
            // attempts are bounded by max_retries instead
            .with_max_elapsed_time(None)
            .build()
    }
}

/// Decision on whether to retry a failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { delay: Duration },
    NoRetry,
}

/// Tracks attempts and delays for one logical operation
#[derive(Debug)]
pub struct RetryHandler {
    policy: RetryPolicy,
    retries: u32,
    backoff: ExponentialBackoff,
}

impl RetryHandler {
    pub fn new(policy: RetryPolicy) -> Self {
        let backoff = policy.create_backoff();
        Self {
            policy,
            retries: 0,
            backoff,
        }
    }

    pub fn should_retry(&mut self, error: &Error) -> RetryDecision {
        if self.retries >= self.policy.max_retries || !error.is_retryable() {
            return RetryDecision::NoRetry;
        }
        self.retries += 1;
        let delay = self.backoff.next_backoff().unwrap_or(self.policy.max_delay);
        RetryDecision::Retry { delay }
    }

    pub fn reset(&mut self) {
        self.retries = 0;
        self.backoff.reset();
    }

    /// Retries granted so far
    pub fn retries(&self) -> u32 {
        self.retries
    }
}

impl Default for RetryHandler {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

/// Run `operation`, retrying retryable failures according to `policy`
pub async fn retry_with_backoff<F, Fut, T>(policy: RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut handler = RetryHandler::new(policy);

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => match handler.should_retry(&error) {
                RetryDecision::Retry { delay } => {
                    tracing::warn!(
                        retry = handler.retries(),
                        delay_ms = delay.as_millis() as u64,
                        kind = %error.kind(),
                        "Request failed, retrying: {}",
                        error.message()
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::NoRetry => {
                    tracing::debug!(
                        retries = handler.retries(),
                        kind = %error.kind(),
                        "Request failed, not retrying"
                    );
                    return Err(error);
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries)
            .with_base_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(2))
            .with_jitter(false)
    }

    #[test]
    fn test_default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(500));
        assert!(policy.jitter);
    }

    #[test]
    fn test_handler_respects_max_retries() {
        let mut handler = RetryHandler::new(fast_policy(2));
        let error = Error::new(ErrorKind::ServerError, "boom");

        assert!(matches!(handler.should_retry(&error), RetryDecision::Retry { .. }));
        assert!(matches!(handler.should_retry(&error), RetryDecision::Retry { .. }));
        assert_eq!(handler.should_retry(&error), RetryDecision::NoRetry);
        assert_eq!(handler.retries(), 2);

        handler.reset();
        assert_eq!(handler.retries(), 0);
    }

    #[test]
    fn test_non_retryable_kinds_stop_immediately() {
        let mut handler = RetryHandler::default();
        for kind in [ErrorKind::Unauthorized, ErrorKind::NotFound, ErrorKind::ValidationError] {
            assert_eq!(handler.should_retry(&Error::new(kind, "no")), RetryDecision::NoRetry);
        }
        assert_eq!(handler.retries(), 0);
    }

    #[test]
    fn test_exponential_delays_without_jitter() {
        let policy = RetryPolicy::new(3)
            .with_base_delay(Duration::from_millis(100))
            .with_jitter(false);
        let mut handler = RetryHandler::new(policy);
        let error = Error::new(ErrorKind::RateLimited, "slow down");

        let delays: Vec<Duration> = (0..3)
            .filter_map(|_| match handler.should_retry(&error) {
                RetryDecision::Retry { delay } => Some(delay),
                RetryDecision::NoRetry => None,
            })
            .collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400)
            ]
        );
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(fast_policy(3), || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(Error::new(ErrorKind::NetworkError, "flaky"))
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_on_non_retryable() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_with_backoff(fast_policy(5), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::new(ErrorKind::Forbidden, "nope"))
        })
        .await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::Forbidden);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
