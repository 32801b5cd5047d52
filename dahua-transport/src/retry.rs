//! Retry policy for transient network failures
//!
//! Only failures that never produced a reply (timeout, refused, reset) are
//! retried. A reply of any status, including an error status, is returned
//! as-is.
//!
//! The policy is generic over the error type so it can wrap a whole signed
//! exchange rather than a single send: each attempt must carry a fresh
//! digest nonce count.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use dahua_core::constants::{MAX_RETRIES, RETRY_BASE_DELAY_MS, RETRY_MAX_DELAY_MS};

use crate::error::Error;

/// Errors that may succeed when the same operation is tried again
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for Error {
    fn is_transient(&self) -> bool {
        self.kind().is_transient()
    }
}

/// Bounded retries with exponential backoff and jitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
            max_delay: Duration::from_millis(RETRY_MAX_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Never retry
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Delay before retry number `retry` (1-based)
    ///
    /// `base * 2^(retry-1)`, capped at `max_delay`, then jittered into the
    /// upper half of that window.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        let window = self.base_delay.saturating_mul(factor).min(self.max_delay);
        let half = window / 2;
        let jitter_ms = rand::thread_rng().gen_range(0..=half.as_millis() as u64);
        half + Duration::from_millis(jitter_ms)
    }

    /// Run `attempt` until it succeeds, fails permanently, or retries run out
    ///
    /// The closure receives the attempt number, starting at 0.
    pub async fn run<F, Fut, T, E>(&self, mut attempt: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + fmt::Display,
    {
        let mut n = 0;
        loop {
            match attempt(n).await {
                Err(e) if e.is_transient() && n < self.max_retries => {
                    n += 1;
                    let delay = self.backoff(n);
                    warn!("Transient failure ({}), retry {}/{} in {:?}", e, n, self.max_retries, delay);
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy::default()
            .with_base_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(300));

        for _ in 0..50 {
            let first = policy.backoff(1);
            assert!(first >= Duration::from_millis(50) && first <= Duration::from_millis(100));

            let second = policy.backoff(2);
            assert!(second >= Duration::from_millis(100) && second <= Duration::from_millis(200));

            let capped = policy.backoff(10);
            assert!(capped >= Duration::from_millis(150) && capped <= Duration::from_millis(300));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_failures() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = RetryPolicy::default()
            .run(move |_| async move {
                match calls.fetch_add(1, Ordering::SeqCst) {
                    0 => Err(Error::ConnectionRefused("refused".into())),
                    1 => Err(Error::Timeout(Duration::from_secs(5))),
                    _ => Ok("reply"),
                }
            })
            .await;

        assert_eq!(result.unwrap(), "reply");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = RetryPolicy::default()
            .with_max_retries(2)
            .run(move |_| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::ConnectionReset("reset".into()))
            })
            .await;

        assert!(matches!(result, Err(Error::ConnectionReset(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_is_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = RetryPolicy::default()
            .run(move |_| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::Dns("no such host".into()))
            })
            .await;

        assert!(matches!(result, Err(Error::Dns(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[derive(Debug)]
    enum Wrapped {
        Network(Error),
        Rejected,
    }

    impl Transient for Wrapped {
        fn is_transient(&self) -> bool {
            matches!(self, Self::Network(e) if e.is_transient())
        }
    }

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::Network(e) => write!(f, "{e}"),
                Self::Rejected => f.write_str("rejected"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wraps_caller_error_type() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: std::result::Result<(), Wrapped> = RetryPolicy::default()
            .run(move |_| async move {
                match calls.fetch_add(1, Ordering::SeqCst) {
                    0 => Err(Wrapped::Network(Error::ConnectionReset("reset".into()))),
                    _ => Err(Wrapped::Rejected),
                }
            })
            .await;

        assert!(matches!(result, Err(Wrapped::Rejected)));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_none_policy() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = RetryPolicy::none()
            .run(move |_| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::Timeout(Duration::from_millis(1)))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
